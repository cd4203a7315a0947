#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_graphql::{Request, Variables};
use async_trait::async_trait;
use serde_json::Value;

use snapshare_server::auth::Viewer;
use snapshare_server::config::Settings;
use snapshare_server::db::Database;
use snapshare_server::graphql::{build_schema, AppSchema};
use snapshare_server::image_host::{ImageHost, ImageHostError};
use snapshare_server::state::AppState;

/// Image host that records uploads instead of sending them anywhere
#[derive(Default)]
pub struct StubImageHost {
    pub fail: bool,
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageHost for StubImageHost {
    async fn upload(&self, data_uri: String) -> Result<String, ImageHostError> {
        if self.fail {
            return Err(ImageHostError::Rejected {
                status: 502,
                body: "upstream down".to_string(),
            });
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(data_uri);
        Ok(format!("https://img.example/{}.png", uploads.len()))
    }
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::defaults().expect("default settings");
    settings.database.path = ":memory:".to_string();
    settings.auth.secret = "integration-test-secret".to_string();
    settings.auth.bcrypt_cost = 4;
    settings
}

pub fn test_state_with(settings: Settings, host: Arc<StubImageHost>) -> AppState {
    let db = Database::in_memory().expect("Failed to create test database");
    db.initialize().expect("Failed to initialize database");
    AppState::with_image_host(db, settings, host)
}

pub fn test_state() -> AppState {
    test_state_with(test_settings(), Arc::new(StubImageHost::default()))
}

pub struct TestGraph {
    pub state: AppState,
    pub schema: AppSchema,
}

impl TestGraph {
    pub fn new() -> Self {
        let state = test_state();
        let schema = build_schema(state.clone());
        Self { state, schema }
    }

    /// Execute a GraphQL operation as `viewer`, returning `(data, errors)` as JSON
    pub async fn run(&self, viewer: Viewer, query: &str, variables: Value) -> (Value, Vec<Value>) {
        let request = Request::new(query)
            .variables(Variables::from_json(variables))
            .data(viewer);
        let response = self.schema.execute(request).await;
        let errors = response
            .errors
            .iter()
            .map(|e| serde_json::to_value(e).expect("error serializes"))
            .collect();
        let data = response.data.into_json().expect("data converts to JSON");
        (data, errors)
    }

    /// Execute and assert there were no errors
    pub async fn ok(&self, viewer: Viewer, query: &str, variables: Value) -> Value {
        let (data, errors) = self.run(viewer, query, variables).await;
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        data
    }

    /// Sign up through the schema and return (user_id, token)
    pub async fn signup(&self, username: &str) -> (i64, String) {
        let data = self
            .ok(
                Viewer::anonymous(),
                SIGNUP,
                serde_json::json!({
                    "name": username.to_uppercase(),
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "secret-password",
                }),
            )
            .await;
        let id = data["signup"]["user"]["id"]
            .as_str()
            .expect("id is a string")
            .parse()
            .expect("id is numeric");
        let token = data["signup"]["token"].as_str().expect("token").to_string();
        (id, token)
    }

    pub async fn create_post(&self, author: i64, image_url: &str) -> i64 {
        let data = self
            .ok(
                Viewer::user(author),
                "mutation($url: String!) { createPost(imageUrl: $url) { id } }",
                serde_json::json!({ "url": image_url }),
            )
            .await;
        data["createPost"]["id"]
            .as_str()
            .expect("id")
            .parse()
            .expect("numeric id")
    }
}

pub const SIGNUP: &str = r#"
    mutation Signup($name: String!, $username: String!, $email: String!, $password: String!) {
        signup(name: $name, username: $username, email: $email, password: $password) {
            token
            user { id username email }
        }
    }
"#;

pub fn error_code(error: &Value) -> Option<&str> {
    error["extensions"]["code"].as_str()
}
