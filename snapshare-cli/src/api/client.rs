use std::path::Path;
use std::time::Duration;

use reqwest::{multipart, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::queries;
use super::{ApiError, ApiResult};
use snapshare_types::*;

/// Fields sent by `updateProfile`
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct GraphqlEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    extensions: Option<GraphqlErrorExtensions>,
}

#[derive(Deserialize)]
struct GraphqlErrorExtensions {
    // Codes this client does not know are treated as generic API errors
    #[serde(default, deserialize_with = "known_code")]
    code: Option<ErrorCode>,
}

fn known_code<'de, D>(deserializer: D) -> Result<Option<ErrorCode>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}

/// API client for the SnapShare GraphQL server
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Helper to add the bearer token to a request if available
    fn add_auth_header(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Helper to turn non-2xx responses into typed errors
    async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        // Clean up HTML error messages (e.g., from proxy error pages)
        let clean_error = if error_text.contains("<html>") || error_text.contains("<!DOCTYPE") {
            format!(
                "Server returned {} error. Please check the server URL.",
                status.as_u16()
            )
        } else {
            match serde_json::from_str::<ErrorResponse>(&error_text) {
                Ok(body) => match body.details {
                    Some(details) => format!("{}: {}", body.error, details),
                    None => body.error,
                },
                Err(_) => error_text,
            }
        };

        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(clean_error),
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(clean_error),
            StatusCode::BAD_REQUEST => ApiError::BadRequest(clean_error),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(clean_error),
            _ => ApiError::Api(clean_error),
        })
    }

    /// Run a GraphQL operation and deserialize `data.<field>`
    async fn graphql<T: DeserializeOwned>(
        &self,
        document: &str,
        variables: Value,
        field: &str,
    ) -> ApiResult<T> {
        let url = format!("{}/graphql", self.base_url);
        log::debug!("GraphQL {} -> {}", field, url);

        let body = json!({ "query": document, "variables": variables });
        let req = self.add_auth_header(self.client.post(&url).json(&body));
        let response = Self::check_status(req.send().await?).await?;
        let envelope: GraphqlEnvelope = response.json().await?;
        Self::extract(envelope, field)
    }

    fn extract<T: DeserializeOwned>(envelope: GraphqlEnvelope, field: &str) -> ApiResult<T> {
        if let Some(error) = envelope.errors.into_iter().next() {
            let code = error.extensions.and_then(|e| e.code);
            log::warn!("GraphQL {} failed ({:?}): {}", field, code, error.message);
            return Err(ApiError::from_graphql(code, error.message));
        }

        let mut data = envelope
            .data
            .ok_or_else(|| ApiError::Api("Response contained no data".to_string()))?;
        let value = data.get_mut(field).map(Value::take).unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    // Health

    /// GET /health with a per-request timeout. Any HTTP answer counts as the
    /// server being up, so the status is returned rather than checked.
    pub async fn health_check(&self, timeout: Duration) -> ApiResult<StatusCode> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).timeout(timeout).send().await?;
        Ok(response.status())
    }

    // Authentication

    /// Create an account; the returned token is kept for later requests
    pub async fn signup(
        &mut self,
        name: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<AuthPayload> {
        let variables = json!({
            "name": name,
            "username": username,
            "email": email,
            "password": password,
        });
        let payload: AuthPayload = self.graphql(queries::SIGNUP, variables, "signup").await?;
        self.token = Some(payload.token.clone());
        Ok(payload)
    }

    /// Log in with a username or email; the returned token is kept
    pub async fn login(&mut self, login_identifier: &str, password: &str) -> ApiResult<AuthPayload> {
        let variables = json!({ "loginIdentifier": login_identifier, "password": password });
        let payload: Option<AuthPayload> = self.graphql(queries::LOGIN, variables, "login").await?;
        let payload = payload.ok_or_else(|| ApiError::BadRequest("Invalid credentials".to_string()))?;
        self.token = Some(payload.token.clone());
        Ok(payload)
    }

    pub async fn me(&self) -> ApiResult<Option<User>> {
        self.graphql(queries::ME, json!({}), "me").await
    }

    // Users

    pub async fn all_users(&self) -> ApiResult<Vec<User>> {
        self.graphql(queries::ALL_USERS, json!({}), "allUsers").await
    }

    /// Profile by username, or the logged-in user's own profile
    pub async fn user_profile(&self, username: Option<&str>) -> ApiResult<Option<User>> {
        self.graphql(
            queries::USER_PROFILE,
            json!({ "username": username }),
            "userProfile",
        )
        .await
    }

    pub async fn update_profile(&self, edit: &ProfileEdit) -> ApiResult<User> {
        let variables = json!({
            "name": edit.name,
            "username": edit.username,
            "email": edit.email,
            "bio": edit.bio,
            "avatarUrl": edit.avatar_url,
        });
        self.graphql(queries::UPDATE_PROFILE, variables, "updateProfile")
            .await
    }

    // Posts

    /// Every post, newest first
    pub async fn all_posts(&self) -> ApiResult<Vec<PostView>> {
        self.graphql(queries::ALL_POSTS, json!({}), "allPosts").await
    }

    pub async fn posts_by_user(&self, user_id: i64) -> ApiResult<Vec<PostView>> {
        self.graphql(
            queries::POSTS_BY_USER,
            json!({ "userId": user_id.to_string() }),
            "postsByUser",
        )
        .await
    }

    pub async fn create_post(&self, image_url: &str, caption: Option<&str>) -> ApiResult<PostView> {
        self.graphql(
            queries::CREATE_POST,
            json!({ "imageUrl": image_url, "caption": caption }),
            "createPost",
        )
        .await
    }

    /// Toggle the like and return the post as the server now sees it
    pub async fn toggle_like(&self, post_id: i64) -> ApiResult<PostView> {
        self.graphql(
            queries::TOGGLE_LIKE,
            json!({ "postId": post_id.to_string() }),
            "toggleLike",
        )
        .await
    }

    /// Ownership and missing-post failures come back in the payload. A
    /// rejected token is raised as [`ApiError::Unauthorized`] like every
    /// other operation.
    pub async fn delete_post(&self, post_id: i64) -> ApiResult<DeletePostResponse> {
        let response: DeletePostResponse = self
            .graphql(
                queries::DELETE_POST,
                json!({ "id": post_id.to_string() }),
                "deletePost",
            )
            .await?;
        if response.code == Some(ErrorCode::Unauthenticated) {
            return Err(ApiError::Unauthorized(response.message));
        }
        Ok(response)
    }

    // Comments

    /// Comments on a post, oldest first
    pub async fn comments_by_post(&self, post_id: i64) -> ApiResult<Vec<CommentView>> {
        self.graphql(
            queries::COMMENTS_BY_POST,
            json!({ "postId": post_id.to_string() }),
            "CommentsByPost",
        )
        .await
    }

    pub async fn add_comment(&self, post_id: i64, text: &str) -> ApiResult<CommentView> {
        self.graphql(
            queries::ADD_COMMENT,
            json!({ "postId": post_id.to_string(), "text": text }),
            "addComment",
        )
        .await
    }

    // Images

    /// Upload a local image file and return its hosted URL
    pub async fn upload_image(&self, path: &Path) -> ApiResult<String> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::File {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(image_mime_type(path))?;
        let form = multipart::Form::new().part("image", part);

        let url = format!("{}/upload-image", self.base_url);
        let req = self.add_auth_header(self.client.post(&url).multipart(form));
        let response = Self::check_status(req.send().await?).await?;
        let uploaded: UploadImageResponse = response.json().await?;
        Ok(uploaded.image_url)
    }
}

/// Content type for an image path, judged by extension
pub fn image_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
