mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{test_settings, test_state_with, StubImageHost};
use snapshare_server::app;

const BOUNDARY: &str = "snapshare-test-boundary";

fn router_with(host: Arc<StubImageHost>) -> Router {
    app(test_state_with(test_settings(), host)).expect("router builds")
}

fn multipart_body(field: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"photo\"\r\nContent-Type: {ct}\r\n\r\n",
            b = BOUNDARY,
            f = field,
            ct = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload-image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn graphql_request(query: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = router_with(Arc::default())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_graphiql_page_is_served() {
    let response = router_with(Arc::default())
        .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bearer_token_identifies_viewer() {
    let router = router_with(Arc::default());

    let signup = r#"mutation {
        signup(name: "Ada", username: "ada", email: "ada@example.com", password: "secret-password") { token }
    }"#;
    let response = router.clone().oneshot(graphql_request(signup, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = json_body(response).await["data"]["signup"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = router
        .clone()
        .oneshot(graphql_request("{ me { username } }", Some(&token)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["data"]["me"]["username"], json!("ada"));

    // A bad token is anonymous; the error only shows up where identity is needed
    let response = router
        .clone()
        .oneshot(graphql_request("{ me { username } }", Some("garbage")))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["extensions"]["code"], json!("UNAUTHENTICATED"));

    let response = router
        .oneshot(graphql_request("{ allPosts { id } }", Some("garbage")))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["data"]["allPosts"], json!([]));
}

#[tokio::test]
async fn test_upload_forwards_data_uri() {
    let host = Arc::new(StubImageHost::default());
    let response = router_with(host.clone())
        .oneshot(upload_request(multipart_body("image", "image/png", b"abc")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "imageUrl": "https://img.example/1.png" })
    );
    assert_eq!(
        host.uploads.lock().unwrap().as_slice(),
        ["data:image/png;base64,YWJj".to_string()]
    );
}

#[tokio::test]
async fn test_upload_rejects_missing_or_non_image_files() {
    let host = Arc::new(StubImageHost::default());

    let response = router_with(host.clone())
        .oneshot(upload_request(multipart_body("document", "image/png", b"abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["details"], json!("No image file provided."));

    let response = router_with(host.clone())
        .oneshot(upload_request(multipart_body("image", "text/plain", b"abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(host.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_host_failure_is_500() {
    let host = Arc::new(StubImageHost {
        fail: true,
        ..Default::default()
    });
    let response = router_with(host)
        .oneshot(upload_request(multipart_body("image", "image/jpeg", b"\xff\xd8")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["error"],
        json!("Failed to upload image.")
    );
}

#[tokio::test]
async fn test_rate_limit_applies_per_user() {
    let mut settings = test_settings();
    settings.rate_limit.max_requests = 2;
    let state = test_state_with(settings, Arc::default());
    let token = state.tokens.issue(1, "ada").unwrap();
    let other = state.tokens.issue(2, "bob").unwrap();
    let router = app(state).unwrap();

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(graphql_request("{ allPosts { id } }", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(graphql_request("{ allPosts { id } }", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Rate limit exceeded"));
    assert!(body["details"].is_null());

    // Other users keep their own budget
    let response = router
        .clone()
        .oneshot(graphql_request("{ allPosts { id } }", Some(&other)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Anonymous traffic is not limited
    let response = router
        .clone()
        .oneshot(graphql_request("{ allPosts { id } }", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forged_tokens_do_not_reset_the_limit() {
    let mut settings = test_settings();
    settings.rate_limit.max_requests = 1;
    let state = test_state_with(settings, Arc::default());
    let token = state.tokens.issue(1, "ada").unwrap();
    let router = app(state).unwrap();

    let response = router
        .clone()
        .oneshot(graphql_request("{ allPosts { id } }", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A made-up token is served as an anonymous caller, not as a fresh budget
    for i in 0..20 {
        let forged = format!("{}x{}", token, i);
        let response = router
            .clone()
            .oneshot(graphql_request("{ me { id } }", Some(&forged)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");
    }

    let response = router
        .oneshot(graphql_request("{ allPosts { id } }", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
