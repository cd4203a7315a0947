// Library exports for snapshare-server
// The binary and the integration tests build the router from here

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod graphql;
pub mod image_host;
pub mod middleware;
pub mod rate_limit;
pub mod service;
pub mod state;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use rate_limit::RateLimiter;
use state::AppState;

/// Build the HTTP application: GraphQL, image upload and health check
pub fn app(state: AppState) -> Result<Router> {
    let schema = graphql::build_schema(state.clone());
    let rate_limiter = RateLimiter::from_settings(&state.settings.rate_limit);
    let cors = cors_layer(&state.settings.server.cors_origin)?;
    let max_upload_bytes = state.settings.upload.max_bytes;

    let router = Router::new()
        .route("/health", get(health_check))
        .route(
            "/graphql",
            get(graphql::graphiql).post(graphql::graphql_handler),
        )
        .route("/upload-image", post(api::upload::upload_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        // Runs after the viewer is resolved so limits apply to verified users
        .layer(axum::middleware::from_fn(rate_limit::rate_limit_middleware))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::viewer_middleware,
        ))
        .layer(axum::Extension(schema))
        .layer(axum::Extension(rate_limiter))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

/// CORS for the configured origin, or any origin for `*`
pub fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if origin.trim() == "*" {
        return Ok(cors.allow_origin(Any));
    }

    let origin = HeaderValue::from_str(origin.trim())
        .with_context(|| format!("Invalid CORS origin: {}", origin))?;
    Ok(cors.allow_origin(origin).allow_credentials(true))
}

async fn health_check() -> &'static str {
    "OK"
}
