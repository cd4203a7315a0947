use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::{bearer_token, Viewer};
use crate::state::AppState;

/// Middleware that resolves the bearer token into a [`Viewer`]
///
/// Requests without a valid token proceed as anonymous; operations that need
/// identity reject them later.
pub async fn viewer_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let viewer = {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        match bearer_token(header) {
            Some(token) => match state.tokens.verify(token) {
                Ok(user_id) => Viewer::user(user_id),
                Err(_) => Viewer::anonymous(),
            },
            None => Viewer::anonymous(),
        }
    };

    request.extensions_mut().insert(viewer);
    next.run(request).await
}
