use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use snapshare_types::ErrorResponse;

use crate::auth::Viewer;
use crate::config::RateLimit;

/// Simple in-memory rate limiter
/// Tracks requests per authenticated user in fixed windows
#[derive(Clone)]
pub struct RateLimiter {
    // Map of user_id -> (request_count, window_start)
    state: Arc<Mutex<HashMap<i64, (u32, Instant)>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window_duration: Duration::from_secs(window_seconds),
        }
    }

    pub fn from_settings(settings: &RateLimit) -> Self {
        Self::new(settings.max_requests, settings.window_secs)
    }

    /// Check if a request should be allowed. Anonymous viewers are not
    /// limited and leave no trace in the table.
    pub fn check_rate_limit(&self, viewer: &Viewer) -> Result<(), String> {
        match viewer.user_id() {
            Some(user_id) => self.check_at(user_id, Instant::now()),
            None => Ok(()),
        }
    }

    fn check_at(&self, user_id: i64, now: Instant) -> Result<(), String> {
        // A poisoned lock only means another request panicked mid-update
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        // Clean up old entries periodically (simple cleanup)
        if state.len() > 10000 {
            state.retain(|_, (_, start)| now.duration_since(*start) < self.window_duration * 2);
        }

        match state.get_mut(&user_id) {
            Some((count, window_start)) => {
                if now.duration_since(*window_start) < self.window_duration {
                    if *count >= self.max_requests {
                        let remaining = self.window_duration - now.duration_since(*window_start);
                        return Err(format!(
                            "Rate limit exceeded. Try again in {} seconds.",
                            remaining.as_secs().max(1)
                        ));
                    }
                    *count += 1;
                } else {
                    // New window
                    *window_start = now;
                    *count = 1;
                }
            }
            None => {
                state.insert(user_id, (1, now));
            }
        }

        Ok(())
    }
}

/// Middleware to apply rate limiting to all requests.
///
/// Must run inside [`crate::middleware::viewer_middleware`]: the key is the
/// verified user, so forged tokens count as anonymous.
pub async fn rate_limit_middleware(
    axum::Extension(limiter): axum::Extension<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let viewer = request
        .extensions()
        .get::<Viewer>()
        .copied()
        .unwrap_or_default();

    if let Err(msg) = limiter.check_rate_limit(&viewer) {
        tracing::warn!("Rate limit exceeded for user {:?}", viewer.user_id());
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: msg,
                details: None,
            }),
        )
            .into_response();
    }

    next.run(request).await
}
