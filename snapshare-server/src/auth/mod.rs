pub mod password;
pub mod token;

pub use password::PasswordHasher;
pub use token::{bearer_token, TokenService};

use crate::service::ServiceError;

/// Who is making the current request.
///
/// Built once per request by the auth middleware. A missing or invalid token
/// yields an anonymous viewer; the failure only surfaces when an operation
/// calls [`Viewer::require`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    user_id: Option<i64>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    /// The authenticated user ID, or UNAUTHENTICATED
    pub fn require(&self) -> Result<i64, ServiceError> {
        self.user_id
            .ok_or_else(|| ServiceError::Unauthenticated("Not authenticated".to_string()))
    }
}
