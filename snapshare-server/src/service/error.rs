use snapshare_types::ErrorCode;
use thiserror::Error;

/// Failure of a service operation.
///
/// Every variant except `Internal` carries a message that is safe to show
/// the caller.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    BadUserInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Unauthenticated(_) => ErrorCode::Unauthenticated,
            ServiceError::BadUserInput(_) => ErrorCode::BadUserInput,
            ServiceError::NotFound(_) => ErrorCode::NotFound,
            ServiceError::Internal(_) => ErrorCode::InternalServerError,
        }
    }

    pub fn bad_input(msg: impl Into<String>) -> Self {
        ServiceError::BadUserInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }
}

/// Parse a GraphQL `ID` argument into a row ID
pub fn parse_id(raw: &str, what: &str) -> ServiceResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ServiceError::bad_input(format!("Invalid {} ID: {}", what, raw)))
}
