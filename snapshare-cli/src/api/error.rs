use snapshare_types::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Could not read {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },
}

impl ApiError {
    /// Map a GraphQL error `extensions.code` onto a typed error
    pub fn from_graphql(code: Option<ErrorCode>, message: String) -> Self {
        match code {
            Some(ErrorCode::Unauthenticated) => ApiError::Unauthorized(message),
            Some(ErrorCode::BadUserInput) => ApiError::BadRequest(message),
            Some(ErrorCode::Forbidden) => ApiError::Forbidden(message),
            Some(ErrorCode::NotFound) => ApiError::NotFound(message),
            Some(ErrorCode::InternalServerError) | None => ApiError::Api(message),
        }
    }

    /// The stored token is no good and the user must log in again
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_codes_map_to_variants() {
        assert!(matches!(
            ApiError::from_graphql(Some(ErrorCode::Unauthenticated), "x".into()),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_graphql(Some(ErrorCode::BadUserInput), "x".into()),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from_graphql(Some(ErrorCode::Forbidden), "x".into()),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from_graphql(Some(ErrorCode::NotFound), "x".into()),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_graphql(Some(ErrorCode::InternalServerError), "x".into()),
            ApiError::Api(_)
        ));
        assert!(matches!(ApiError::from_graphql(None, "x".into()), ApiError::Api(_)));
    }
}
