use async_graphql::{Error, ErrorExtensions};

use crate::service::{ServiceError, ServiceResult};

impl ErrorExtensions for ServiceError {
    fn extend(&self) -> Error {
        let message = match self {
            ServiceError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let code = async_graphql::to_value(self.code()).unwrap_or_default();
        Error::new(message).extend_with(|_, ext| ext.set("code", code))
    }
}

/// Convert service results into GraphQL results carrying an error `code`
pub(crate) trait GraphqlResultExt<T> {
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T> GraphqlResultExt<T> for ServiceResult<T> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.extend())
    }
}
