use serde::{Deserialize, Serialize};

/// Machine-readable error classification shared by the GraphQL `code`
/// extension, the `DeletePostResponse.code` field and the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
pub enum ErrorCode {
    Unauthenticated,
    BadUserInput,
    Forbidden,
    NotFound,
    InternalServerError,
}
