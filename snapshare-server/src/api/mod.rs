pub mod error;
pub mod upload;

pub use error::{ApiError, ApiResult};
