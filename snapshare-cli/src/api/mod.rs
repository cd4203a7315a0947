mod client;
mod error;
mod queries;

pub use client::{image_mime_type, ApiClient, ProfileEdit};
pub use error::{ApiError, ApiResult};
