//! Typed operations behind the GraphQL resolvers.
//!
//! Services own validation, authorization and the mapping of storage
//! failures onto [`ServiceError`]. They are synchronous and talk to the
//! repositories directly.

pub mod accounts;
pub mod error;
pub mod posts;
pub mod validation;

pub use accounts::{AccountService, ProfileChanges};
pub use error::{parse_id, ServiceError, ServiceResult};
pub use posts::PostService;
