// Library interface for the snapshare CLI (for testing purposes)
pub mod api;
pub mod feed;
pub mod health;
pub mod logging;
pub mod session;
