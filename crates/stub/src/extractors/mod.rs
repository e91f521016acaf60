//! Axum extractors for the stub service.

pub mod auth;
pub mod pagination;

pub use auth::Caller;
pub use pagination::Pagination;
