//! Shared HTTP API functionality
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared request/response types
//!
//! The server crate wraps these with axum middleware and extractors.

pub mod auth;
pub mod types;

pub use auth::{
    cron_request_allowed, generate_session_token, hash_password, parse_bearer, verify_password,
};
pub use types::{PageRequest, PaginationMeta};
