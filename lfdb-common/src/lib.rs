//! # LaptopFixDB Common Library
//!
//! Shared code for the LaptopFixDB service crates:
//! - Error type and result alias
//! - Configuration loading and root folder resolution
//! - Database schema, initialization and domain enums
//! - Slug and problem-type normalization
//! - Password hashing and session-token primitives

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod normalize;
pub mod time;

pub use error::{Error, Result};
