//! Query functions over the shared SQLite schema

pub mod catalog;
pub mod repairs;
pub mod stats;
pub mod users;
pub mod videos;
