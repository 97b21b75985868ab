//! HTTP API handlers for lfdb-server

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod cron;
pub mod diagnostics;
pub mod health;
pub mod jobs;
pub mod sitemap;

pub use admin::admin_routes;
pub use auth::{auth_routes, require_admin, require_cron_secret, CurrentUser};
pub use catalog::catalog_routes;
pub use cron::cron_routes;
pub use diagnostics::diagnostics_routes;
pub use health::health_routes;
pub use jobs::jobs_routes;
pub use sitemap::sitemap_routes;
