//! HTTP route handlers.

pub mod cart;
pub mod catalog;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod users;

use serde::Deserialize;

/// Pagination query parameters shared by the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}
