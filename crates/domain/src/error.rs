//! Domain error types.
//!
//! The store layer reports absence as `Ok(None)`; the services here are
//! what turn absence, uniqueness violations, and bad input into the
//! typed failures callers see. Raw storage errors are wrapped, never
//! leaked as-is to HTTP.

use store::{OrderStatus, StoreError};
use thiserror::Error;

/// Errors that can occur during shop operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness rule was violated (sku, category name, or one cart
    /// line per product per user).
    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    /// The input was rejected before reaching the store.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested order status change is not an allowed transition.
    #[error("Invalid order status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Checkout was attempted with no cart lines.
    #[error("Cannot check out an empty cart")]
    EmptyCart,

    /// An error occurred in the underlying store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Builds a `NotFound` for an entity referenced by ID.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
