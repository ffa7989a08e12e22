//! Shared types for the shop backend.

pub mod types;

pub use types::{CartLineId, CategoryId, Money, OrderId, ProductId, UserId};
