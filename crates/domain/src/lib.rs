//! Domain layer for the shop backend.
//!
//! This crate provides the business services on top of a [`ShopStore`]:
//! - `CatalogService` for products and categories
//! - `CartService` for per-user carts with price snapshots
//! - `OrderService` for checkout and order status transitions
//!
//! Services are generic over the store so the same rules run against
//! Postgres in production and the in-memory store in tests.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod orders;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use error::{DomainError, Result};
pub use orders::OrderService;
pub use store::ShopStore;
