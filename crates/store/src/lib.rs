//! Relational persistence for the shop backend.
//!
//! The [`ShopStore`] trait defines everything the services need from
//! storage; [`PostgresStore`] is the production implementation and
//! [`InMemoryStore`] backs unit tests. Uniqueness is enforced by
//! database constraints and surfaces as [`StoreError::UniqueViolation`],
//! and checkout runs as a single all-or-nothing transaction.

pub mod entities;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{CartLineId, CategoryId, Money, OrderId, ProductId, UserId};
pub use entities::{
    CartLine, Category, Checkout, NewCartLine, NewCategory, NewProduct, Order, OrderLine,
    OrderStatus, Product, UpdateProduct, User,
};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::ShopStore;
