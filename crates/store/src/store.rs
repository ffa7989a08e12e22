//! The persistence contract shared by all store backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartLineId, CategoryId, OrderId, ProductId, UserId};

use crate::entities::{
    CartLine, Category, Checkout, NewCartLine, NewCategory, NewProduct, Order, OrderLine,
    OrderStatus, Product, UpdateProduct, User,
};
use crate::error::Result;

/// Relational store for users, catalog, cart, and orders.
///
/// Lookups return `Ok(None)` (or `Ok(false)` for deletes) on a miss;
/// translating absence into a not-found failure is the service layer's
/// job. Uniqueness is enforced by the backend and surfaces as
/// [`StoreError::UniqueViolation`](crate::StoreError::UniqueViolation).
///
/// Paged listings are ordered by insertion (ascending id), so pages are
/// stable across calls.
#[async_trait]
pub trait ShopStore: Send + Sync {
    // -- Users --

    /// Creates a user.
    async fn create_user(&self, email: &str) -> Result<User>;

    /// Loads a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    // -- Categories --

    /// Inserts a category.
    async fn insert_category(&self, new: NewCategory) -> Result<Category>;

    /// Loads a category by ID.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Returns a page of categories in insertion order.
    async fn list_categories(&self, offset: i64, limit: i64) -> Result<Vec<Category>>;

    // -- Products --

    /// Inserts a product.
    async fn insert_product(&self, new: NewProduct) -> Result<Product>;

    /// Loads a product by ID.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Returns a page of products in insertion order.
    async fn list_products(&self, offset: i64, limit: i64) -> Result<Vec<Product>>;

    /// Applies a partial update to a product. Returns `None` if the
    /// product does not exist. Existing cart lines keep their price
    /// snapshots; only the catalog row changes.
    async fn update_product(
        &self,
        id: ProductId,
        changes: UpdateProduct,
    ) -> Result<Option<Product>>;

    /// Returns products in the given category or any of its direct
    /// children. One level of tree expansion only; grandchildren are
    /// not included.
    async fn products_in_category_tree(&self, category_id: CategoryId) -> Result<Vec<Product>>;

    // -- Cart --

    /// Returns all cart lines for a user, oldest first.
    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>>;

    /// Inserts a cart line. One line per `(user, product)` is enforced
    /// by the backend.
    async fn insert_cart_line(&self, new: NewCartLine) -> Result<CartLine>;

    /// Sets the quantity of a cart line, scoped to its owner. Returns
    /// `None` if the user has no such line.
    async fn update_cart_line_quantity(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Option<CartLine>>;

    /// Deletes a cart line, scoped to its owner. Returns whether a line
    /// was deleted.
    async fn delete_cart_line(&self, user_id: UserId, line_id: CartLineId) -> Result<bool>;

    // -- Orders --

    /// Returns all orders for a user, oldest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Loads an order by ID.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Returns the lines of an order.
    async fn order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>>;

    /// Sets the status of an order. Returns `None` if the order does
    /// not exist. Transition rules are the caller's concern.
    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>>;

    // -- Checkout --

    /// Converts the user's cart into an order, atomically.
    ///
    /// Within a single transaction scope: loads and locks the user's
    /// cart lines, computes the total from their price snapshots,
    /// inserts the order with status [`OrderStatus::Created`] and
    /// `created_at = now`, copies each cart line into an order line,
    /// and deletes exactly the loaded cart lines. Either all of that
    /// state is visible afterwards or none of it is.
    ///
    /// Returns `Ok(None)` when the cart is empty, leaving no trace.
    /// Concurrent checkouts for the same user serialize; the loser
    /// observes an empty cart.
    async fn checkout(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Option<Checkout>>;
}
