//! Cart service.
//!
//! A cart is not a persisted entity of its own; it is the set of cart lines
//! owned by a user. Each line snapshots the product's effective price
//! at the moment it is added, and that snapshot is what checkout
//! charges later.

use common::{CartLineId, ProductId, UserId};
use store::{CartLine, NewCartLine, ShopStore, StoreError};

use crate::error::{DomainError, Result};

/// Service for managing per-user shopping carts.
pub struct CartService<S: ShopStore> {
    store: S,
}

impl<S: ShopStore> CartService<S> {
    /// Creates a new cart service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart lines, oldest first. An unknown user
    /// simply has an empty cart.
    #[tracing::instrument(skip(self))]
    pub async fn list_cart(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        Ok(self.store.cart_lines(user_id).await?)
    }

    /// Adds a product to the user's cart, snapshotting its effective
    /// price (discount price when set, list price otherwise).
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine> {
        if quantity < 1 {
            return Err(DomainError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }

        if self.store.get_user(user_id).await?.is_none() {
            return Err(DomainError::not_found("user", user_id));
        }

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", product_id))?;

        let new = NewCartLine {
            user_id,
            product_id,
            quantity,
            price: product.effective_price(),
        };

        match self.store.insert_cart_line(new).await {
            Ok(line) => Ok(line),
            Err(StoreError::UniqueViolation { .. }) => Err(DomainError::AlreadyExists("cart line")),
            Err(e) => Err(e.into()),
        }
    }

    /// Sets the quantity of one of the user's cart lines.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<CartLine> {
        if quantity < 1 {
            return Err(DomainError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }

        self.store
            .update_cart_line_quantity(user_id, line_id, quantity)
            .await?
            .ok_or_else(|| DomainError::not_found("cart line", line_id))
    }

    /// Removes one of the user's cart lines. Lines owned by other
    /// users are invisible here, so the ownership check is implicit.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, user_id: UserId, line_id: CartLineId) -> Result<()> {
        if self.store.delete_cart_line(user_id, line_id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("cart line", line_id))
        }
    }
}
