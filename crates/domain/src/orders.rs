//! Order service: listing, status transitions, and checkout.

use chrono::Utc;
use common::{OrderId, UserId};
use store::{Checkout, Order, OrderLine, OrderStatus, ShopStore};

use crate::error::{DomainError, Result};

/// Service for placed orders and the checkout workflow.
pub struct OrderService<S: ShopStore> {
    store: S,
}

impl<S: ShopStore> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Converts the user's cart into an order.
    ///
    /// The store performs the whole conversion in one transaction
    /// scope: order and order lines appear and the cart empties, or
    /// nothing changes. The order total is the sum of the cart lines'
    /// snapshot prices times quantities; current catalog prices play
    /// no part. An empty cart is rejected here rather than producing
    /// a zero-total order.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(&self, user_id: UserId) -> Result<Checkout> {
        if self.store.get_user(user_id).await?.is_none() {
            return Err(DomainError::not_found("user", user_id));
        }

        match self.store.checkout(user_id, Utc::now()).await {
            Ok(Some(checkout)) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = %checkout.order.id,
                    total_cents = checkout.order.total.cents(),
                    lines = checkout.lines.len(),
                    "checkout completed"
                );
                Ok(checkout)
            }
            Ok(None) => Err(DomainError::EmptyCart),
            Err(e) => {
                metrics::counter!("checkout_failures_total").increment(1);
                tracing::error!(error = %e, "checkout failed");
                Err(e.into())
            }
        }
    }

    /// Returns all orders for a user, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// Loads an order, failing with `NotFound` when absent.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))
    }

    /// Loads an order together with its lines.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_with_lines(&self, id: OrderId) -> Result<(Order, Vec<OrderLine>)> {
        let order = self.get_order(id).await?;
        let lines = self.store.order_lines(id).await?;
        Ok((order, lines))
    }

    /// Moves an order to a new status, enforcing the transition rules
    /// (`Created → Paid → Completed`, `Created → Cancelled`).
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let order = self.get_order(id).await?;

        if !order.status.can_transition_to(status) {
            return Err(DomainError::InvalidStatusTransition {
                from: order.status,
                to: status,
            });
        }

        self.store
            .set_order_status(id, status)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))
    }
}
