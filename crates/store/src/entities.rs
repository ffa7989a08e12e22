//! Persisted entities and their insert payloads.

use chrono::{DateTime, Utc};
use common::{CartLineId, CategoryId, Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A registered user. Kept minimal; authentication is out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

/// A product category. Categories form a tree via `parent_id`;
/// `None` means top-level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

/// Payload for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub stock: i64,
    pub category_id: CategoryId,
}

impl Product {
    /// The price a buyer pays right now: the discount price when one is
    /// set, the list price otherwise.
    pub fn effective_price(&self) -> Money {
        self.discount_price.unwrap_or(self.price)
    }
}

/// Payload for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub stock: i64,
    pub category_id: CategoryId,
}

/// Partial update for a product. `None` fields are left unchanged;
/// the sku is immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub discount_price: Option<Money>,
    pub stock: Option<i64>,
    pub category_id: Option<CategoryId>,
}

/// One cart line: a product, a quantity, and the price snapshotted when
/// the product was added. The snapshot is what checkout charges; later
/// catalog price changes do not touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

impl CartLine {
    /// Returns the line total (snapshot price times quantity).
    pub fn total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// Payload for inserting a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

/// The status of an order in its lifecycle.
///
/// Allowed transitions:
/// ```text
/// Created ──► Paid ──► Completed
///    │
///    └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order has been placed, awaiting payment.
    #[default]
    Created,

    /// Payment confirmed.
    Paid,

    /// Order fulfilled (terminal state).
    Completed,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the status may move to `next`.
    ///
    /// Same-state writes are not transitions and are rejected.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Created, OrderStatus::Paid)
                | (OrderStatus::Created, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Completed)
        )
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Paid => "paid",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "created" => Ok(OrderStatus::Created),
            "paid" => Ok(OrderStatus::Paid),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// A placed order. The total is derived from its lines at checkout time
/// and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total: Money,
}

/// One line of a placed order. Created atomically with its order and
/// never mutated; `price` is the price-at-purchase snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

/// The result of a successful checkout: the new order and its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_price_prefers_discount() {
        let product = Product {
            id: ProductId::new(1),
            sku: "SKU-001".into(),
            name: "Widget".into(),
            description: None,
            price: Money::from_cents(1000),
            discount_price: Some(Money::from_cents(800)),
            stock: 5,
            category_id: CategoryId::new(1),
        };
        assert_eq!(product.effective_price().cents(), 800);

        let full_price = Product {
            discount_price: None,
            ..product
        };
        assert_eq!(full_price.effective_price().cents(), 1000);
    }

    #[test]
    fn cart_line_total() {
        let line = CartLine {
            id: CartLineId::new(1),
            user_id: UserId::new(),
            product_id: ProductId::new(1),
            quantity: 3,
            price: Money::from_cents(250),
        };
        assert_eq!(line.total().cents(), 750);
    }

    #[test]
    fn status_allows_forward_transitions() {
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn status_rejects_everything_else() {
        assert!(!OrderStatus::Created.can_transition_to(OrderStatus::Created));
        assert!(!OrderStatus::Created.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Paid));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Created));
    }

    #[test]
    fn status_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Created.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            OrderStatus::Created,
            OrderStatus::Paid,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
