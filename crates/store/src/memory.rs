use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartLineId, CategoryId, Money, OrderId, ProductId, UserId};
use tokio::sync::RwLock;

use crate::{
    CartLine, Category, Checkout, NewCartLine, NewCategory, NewProduct, Order, OrderLine,
    OrderStatus, Product, Result, ShopStore, StoreError, UpdateProduct, User,
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    categories: Vec<Category>,
    products: Vec<Product>,
    cart: Vec<CartLine>,
    orders: Vec<Order>,
    order_lines: Vec<OrderLine>,
    next_category_id: i64,
    next_product_id: i64,
    next_cart_line_id: i64,
    next_order_id: i64,
    next_order_line_id: i64,
    // Test hook: abort the next checkout after this many order lines
    // have been staged. The order is staged first, so 0 means "order
    // created, no lines copied".
    checkout_fault_after_lines: Option<usize>,
}

impl Inner {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// In-memory shop store implementation for testing.
///
/// Stores all rows in memory behind a single lock and provides the same
/// interface and semantics as the PostgreSQL implementation, including
/// uniqueness enforcement and all-or-nothing checkout. Every operation
/// takes the lock once, so checkouts are naturally serialized.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot fault in the next checkout: it aborts after the
    /// order and `lines` order lines have been staged, before anything
    /// becomes visible. Exercises the all-or-nothing guarantee.
    pub async fn fail_next_checkout_after_lines(&self, lines: usize) {
        self.inner.write().await.checkout_fault_after_lines = Some(lines);
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl ShopStore for InMemoryStore {
    async fn create_user(&self, email: &str) -> Result<User> {
        let mut inner = self.inner.write().await;

        if inner.users.iter().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation {
                constraint: "users_email_unique".to_string(),
            });
        }

        let user = User {
            id: UserId::new(),
            email: email.to_string(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let mut inner = self.inner.write().await;

        if inner.categories.iter().any(|c| c.name == new.name) {
            return Err(StoreError::UniqueViolation {
                constraint: "categories_name_unique".to_string(),
            });
        }

        let category = Category {
            id: CategoryId::new(Inner::next_id(&mut inner.next_category_id)),
            name: new.name,
            parent_id: new.parent_id,
        };
        inner.categories.push(category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let inner = self.inner.read().await;
        Ok(inner.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_categories(&self, offset: i64, limit: i64) -> Result<Vec<Category>> {
        let inner = self.inner.read().await;
        Ok(inner
            .categories
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let mut inner = self.inner.write().await;

        if inner.products.iter().any(|p| p.sku == new.sku) {
            return Err(StoreError::UniqueViolation {
                constraint: "products_sku_unique".to_string(),
            });
        }

        let product = Product {
            id: ProductId::new(Inner::next_id(&mut inner.next_product_id)),
            sku: new.sku,
            name: new.name,
            description: new.description,
            price: new.price,
            discount_price: new.discount_price,
            stock: new.stock,
            category_id: new.category_id,
        };
        inner.products.push(product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_products(&self, offset: i64, limit: i64) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: UpdateProduct,
    ) -> Result<Option<Product>> {
        let mut inner = self.inner.write().await;

        let product = inner.products.iter_mut().find(|p| p.id == id);
        Ok(product.map(|p| {
            if let Some(name) = changes.name {
                p.name = name;
            }
            if let Some(description) = changes.description {
                p.description = Some(description);
            }
            if let Some(price) = changes.price {
                p.price = price;
            }
            if let Some(discount) = changes.discount_price {
                p.discount_price = Some(discount);
            }
            if let Some(stock) = changes.stock {
                p.stock = stock;
            }
            if let Some(category_id) = changes.category_id {
                p.category_id = category_id;
            }
            p.clone()
        }))
    }

    async fn products_in_category_tree(&self, category_id: CategoryId) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;

        // The category itself plus its direct children only.
        let mut scope: Vec<CategoryId> = vec![category_id];
        scope.extend(
            inner
                .categories
                .iter()
                .filter(|c| c.parent_id == Some(category_id))
                .map(|c| c.id),
        );

        Ok(inner
            .products
            .iter()
            .filter(|p| scope.contains(&p.category_id))
            .cloned()
            .collect())
    }

    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let inner = self.inner.read().await;
        Ok(inner
            .cart
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_cart_line(&self, new: NewCartLine) -> Result<CartLine> {
        let mut inner = self.inner.write().await;

        if inner
            .cart
            .iter()
            .any(|l| l.user_id == new.user_id && l.product_id == new.product_id)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "cart_items_user_product_unique".to_string(),
            });
        }

        let line = CartLine {
            id: CartLineId::new(Inner::next_id(&mut inner.next_cart_line_id)),
            user_id: new.user_id,
            product_id: new.product_id,
            quantity: new.quantity,
            price: new.price,
        };
        inner.cart.push(line.clone());
        Ok(line)
    }

    async fn update_cart_line_quantity(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Option<CartLine>> {
        let mut inner = self.inner.write().await;

        let line = inner
            .cart
            .iter_mut()
            .find(|l| l.id == line_id && l.user_id == user_id);

        Ok(line.map(|l| {
            l.quantity = quantity;
            l.clone()
        }))
    }

    async fn delete_cart_line(&self, user_id: UserId, line_id: CartLineId) -> Result<bool> {
        let mut inner = self.inner.write().await;

        let before = inner.cart.len();
        inner
            .cart
            .retain(|l| !(l.id == line_id && l.user_id == user_id));
        Ok(inner.cart.len() < before)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order_lines
            .iter()
            .filter(|l| l.order_id == id)
            .cloned()
            .collect())
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let mut inner = self.inner.write().await;

        let order = inner.orders.iter_mut().find(|o| o.id == id);
        Ok(order.map(|o| {
            o.status = status;
            o.clone()
        }))
    }

    async fn checkout(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Option<Checkout>> {
        // One write lock for the whole workflow: checkouts serialize,
        // and nothing is visible until the staged state is applied at
        // the end (the commit point).
        let mut inner = self.inner.write().await;

        let cart: Vec<CartLine> = inner
            .cart
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();

        if cart.is_empty() {
            return Ok(None);
        }

        let total: Money = cart.iter().map(CartLine::total).sum();

        // Stage the order and its lines. Counters advance eagerly, like
        // database sequences, but no table changes until the end.
        let order = Order {
            id: OrderId::new(Inner::next_id(&mut inner.next_order_id)),
            user_id,
            created_at: now,
            status: OrderStatus::Created,
            total,
        };

        let fault = inner.checkout_fault_after_lines;
        let mut lines = Vec::with_capacity(cart.len());
        for cart_line in &cart {
            if fault == Some(lines.len()) {
                inner.checkout_fault_after_lines = None;
                return Err(StoreError::Backend("injected checkout fault".to_string()));
            }
            lines.push(OrderLine {
                id: Inner::next_id(&mut inner.next_order_line_id),
                order_id: order.id,
                product_id: cart_line.product_id,
                quantity: cart_line.quantity,
                price: cart_line.price,
            });
        }

        // Commit point: apply everything at once.
        inner.orders.push(order.clone());
        inner.order_lines.extend(lines.clone());
        let consumed: Vec<CartLineId> = cart.iter().map(|l| l.id).collect();
        inner.cart.retain(|l| !consumed.contains(&l.id));

        Ok(Some(Checkout { order, lines }))
    }
}
