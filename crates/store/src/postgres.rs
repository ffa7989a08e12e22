use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartLineId, CategoryId, Money, OrderId, ProductId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CartLine, Category, Checkout, NewCartLine, NewCategory, NewProduct, Order, OrderLine,
    OrderStatus, Product, Result, ShopStore, StoreError, UpdateProduct, User,
};

/// PostgreSQL-backed shop store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL shop store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            email: row.try_get("email")?,
        })
    }

    fn row_to_category(row: PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            parent_id: row
                .try_get::<Option<i64>, _>("parent_id")?
                .map(CategoryId::new),
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            discount_price: row
                .try_get::<Option<i64>, _>("discount_price_cents")?
                .map(Money::from_cents),
            stock: row.try_get("stock")?,
            category_id: CategoryId::new(row.try_get("category_id")?),
        })
    }

    fn row_to_cart_line(row: PgRow) -> Result<CartLine> {
        Ok(CartLine {
            id: CartLineId::new(row.try_get("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            price: Money::from_cents(row.try_get("price_cents")?),
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(StoreError::Backend)?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            status,
            total: Money::from_cents(row.try_get("total_cents")?),
        })
    }

    fn row_to_order_line(row: PgRow) -> Result<OrderLine> {
        Ok(OrderLine {
            id: row.try_get("id")?,
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            price: Money::from_cents(row.try_get("price_cents")?),
        })
    }
}

/// Maps a unique constraint violation to [`StoreError::UniqueViolation`],
/// leaving other database errors untouched.
fn map_constraint_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::UniqueViolation {
            constraint: db_err.constraint().unwrap_or("unknown").to_string(),
        };
    }
    StoreError::Database(e)
}

#[async_trait]
impl ShopStore for PostgresStore {
    async fn create_user(&self, email: &str) -> Result<User> {
        let row = sqlx::query("INSERT INTO users (email) VALUES ($1) RETURNING id, email")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(map_constraint_err)?;

        Self::row_to_user(row)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (name, parent_id)
            VALUES ($1, $2)
            RETURNING id, name, parent_id
            "#,
        )
        .bind(&new.name)
        .bind(new.parent_id.map(i64::from))
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_err)?;

        Self::row_to_category(row)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, parent_id FROM categories WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_category).transpose()
    }

    async fn list_categories(&self, offset: i64, limit: i64) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, parent_id
            FROM categories
            ORDER BY id ASC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_category).collect()
    }

    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products
                (sku, name, description, price_cents, discount_price_cents, stock, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, sku, name, description, price_cents, discount_price_cents, stock,
                      category_id
            "#,
        )
        .bind(&new.sku)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.cents())
        .bind(new.discount_price.map(|p| p.cents()))
        .bind(new.stock)
        .bind(new.category_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_err)?;

        Self::row_to_product(row)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, sku, name, description, price_cents, discount_price_cents, stock,
                   category_id
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, offset: i64, limit: i64) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sku, name, description, price_cents, discount_price_cents, stock,
                   category_id
            FROM products
            ORDER BY id ASC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: UpdateProduct,
    ) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price_cents = COALESCE($4, price_cents),
                discount_price_cents = COALESCE($5, discount_price_cents),
                stock = COALESCE($6, stock),
                category_id = COALESCE($7, category_id)
            WHERE id = $1
            RETURNING id, sku, name, description, price_cents, discount_price_cents, stock,
                      category_id
            "#,
        )
        .bind(id.as_i64())
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.price.map(|p| p.cents()))
        .bind(changes.discount_price.map(|p| p.cents()))
        .bind(changes.stock)
        .bind(changes.category_id.map(i64::from))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn products_in_category_tree(&self, category_id: CategoryId) -> Result<Vec<Product>> {
        // Shallow expansion: the category itself plus its direct children.
        let rows = sqlx::query(
            r#"
            SELECT id, sku, name, description, price_cents, discount_price_cents, stock,
                   category_id
            FROM products
            WHERE category_id = $1
               OR category_id IN (SELECT id FROM categories WHERE parent_id = $1)
            ORDER BY id ASC
            "#,
        )
        .bind(category_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, product_id, quantity, price_cents
            FROM cart_items
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart_line).collect()
    }

    async fn insert_cart_line(&self, new: NewCartLine) -> Result<CartLine> {
        let row = sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, product_id, quantity, price_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, product_id, quantity, price_cents
            "#,
        )
        .bind(new.user_id.as_uuid())
        .bind(new.product_id.as_i64())
        .bind(new.quantity as i32)
        .bind(new.price.cents())
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_err)?;

        Self::row_to_cart_line(row)
    }

    async fn update_cart_line_quantity(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Option<CartLine>> {
        let row = sqlx::query(
            r#"
            UPDATE cart_items
            SET quantity = $3
            WHERE id = $2 AND user_id = $1
            RETURNING id, user_id, product_id, quantity, price_cents
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(line_id.as_i64())
        .bind(quantity as i32)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_line).transpose()
    }

    async fn delete_cart_line(&self, user_id: UserId, line_id: CartLineId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $2 AND user_id = $1")
            .bind(user_id.as_uuid())
            .bind(line_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, created_at, status, total_cents
            FROM orders
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            "SELECT id, user_id, created_at, status, total_cents FROM orders WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order_line).collect()
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2
            WHERE id = $1
            RETURNING id, user_id, created_at, status, total_cents
            "#,
        )
        .bind(id.as_i64())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn checkout(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Option<Checkout>> {
        let mut tx = self.pool.begin().await?;

        // Lock the user's cart lines. Concurrent checkouts for the same
        // user queue here; whoever commits first consumes the lines and
        // the other sees an empty cart.
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, product_id, quantity, price_cents
            FROM cart_items
            WHERE user_id = $1
            ORDER BY id ASC
            FOR UPDATE
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&mut *tx)
        .await?;

        let cart: Vec<CartLine> = rows
            .into_iter()
            .map(Self::row_to_cart_line)
            .collect::<Result<_>>()?;

        if cart.is_empty() {
            // Dropping the transaction rolls it back.
            return Ok(None);
        }

        let total: Money = cart.iter().map(CartLine::total).sum();

        let order_row = sqlx::query(
            r#"
            INSERT INTO orders (user_id, created_at, status, total_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, created_at, status, total_cents
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(now)
        .bind(OrderStatus::Created.as_str())
        .bind(total.cents())
        .fetch_one(&mut *tx)
        .await?;

        let order = Self::row_to_order(order_row)?;

        let mut lines = Vec::with_capacity(cart.len());
        for cart_line in &cart {
            let line_row = sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price_cents)
                VALUES ($1, $2, $3, $4)
                RETURNING id, order_id, product_id, quantity, price_cents
                "#,
            )
            .bind(order.id.as_i64())
            .bind(cart_line.product_id.as_i64())
            .bind(cart_line.quantity as i32)
            .bind(cart_line.price.cents())
            .fetch_one(&mut *tx)
            .await?;

            lines.push(Self::row_to_order_line(line_row)?);
        }

        // Delete exactly the lines that were locked and copied, not
        // whatever the cart holds by commit time.
        let line_ids: Vec<i64> = cart.iter().map(|l| l.id.as_i64()).collect();
        sqlx::query("DELETE FROM cart_items WHERE id = ANY($1)")
            .bind(&line_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(Checkout { order, lines }))
    }
}
