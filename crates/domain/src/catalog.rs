//! Catalog service: products and categories.

use common::{CategoryId, ProductId};
use store::{Category, NewCategory, NewProduct, Product, ShopStore, StoreError, UpdateProduct};

use crate::error::{DomainError, Result};

/// Service for managing the product catalog.
pub struct CatalogService<S: ShopStore> {
    store: S,
}

impl<S: ShopStore> CatalogService<S> {
    /// Creates a new catalog service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a product after validating its fields and category.
    #[tracing::instrument(skip(self, new), fields(sku = %new.sku))]
    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        validate_product(&new)?;

        if self.store.get_category(new.category_id).await?.is_none() {
            return Err(DomainError::not_found("category", new.category_id));
        }

        match self.store.insert_product(new).await {
            Ok(product) => Ok(product),
            Err(StoreError::UniqueViolation { .. }) => Err(DomainError::AlreadyExists("product")),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads a product, failing with `NotFound` when absent.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    /// Returns a page of products in insertion order.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, offset: i64, limit: i64) -> Result<Vec<Product>> {
        validate_page(offset, limit)?;
        Ok(self.store.list_products(offset, limit).await?)
    }

    /// Applies a partial update to a product. Cart lines holding a
    /// price snapshot of this product are not touched.
    #[tracing::instrument(skip(self, changes))]
    pub async fn update_product(
        &self,
        id: ProductId,
        changes: UpdateProduct,
    ) -> Result<Product> {
        if changes.price.is_some_and(|p| p.is_negative())
            || changes.discount_price.is_some_and(|p| p.is_negative())
        {
            return Err(DomainError::InvalidInput(
                "price must not be negative".to_string(),
            ));
        }
        if changes.stock.is_some_and(|s| s < 0) {
            return Err(DomainError::InvalidInput(
                "stock must not be negative".to_string(),
            ));
        }
        if let Some(category_id) = changes.category_id
            && self.store.get_category(category_id).await?.is_none()
        {
            return Err(DomainError::not_found("category", category_id));
        }

        self.store
            .update_product(id, changes)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    /// Returns products in the category or any of its direct children.
    #[tracing::instrument(skip(self))]
    pub async fn list_products_by_category(&self, category_id: CategoryId) -> Result<Vec<Product>> {
        if self.store.get_category(category_id).await?.is_none() {
            return Err(DomainError::not_found("category", category_id));
        }
        Ok(self.store.products_in_category_tree(category_id).await?)
    }

    /// Creates a category, verifying its parent (when given) exists.
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_category(&self, new: NewCategory) -> Result<Category> {
        if new.name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "category name must not be empty".to_string(),
            ));
        }

        if let Some(parent_id) = new.parent_id
            && self.store.get_category(parent_id).await?.is_none()
        {
            return Err(DomainError::not_found("category", parent_id));
        }

        match self.store.insert_category(new).await {
            Ok(category) => Ok(category),
            Err(StoreError::UniqueViolation { .. }) => Err(DomainError::AlreadyExists("category")),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads a category, failing with `NotFound` when absent.
    #[tracing::instrument(skip(self))]
    pub async fn get_category(&self, id: CategoryId) -> Result<Category> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| DomainError::not_found("category", id))
    }

    /// Returns a page of categories in insertion order.
    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self, offset: i64, limit: i64) -> Result<Vec<Category>> {
        validate_page(offset, limit)?;
        Ok(self.store.list_categories(offset, limit).await?)
    }
}

fn validate_page(offset: i64, limit: i64) -> Result<()> {
    if offset < 0 {
        return Err(DomainError::InvalidInput(
            "offset must not be negative".to_string(),
        ));
    }
    if limit < 1 {
        return Err(DomainError::InvalidInput(
            "limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_product(new: &NewProduct) -> Result<()> {
    if new.sku.trim().is_empty() {
        return Err(DomainError::InvalidInput(
            "sku must not be empty".to_string(),
        ));
    }
    if new.name.trim().is_empty() {
        return Err(DomainError::InvalidInput(
            "product name must not be empty".to_string(),
        ));
    }
    if new.price.is_negative() {
        return Err(DomainError::InvalidInput(
            "price must not be negative".to_string(),
        ));
    }
    if new.discount_price.is_some_and(|p| p.is_negative()) {
        return Err(DomainError::InvalidInput(
            "discount price must not be negative".to_string(),
        ));
    }
    if new.stock < 0 {
        return Err(DomainError::InvalidInput(
            "stock must not be negative".to_string(),
        ));
    }
    Ok(())
}
