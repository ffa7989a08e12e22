//! Catalog endpoints for products and categories.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CategoryId, ProductId};
use store::{Category, NewCategory, NewProduct, Product, ShopStore, UpdateProduct};

use super::Pagination;
use crate::AppState;
use crate::error::ApiError;

/// POST /catalog/products — create a product.
#[tracing::instrument(skip(state, new), fields(sku = %new.sku))]
pub async fn create_product<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(new): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.catalog.create_product(new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /catalog/products — page through products.
#[tracing::instrument(skip(state))]
pub async fn list_products<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.catalog.list_products(page.offset, page.limit).await?;
    Ok(Json(products))
}

/// GET /catalog/products/:id — load one product.
#[tracing::instrument(skip(state))]
pub async fn get_product<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.catalog.get_product(id).await?))
}

/// PATCH /catalog/products/:id — partially update a product.
#[tracing::instrument(skip(state, changes))]
pub async fn update_product<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
    Json(changes): Json<UpdateProduct>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.catalog.update_product(id, changes).await?))
}

/// GET /catalog/categories/:id/products — products in a category or
/// its direct children.
#[tracing::instrument(skip(state))]
pub async fn products_by_category<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products_by_category(id).await?))
}

/// POST /catalog/categories — create a category.
#[tracing::instrument(skip(state, new), fields(name = %new.name))]
pub async fn create_category<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(new): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.catalog.create_category(new).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /catalog/categories — page through categories.
#[tracing::instrument(skip(state))]
pub async fn list_categories<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = state
        .catalog
        .list_categories(page.offset, page.limit)
        .await?;
    Ok(Json(categories))
}

/// GET /catalog/categories/:id — load one category.
#[tracing::instrument(skip(state))]
pub async fn get_category<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.catalog.get_category(id).await?))
}
