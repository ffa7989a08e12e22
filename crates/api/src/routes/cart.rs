//! Per-user cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CartLineId, ProductId, UserId};
use serde::Deserialize;
use store::{CartLine, ShopStore};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// GET /cart/:user_id — the user's cart lines.
#[tracing::instrument(skip(state))]
pub async fn list<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<CartLine>>, ApiError> {
    Ok(Json(state.cart.list_cart(user_id).await?))
}

/// POST /cart/:user_id/items — add a product, snapshotting its price.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<UserId>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartLine>), ApiError> {
    let line = state
        .cart
        .add_item(user_id, req.product_id, req.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// PATCH /cart/:user_id/items/:line_id — change a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn update_item<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((user_id, line_id)): Path<(UserId, CartLineId)>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartLine>, ApiError> {
    let line = state
        .cart
        .update_item(user_id, line_id, req.quantity)
        .await?;
    Ok(Json(line))
}

/// DELETE /cart/:user_id/items/:line_id — remove a line.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((user_id, line_id)): Path<(UserId, CartLineId)>,
) -> Result<StatusCode, ApiError> {
    state.cart.remove_item(user_id, line_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
