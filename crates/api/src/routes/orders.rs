//! Order endpoints and the checkout trigger.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};
use store::{Checkout, Order, OrderLine, OrderStatus, ShopStore};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Serialize)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// POST /cart/:user_id/checkout — convert the cart into an order.
#[tracing::instrument(skip(state))]
pub async fn checkout<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<UserId>,
) -> Result<(StatusCode, Json<Checkout>), ApiError> {
    let checkout = state.orders.checkout(user_id).await?;
    Ok((StatusCode::CREATED, Json(checkout)))
}

/// GET /users/:user_id/orders — the user's orders, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list_orders(user_id).await?))
}

/// GET /orders/:id — an order with its lines.
#[tracing::instrument(skip(state))]
pub async fn get<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithLines>, ApiError> {
    let (order, lines) = state.orders.get_order_with_lines(id).await?;
    Ok(Json(OrderWithLines { order, lines }))
}

/// POST /orders/:id/status — move an order to a new status.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.update_status(id, req.status).await?))
}
