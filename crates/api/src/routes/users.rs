//! User bootstrap endpoint.
//!
//! Authentication is out of scope; this endpoint exists so carts and
//! orders have an owner to hang off.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::DomainError;
use serde::Deserialize;
use store::{ShopStore, StoreError, User};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
}

/// POST /users — create a user by email.
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn create<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("invalid email".to_string()));
    }

    match state.store.create_user(email).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(StoreError::UniqueViolation { .. }) => {
            Err(DomainError::AlreadyExists("user").into())
        }
        Err(e) => Err(DomainError::from(e).into()),
    }
}
