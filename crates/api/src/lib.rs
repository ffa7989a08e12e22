//! HTTP API server with observability for the shop backend.
//!
//! Provides REST endpoints for the catalog, per-user carts, and orders,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use domain::{CartService, CatalogService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::ShopStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ShopStore> {
    pub catalog: CatalogService<S>,
    pub cart: CartService<S>,
    pub orders: OrderService<S>,
    pub store: S,
}

/// Wires the services around a single store instance.
pub fn create_state<S: ShopStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        catalog: CatalogService::new(store.clone()),
        cart: CartService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        store,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ShopStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/users", post(routes::users::create::<S>))
        .route("/catalog/products", post(routes::catalog::create_product::<S>))
        .route("/catalog/products", get(routes::catalog::list_products::<S>))
        .route("/catalog/products/{id}", get(routes::catalog::get_product::<S>))
        .route(
            "/catalog/products/{id}",
            patch(routes::catalog::update_product::<S>),
        )
        .route(
            "/catalog/categories",
            post(routes::catalog::create_category::<S>),
        )
        .route(
            "/catalog/categories",
            get(routes::catalog::list_categories::<S>),
        )
        .route(
            "/catalog/categories/{id}",
            get(routes::catalog::get_category::<S>),
        )
        .route(
            "/catalog/categories/{id}/products",
            get(routes::catalog::products_by_category::<S>),
        )
        .route("/cart/{user_id}", get(routes::cart::list::<S>))
        .route("/cart/{user_id}/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/{user_id}/items/{line_id}",
            patch(routes::cart::update_item::<S>),
        )
        .route(
            "/cart/{user_id}/items/{line_id}",
            delete(routes::cart::remove_item::<S>),
        )
        .route("/cart/{user_id}/checkout", post(routes::orders::checkout::<S>))
        .route("/users/{user_id}/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", post(routes::orders::update_status::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
