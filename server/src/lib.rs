//! HTTP API for rangepage listings.

pub mod api;
pub mod auth;
pub mod config;

pub use api::{ApiError, ListingBody, ListingResponse};
pub use auth::{Credential, CredentialValidator, StaticCredential, StaticCredentials};
pub use config::{ConfigError, ServerConfig};

use axum::{
    Router,
    routing::{get, post},
};
use rangepage_engine::{ListingEngine, ListingProfile};
use rangepage_store::{IndexSchema, PartitionStore, TableSchema};
use std::sync::Arc;
use std::time::Duration;

/// Shared, read-only state behind every handler.
pub struct AppState {
    pub products: ListingEngine,
    pub orders: ListingEngine,
    pub product_profile: ListingProfile,
    pub restaurant_profile: ListingProfile,
    pub history_profile: ListingProfile,
    pub credentials: Arc<dyn CredentialValidator>,
    pub client_role: String,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        products: Arc<dyn PartitionStore>,
        orders: Arc<dyn PartitionStore>,
        credentials: Arc<dyn CredentialValidator>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            products: ListingEngine::new(products, config.engine.clone()),
            orders: ListingEngine::new(orders, config.engine.clone()),
            product_profile: ListingProfile::products().with_mode_policy(config.products_mode),
            restaurant_profile: ListingProfile::restaurant_orders(),
            history_profile: ListingProfile::order_history(),
            credentials,
            client_role: config.client_role.clone(),
            request_timeout: config.request_timeout(),
        }
    }
}

/// Key layout of the products table.
pub fn products_schema(table: &str) -> TableSchema {
    let layout = ListingProfile::products().layout;
    TableSchema::new(table, &layout.partition_key, &layout.sort_key)
}

/// Key layout of the orders table and its customer index.
pub fn orders_schema(table: &str) -> TableSchema {
    let venue = ListingProfile::restaurant_orders().layout;
    let history = ListingProfile::order_history();
    let index = history.index.as_deref().unwrap_or("by_usuario_v2");
    TableSchema::new(table, &venue.partition_key, &venue.sort_key).with_index(IndexSchema::new(
        index,
        &history.layout.partition_key,
        &history.layout.sort_key,
    ))
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(api::health))
        .route("/api/v1/products/list", post(api::list_products))
        .route("/api/v1/orders/restaurant", post(api::list_restaurant_orders))
        .route("/api/v1/orders/history", post(api::list_order_history))
        .with_state(state)
}
