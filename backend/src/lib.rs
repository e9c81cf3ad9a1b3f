//! Resto Back-Office Platform backend
//!
//! Batch costing, variance reconciliation and financial reporting for
//! restaurant inventory: P&L, food cost, inventory valuation, negative
//! inventory and product variance.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod datasource;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

use datasource::AnalyticsDataSource;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn AnalyticsDataSource>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Resto Back-Office Platform API v1.0"
}
