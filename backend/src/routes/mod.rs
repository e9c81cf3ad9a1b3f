//! Route definitions for the Resto Back-Office Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/reports", report_routes())
        .nest("/batches", batch_routes())
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/pl", get(handlers::get_pl_report))
        .route("/food-cost", get(handlers::get_food_cost_dashboard))
        .route("/cogs", get(handlers::get_cogs_breakdown))
        .route("/valuation", get(handlers::get_inventory_valuation))
        .route(
            "/negative-inventory",
            get(handlers::get_negative_inventory_report),
        )
        .route(
            "/negative-inventory/csv",
            get(handlers::export_negative_inventory_csv),
        )
        .route("/variance", get(handlers::get_variance_report))
        .route("/variance/v2", get(handlers::get_variance_report_v2))
        .route("/variance/csv", get(handlers::export_variance_csv))
        .route(
            "/variance/:product_id",
            get(handlers::get_product_variance_detail),
        )
}

fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/:batch_id/reconcile", post(handlers::reconcile_batch))
        .route("/:batch_id/correction", post(handlers::correct_batch_balance))
}
