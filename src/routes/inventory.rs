//! Inventory route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/api/inventory", get(list_inventory).post(create_inventory_item))
        .route("/api/inventory/alerts/stock", get(get_stock_alerts))
        .route("/api/inventory/stats/overview", get(get_inventory_stats))
        .route(
            "/api/inventory/:id",
            get(get_inventory_item).put(update_inventory_item),
        )
        .route("/api/inventory/:id/transaction", post(record_stock_transaction))
}
