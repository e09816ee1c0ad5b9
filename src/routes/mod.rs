//! Route definitions for the gold shop API

mod customer;
mod gold_loan;
mod inventory;
mod invoice;

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::handlers::{health_check, root};
use crate::middleware;
use crate::state::AppState;

pub use customer::customer_routes;
pub use gold_loan::gold_loan_routes;
pub use inventory::inventory_routes;
pub use invoice::invoice_routes;

/// Build the full application router with middleware applied
pub fn app(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(customer_routes())
        .merge(invoice_routes())
        .merge(gold_loan_routes())
        .merge(inventory_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(configure_cors(config.cors_allowed_origins.as_deref()))
                .layer(axum::middleware::from_fn(middleware::request_tracing))
                .layer(axum::middleware::from_fn(middleware::security_headers)),
        );

    if config.environment.is_production() {
        router.layer(axum::middleware::from_fn(middleware::hsts_header))
    } else {
        router
    }
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
