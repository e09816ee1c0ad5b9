//! Gold loan route definitions

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn gold_loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/gold-loans", get(list_gold_loans).post(create_gold_loan))
        .route("/api/gold-loans/:id", get(get_gold_loan))
        .route("/api/gold-loans/:id/repayment", post(record_repayment))
        .route("/api/gold-loans/:id/status", put(update_gold_loan_status))
}
