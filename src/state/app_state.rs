//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::customer::CustomerService;
use crate::gold_loan::GoldLoanService;
use crate::inventory::InventoryService;
use crate::invoice::InvoiceService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub customer_service: Arc<CustomerService>,
    pub invoice_service: Arc<InvoiceService>,
    pub gold_loan_service: Arc<GoldLoanService>,
    pub inventory_service: Arc<InventoryService>,
}

impl AppState {
    /// Wire every service onto one pool
    pub fn new(db_pool: PgPool) -> Self {
        let customers = CustomerService::new(db_pool.clone());

        Self {
            invoice_service: Arc::new(InvoiceService::new(db_pool.clone(), customers.clone())),
            gold_loan_service: Arc::new(GoldLoanService::new(db_pool.clone(), customers.clone())),
            inventory_service: Arc::new(InventoryService::new(db_pool.clone())),
            customer_service: Arc::new(customers),
            db_pool,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for Arc<CustomerService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.customer_service.clone()
    }
}

impl FromRef<AppState> for Arc<InvoiceService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.invoice_service.clone()
    }
}

impl FromRef<AppState> for Arc<GoldLoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.gold_loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<InventoryService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.inventory_service.clone()
    }
}
