//! Gold shop backend library
//!
//! Customer records, invoicing with customer dues, gold loans secured by
//! pledged items, and inventory tracking over PostgreSQL.

pub mod config;
pub mod customer;
pub mod db;
pub mod error;
pub mod gold_loan;
pub mod handlers;
pub mod inventory;
pub mod invoice;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod sequence;
pub mod state;
