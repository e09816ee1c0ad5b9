//! API handlers for the gold shop backend

pub mod customer;
mod extract;
pub mod gold_loan;
pub mod inventory;
pub mod invoice;
pub mod system;

pub use customer::*;
pub use extract::{ApiJson, ApiQuery};
pub use gold_loan::*;
pub use inventory::*;
pub use invoice::*;
pub use system::*;
