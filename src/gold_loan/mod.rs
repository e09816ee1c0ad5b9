//! Gold-backed loans
//!
//! Collateral valuation and repayment accounting are pure functions over
//! [`GoldLoan`]; [`GoldLoanService`] persists their results.

pub mod lifecycle;
pub mod model;
pub mod repayment;
pub mod service;
pub mod valuation;

pub use lifecycle::{add_months, LoanDraft, LoanTerms};
pub use model::*;
pub use repayment::{monthly_interest, RepaymentSplit};
pub use service::GoldLoanService;
pub use valuation::{CollateralValuation, LOAN_TO_VALUE_RATIO};
