//! Gold loan models
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::customer::Customer;
use crate::error::ApiError;

/// Loan status enum
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Closed,
    Defaulted,
    Renewed,
}

impl LoanStatus {
    /// Parse a status name, rejecting anything outside the four known values
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "active" => Ok(LoanStatus::Active),
            "closed" => Ok(LoanStatus::Closed),
            "defaulted" => Ok(LoanStatus::Defaulted),
            "renewed" => Ok(LoanStatus::Renewed),
            other => Err(ApiError::ValidationError(format!(
                "Invalid status '{}'. Expected one of: active, closed, defaulted, renewed",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Closed => "closed",
            LoanStatus::Defaulted => "defaulted",
            LoanStatus::Renewed => "renewed",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of pledged item
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "pledged_item_type")]
pub enum PledgedItemType {
    Gold,
    Silver,
    Diamond,
}

/// Item pledged as collateral
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PledgedItem {
    pub item_type: PledgedItemType,
    pub description: Option<String>,
    pub weight: f64,
    /// Karat for gold
    pub purity: f64,
    /// Appraised market value
    pub market_value: f64,
}

/// Repayment event. Never edited once recorded.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Repayment {
    pub date: DateTime<Utc>,
    pub amount: f64,
    pub interest_paid: f64,
    pub principal_paid: f64,
    pub remaining_balance: f64,
}

/// Gold loan model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GoldLoan {
    pub id: Uuid,
    pub loan_number: String,
    pub customer_id: Uuid,
    pub loan_amount: f64,
    /// Annual interest rate, percent
    pub interest_rate: f64,
    pub start_date: DateTime<Utc>,
    /// Months
    pub duration: i32,
    pub end_date: DateTime<Utc>,
    pub total_items_value: f64,
    /// Outstanding principal
    pub remaining_amount: f64,
    pub next_payment_due: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    #[sqlx(skip)]
    pub items: Vec<PledgedItem>,
    #[sqlx(skip)]
    pub repayments: Vec<Repayment>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new loan
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    pub customer_id: Uuid,
    #[validate(range(min = 0.0, message = "Loan amount cannot be negative"))]
    pub loan_amount: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "Interest rate must be between 0 and 100"))]
    pub interest_rate: f64,
    #[validate(range(min = 1, message = "Duration must be at least one month"))]
    pub duration: i32,
    pub start_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, message = "At least one item must be pledged"))]
    pub items: Vec<PledgedItem>,
}

/// Request to record a repayment
#[derive(Debug, Deserialize)]
pub struct RepaymentRequest {
    pub amount: f64,
    /// Effective date, defaults to now
    pub date: Option<DateTime<Utc>>,
}

/// Request to change a loan's status
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub reason: Option<String>,
}

/// Query for listing loans
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLoansQuery {
    #[serde(default, deserialize_with = "crate::models::empty_as_none")]
    pub customer_id: Option<Uuid>,
    #[serde(default, deserialize_with = "crate::models::empty_as_none")]
    pub status: Option<String>,
}
