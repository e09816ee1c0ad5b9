//! Customer profiles and their billing ledger

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Paid amount that earns one loyalty point
pub const LOYALTY_POINT_UNIT: f64 = 100.0;

/// Customer gender
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "gender")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Customer profile
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub notes: Option<String>,
    pub loyalty_points: i64,
    /// Outstanding dues across all invoices
    pub total_due: f64,
    #[sqlx(skip)]
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
}

/// One invoice in a customer's billing history
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(skip)]
    pub customer_id: Uuid,
    pub invoice_id: Uuid,
    pub date: DateTime<Utc>,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub due_amount: f64,
}

/// Request to create a customer
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[validate(custom = "validate_name")]
    pub name: String,
    #[validate(custom = "validate_mobile")]
    pub mobile: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub notes: Option<String>,
}

impl CreateCustomerRequest {
    /// Trim text fields, lower-case the email and drop blank optionals
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            email: normalize_email(self.email),
            address: trim_optional(self.address),
            dob: self.dob,
            gender: self.gender,
            notes: trim_optional(self.notes),
        }
    }
}

/// Partial customer update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[validate(custom = "validate_name")]
    pub name: Option<String>,
    #[validate(custom = "validate_mobile")]
    pub mobile: Option<String>,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub notes: Option<String>,
}

impl UpdateCustomerRequest {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
            mobile: self.mobile.map(|m| m.trim().to_string()),
            email: normalize_email(self.email),
            address: trim_optional(self.address),
            dob: self.dob,
            gender: self.gender,
            notes: trim_optional(self.notes),
        }
    }
}

/// Query for listing customers
#[derive(Debug, Default, Deserialize)]
pub struct CustomerFilter {
    #[serde(default, deserialize_with = "crate::models::empty_as_none")]
    pub mobile: Option<String>,
}

/// Loyalty points earned by a cumulative paid amount
pub fn loyalty_points_for(paid_amount: f64) -> i64 {
    if paid_amount <= 0.0 {
        return 0;
    }
    (paid_amount / LOYALTY_POINT_UNIT).floor() as i64
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Name is required".into());
        return Err(err);
    }
    Ok(())
}

fn validate_mobile(mobile: &str) -> Result<(), ValidationError> {
    let mobile = mobile.trim();
    if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("mobile");
        err.message = Some("Mobile number must be exactly 10 digits".into());
        return Err(err);
    }
    Ok(())
}

fn normalize_email(email: Option<String>) -> Option<String> {
    trim_optional(email).map(|e| e.to_lowercase())
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
