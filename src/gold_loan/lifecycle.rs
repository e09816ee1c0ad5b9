//! Loan origination and status changes
//!
//! Derived fields (end date, first due date, outstanding amount) are
//! computed here once, when the loan is drafted, instead of on every write.

use chrono::{DateTime, Months, Utc};
use validator::Validate;

use crate::error::ApiError;
use crate::gold_loan::model::{CreateLoanRequest, GoldLoan, LoanStatus, PledgedItem};
use crate::gold_loan::valuation::CollateralValuation;

/// Add calendar months, clamping to the last day of the target month
pub fn add_months(date: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, ApiError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| ApiError::ValidationError("Date is out of range".to_string()))
}

/// Schedule of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanTerms {
    pub start_date: DateTime<Utc>,
    pub duration: i32,
    pub end_date: DateTime<Utc>,
    pub first_payment_due: DateTime<Utc>,
}

impl LoanTerms {
    pub fn new(start_date: DateTime<Utc>, duration: i32) -> Result<Self, ApiError> {
        let months = u32::try_from(duration)
            .ok()
            .filter(|m| *m >= 1)
            .ok_or_else(|| {
                ApiError::ValidationError("Duration must be at least one month".to_string())
            })?;

        Ok(Self {
            start_date,
            duration,
            end_date: add_months(start_date, months)?,
            first_payment_due: add_months(start_date, 1)?,
        })
    }
}

/// A validated loan ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct LoanDraft {
    pub customer_id: uuid::Uuid,
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub terms: LoanTerms,
    pub items: Vec<PledgedItem>,
    pub valuation: CollateralValuation,
}

impl LoanDraft {
    /// Validate a request, value its collateral and compute its schedule
    pub fn new(request: CreateLoanRequest, now: DateTime<Utc>) -> Result<Self, ApiError> {
        request.validate()?;

        let valuation = CollateralValuation::appraise(&request.items)?;
        valuation.check_loan_amount(request.loan_amount)?;

        let terms = LoanTerms::new(request.start_date.unwrap_or(now), request.duration)?;

        Ok(Self {
            customer_id: request.customer_id,
            loan_amount: request.loan_amount,
            interest_rate: request.interest_rate,
            terms,
            items: request.items,
            valuation,
        })
    }

    /// Outstanding principal of a new loan
    pub fn remaining_amount(&self) -> f64 {
        self.loan_amount
    }
}

impl GoldLoan {
    /// Set the status explicitly. Any of the four statuses may be set from
    /// any current status.
    pub fn set_status(&mut self, status: LoanStatus, now: DateTime<Utc>) -> LoanStatus {
        let previous = self.status;
        self.status = status;
        self.updated_at = now;
        previous
    }

    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }
}
