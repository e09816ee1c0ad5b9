//! Repayment accounting
//!
//! Interest is simple interest on the original loan amount, not on the
//! declining balance. Each payment covers one month of interest first and
//! the rest reduces principal.

use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::gold_loan::lifecycle::add_months;
use crate::gold_loan::model::{GoldLoan, LoanStatus, Repayment};

/// One month of interest on `loan_amount` at an annual `interest_rate` percent
pub fn monthly_interest(loan_amount: f64, interest_rate: f64) -> f64 {
    (loan_amount * interest_rate) / (12.0 * 100.0)
}

/// How a payment divides between interest and principal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepaymentSplit {
    pub interest_paid: f64,
    pub principal_paid: f64,
}

impl RepaymentSplit {
    pub fn new(monthly_interest: f64, amount: f64) -> Self {
        let interest_paid = monthly_interest.min(amount);
        Self {
            interest_paid,
            principal_paid: amount - interest_paid,
        }
    }
}

impl GoldLoan {
    /// Apply a payment of `amount` effective at `date`.
    ///
    /// Appends the repayment to the history, lowers `remaining_amount`,
    /// closes the loan once the balance reaches zero and moves the next due
    /// date one month past `date`. A loan that is not active is left
    /// untouched.
    pub fn apply_repayment(
        &mut self,
        amount: f64,
        date: DateTime<Utc>,
    ) -> Result<Repayment, ApiError> {
        if !self.is_active() {
            return Err(ApiError::Conflict(format!(
                "Cannot add repayment to {} loan",
                self.status
            )));
        }
        if amount.is_nan() || amount <= 0.0 {
            return Err(ApiError::ValidationError(
                "Repayment amount must be greater than 0".to_string(),
            ));
        }

        let next_payment_due = add_months(date, 1)?;
        let split = RepaymentSplit::new(monthly_interest(self.loan_amount, self.interest_rate), amount);
        let remaining_balance = self.remaining_amount - split.principal_paid;

        let repayment = Repayment {
            date,
            amount,
            interest_paid: split.interest_paid,
            principal_paid: split.principal_paid,
            remaining_balance,
        };

        self.repayments.push(repayment.clone());
        self.remaining_amount = remaining_balance;
        if remaining_balance <= 0.0 {
            self.status = LoanStatus::Closed;
        }
        self.next_payment_due = Some(next_payment_due);
        self.updated_at = Utc::now();

        Ok(repayment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn loan(loan_amount: f64, interest_rate: f64) -> GoldLoan {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        GoldLoan {
            id: Uuid::new_v4(),
            loan_number: "GL000001".to_string(),
            customer_id: Uuid::new_v4(),
            loan_amount,
            interest_rate,
            start_date: start,
            duration: 12,
            end_date: Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap(),
            total_items_value: loan_amount / 0.8,
            remaining_amount: loan_amount,
            next_payment_due: Some(Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap()),
            status: LoanStatus::Active,
            items: Vec::new(),
            repayments: Vec::new(),
            customer: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_monthly_interest_uses_annual_percent() {
        assert_eq!(monthly_interest(100_000.0, 12.0), 1000.0);
        assert_eq!(monthly_interest(50_000.0, 0.0), 0.0);
    }

    #[test]
    fn test_split_covers_interest_first() {
        assert_eq!(
            RepaymentSplit::new(1000.0, 2000.0),
            RepaymentSplit {
                interest_paid: 1000.0,
                principal_paid: 1000.0
            }
        );
        assert_eq!(
            RepaymentSplit::new(1000.0, 600.0),
            RepaymentSplit {
                interest_paid: 600.0,
                principal_paid: 0.0
            }
        );
    }

    #[test]
    fn test_repayment_splits_and_reduces_balance() {
        let mut loan = loan(100_000.0, 12.0);
        let date = Utc.with_ymd_and_hms(2024, 2, 5, 0, 0, 0).unwrap();

        let repayment = loan.apply_repayment(2000.0, date).unwrap();

        assert_eq!(repayment.interest_paid, 1000.0);
        assert_eq!(repayment.principal_paid, 1000.0);
        assert_eq!(repayment.remaining_balance, 99_000.0);
        assert_eq!(loan.remaining_amount, 99_000.0);
        assert_eq!(loan.repayments, vec![repayment]);
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(
            loan.next_payment_due,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_interest_stays_on_original_principal() {
        let mut loan = loan(100_000.0, 12.0);
        let date = Utc::now();
        loan.apply_repayment(51_000.0, date).unwrap();
        assert_eq!(loan.remaining_amount, 50_000.0);

        let second = loan.apply_repayment(2000.0, date).unwrap();
        assert_eq!(second.interest_paid, 1000.0);
    }

    #[test]
    fn test_payment_below_interest_leaves_balance() {
        let mut loan = loan(100_000.0, 12.0);
        let repayment = loan.apply_repayment(400.0, Utc::now()).unwrap();
        assert_eq!(repayment.interest_paid, 400.0);
        assert_eq!(repayment.principal_paid, 0.0);
        assert_eq!(loan.remaining_amount, 100_000.0);
    }

    #[test]
    fn test_loan_closes_when_balance_reaches_zero() {
        let mut loan = loan(10_000.0, 12.0);
        let date = Utc::now();

        loan.apply_repayment(5100.0, date).unwrap();
        assert_eq!(loan.status, LoanStatus::Active);

        let last = loan.apply_repayment(5100.0, date).unwrap();
        assert_eq!(last.remaining_balance, 0.0);
        assert_eq!(loan.status, LoanStatus::Closed);

        let err = loan.apply_repayment(100.0, date).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(loan.repayments.len(), 2);
    }

    #[test]
    fn test_overpayment_closes_with_negative_balance() {
        let mut loan = loan(10_000.0, 12.0);
        let repayment = loan.apply_repayment(20_000.0, Utc::now()).unwrap();
        assert_eq!(repayment.remaining_balance, -9_900.0);
        assert_eq!(loan.status, LoanStatus::Closed);
    }

    #[test]
    fn test_non_active_loan_is_left_unmodified() {
        for status in [LoanStatus::Closed, LoanStatus::Defaulted, LoanStatus::Renewed] {
            let mut loan = loan(100_000.0, 12.0);
            loan.status = status;
            let before = loan.clone();

            let err = loan.apply_repayment(2000.0, Utc::now()).unwrap_err();

            assert_eq!(
                err.to_string(),
                format!("Conflict: Cannot add repayment to {} loan", status)
            );
            assert_eq!(loan.remaining_amount, before.remaining_amount);
            assert_eq!(loan.repayments, before.repayments);
            assert_eq!(loan.next_payment_due, before.next_payment_due);
            assert_eq!(loan.updated_at, before.updated_at);
        }
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut loan = loan(100_000.0, 12.0);
        assert!(matches!(
            loan.apply_repayment(0.0, Utc::now()),
            Err(ApiError::ValidationError(_))
        ));
        assert!(loan.repayments.is_empty());
    }
}
