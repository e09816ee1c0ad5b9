//! Gold loan origination and repayment scenarios
//!
//! These run entirely in memory through the public loan API.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use goldshop_server::error::ApiError;
use goldshop_server::gold_loan::{
    CreateLoanRequest, GoldLoan, LoanDraft, LoanStatus, PledgedItem, PledgedItemType,
};

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap()
}

fn chain(market_value: f64) -> PledgedItem {
    PledgedItem {
        item_type: PledgedItemType::Gold,
        description: Some("22K chain".to_string()),
        weight: 20.0,
        purity: 22.0,
        market_value,
    }
}

fn request(loan_amount: f64, interest_rate: f64, items: Vec<PledgedItem>) -> CreateLoanRequest {
    CreateLoanRequest {
        customer_id: Uuid::new_v4(),
        loan_amount,
        interest_rate,
        duration: 12,
        start_date: Some(at(2024, 1, 31)),
        items,
    }
}

/// Turn a draft into the record a fresh insert would return
fn originate(draft: LoanDraft) -> GoldLoan {
    let now = draft.terms.start_date;
    GoldLoan {
        id: Uuid::new_v4(),
        loan_number: "GL000001".to_string(),
        customer_id: draft.customer_id,
        loan_amount: draft.loan_amount,
        interest_rate: draft.interest_rate,
        start_date: draft.terms.start_date,
        duration: draft.terms.duration,
        end_date: draft.terms.end_date,
        total_items_value: draft.valuation.total_items_value,
        remaining_amount: draft.remaining_amount(),
        next_payment_due: Some(draft.terms.first_payment_due),
        status: LoanStatus::Active,
        items: draft.items,
        repayments: Vec::new(),
        customer: None,
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// Origination
// ============================================================================

#[test]
fn test_loan_at_full_loan_to_value_is_accepted() {
    let draft = LoanDraft::new(request(100_000.0, 12.0, vec![chain(125_000.0)]), Utc::now())
        .expect("80% of collateral value is allowed");

    assert_eq!(draft.valuation.total_items_value, 125_000.0);
    assert_eq!(draft.valuation.max_loan_amount, 100_000.0);
    assert_eq!(draft.remaining_amount(), 100_000.0);
}

#[test]
fn test_over_leveraged_loan_reports_limits() {
    let err = LoanDraft::new(request(100_001.0, 12.0, vec![chain(125_000.0)]), Utc::now())
        .unwrap_err();

    match err {
        ApiError::ValidationFailed { details, .. } => {
            assert_eq!(details["maxLoanAmount"], 100_000.0);
            assert_eq!(details["totalItemsValue"], 125_000.0);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_collateral_value_sums_all_items() {
    let draft = LoanDraft::new(
        request(60_000.0, 12.0, vec![chain(50_000.0), chain(25_000.0)]),
        Utc::now(),
    )
    .unwrap();

    assert_eq!(draft.valuation.total_items_value, 75_000.0);
    assert_eq!(draft.items.len(), 2);
}

#[test]
fn test_loan_without_items_is_rejected() {
    let result = LoanDraft::new(request(1_000.0, 12.0, Vec::new()), Utc::now());
    match result {
        Err(err @ ApiError::ValidationFailed { .. }) => {
            assert!(err.details().is_some_and(|d| d.get("items").is_some()));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_schedule_clamps_to_month_end() {
    let draft = LoanDraft::new(request(10_000.0, 12.0, vec![chain(20_000.0)]), Utc::now())
        .unwrap();

    // Jan 31 + 1 month lands on the last day of a leap February
    assert_eq!(draft.terms.first_payment_due, at(2024, 2, 29));
    assert_eq!(draft.terms.end_date, at(2025, 1, 31));
}

// ============================================================================
// Repayment
// ============================================================================

#[test]
fn test_payment_covers_interest_before_principal() {
    let mut loan = originate(
        LoanDraft::new(request(100_000.0, 12.0, vec![chain(125_000.0)]), Utc::now()).unwrap(),
    );

    let repayment = loan.apply_repayment(2_000.0, at(2024, 3, 5)).unwrap();

    assert_eq!(repayment.interest_paid, 1_000.0);
    assert_eq!(repayment.principal_paid, 1_000.0);
    assert_eq!(loan.remaining_amount, 99_000.0);
    assert_eq!(loan.next_payment_due, Some(at(2024, 4, 5)));
    assert_eq!(loan.status, LoanStatus::Active);
}

#[test]
fn test_payment_below_interest_leaves_principal() {
    let mut loan = originate(
        LoanDraft::new(request(100_000.0, 12.0, vec![chain(125_000.0)]), Utc::now()).unwrap(),
    );

    let repayment = loan.apply_repayment(600.0, at(2024, 3, 5)).unwrap();

    assert_eq!(repayment.interest_paid, 600.0);
    assert_eq!(repayment.principal_paid, 0.0);
    assert_eq!(loan.remaining_amount, 100_000.0);
}

#[test]
fn test_interest_stays_on_original_principal() {
    let mut loan = originate(
        LoanDraft::new(request(100_000.0, 12.0, vec![chain(125_000.0)]), Utc::now()).unwrap(),
    );

    loan.apply_repayment(51_000.0, at(2024, 2, 28)).unwrap();
    assert_eq!(loan.remaining_amount, 50_000.0);

    let second = loan.apply_repayment(2_000.0, at(2024, 3, 28)).unwrap();
    assert_eq!(second.interest_paid, 1_000.0);
    assert_eq!(loan.remaining_amount, 49_000.0);
}

#[test]
fn test_loan_closes_and_rejects_further_payments() {
    let mut loan = originate(
        LoanDraft::new(request(10_000.0, 12.0, vec![chain(20_000.0)]), Utc::now()).unwrap(),
    );

    loan.apply_repayment(6_000.0, at(2024, 2, 28)).unwrap();
    assert_eq!(loan.status, LoanStatus::Active);

    let last = loan.apply_repayment(4_200.0, at(2024, 3, 28)).unwrap();
    assert!(last.remaining_balance <= 0.0);
    assert_eq!(loan.status, LoanStatus::Closed);

    let err = loan.apply_repayment(100.0, at(2024, 4, 28)).unwrap_err();
    assert!(matches!(err, ApiError::Conflict(m) if m == "Cannot add repayment to closed loan"));
    assert_eq!(loan.repayments.len(), 2);
}

#[test]
fn test_repayment_history_keeps_running_balance() {
    let mut loan = originate(
        LoanDraft::new(request(100_000.0, 12.0, vec![chain(125_000.0)]), Utc::now()).unwrap(),
    );

    for month in 2..=4 {
        loan.apply_repayment(11_000.0, at(2024, month, 28)).unwrap();
    }

    let balances: Vec<f64> = loan.repayments.iter().map(|r| r.remaining_balance).collect();
    assert_eq!(balances, vec![90_000.0, 80_000.0, 70_000.0]);
    assert_eq!(loan.remaining_amount, 70_000.0);
}

#[test]
fn test_defaulted_loan_accepts_no_repayment() {
    let mut loan = originate(
        LoanDraft::new(request(10_000.0, 12.0, vec![chain(20_000.0)]), Utc::now()).unwrap(),
    );
    loan.set_status(LoanStatus::Defaulted, Utc::now());

    let err = loan.apply_repayment(1_000.0, at(2024, 2, 28)).unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(loan.remaining_amount, 10_000.0);
}
