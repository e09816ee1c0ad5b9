//! Gold loan service layer - persistence for the loan lifecycle

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::customer::service::lock_customer;
use crate::customer::CustomerService;
use crate::error::ApiError;
use crate::gold_loan::lifecycle::LoanDraft;
use crate::gold_loan::model::{
    CreateLoanRequest, GoldLoan, ListLoansQuery, LoanStatus, PledgedItem, Repayment,
    RepaymentRequest, UpdateStatusRequest,
};
use crate::sequence::{format_code, reserve_next, Sequence, LOAN_NUMBER_PREFIX};

#[derive(sqlx::FromRow)]
struct PledgedItemRow {
    loan_id: Uuid,
    #[sqlx(flatten)]
    item: PledgedItem,
}

#[derive(sqlx::FromRow)]
struct RepaymentRow {
    loan_id: Uuid,
    #[sqlx(flatten)]
    repayment: Repayment,
}

/// Gold loan service for managing loan lifecycle
#[derive(Clone)]
pub struct GoldLoanService {
    db_pool: PgPool,
    customers: CustomerService,
}

impl GoldLoanService {
    pub fn new(db_pool: PgPool, customers: CustomerService) -> Self {
        Self { db_pool, customers }
    }

    /// Originate a loan against pledged collateral
    pub async fn create_loan(&self, request: CreateLoanRequest) -> Result<GoldLoan, ApiError> {
        let now = Utc::now();
        let draft = LoanDraft::new(request, now)?;

        let mut tx = self.db_pool.begin().await?;

        lock_customer(&mut *tx, draft.customer_id).await?;
        let sequence = reserve_next(&mut *tx, Sequence::GoldLoan).await?;
        let loan_number = format_code(LOAN_NUMBER_PREFIX, sequence);

        let loan = sqlx::query_as::<_, GoldLoan>(
            r#"
            INSERT INTO gold_loans (
                loan_number, customer_id, loan_amount, interest_rate, start_date,
                duration, end_date, total_items_value, remaining_amount,
                next_payment_due, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&loan_number)
        .bind(draft.customer_id)
        .bind(draft.loan_amount)
        .bind(draft.interest_rate)
        .bind(draft.terms.start_date)
        .bind(draft.terms.duration)
        .bind(draft.terms.end_date)
        .bind(draft.valuation.total_items_value)
        .bind(draft.remaining_amount())
        .bind(draft.terms.first_payment_due)
        .bind(LoanStatus::Active)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in draft.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO gold_loan_items (loan_id, position, item_type, description, weight, purity, market_value)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(loan.id)
            .bind(position as i32)
            .bind(item.item_type)
            .bind(&item.description)
            .bind(item.weight)
            .bind(item.purity)
            .bind(item.market_value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            loan_id = %loan.id,
            loan_number = %loan.loan_number,
            customer_id = %loan.customer_id,
            amount = loan.loan_amount,
            collateral_value = loan.total_items_value,
            "Gold loan created"
        );

        self.get_loan(loan.id).await
    }

    /// Get loan by ID
    pub async fn get_loan(&self, id: Uuid) -> Result<GoldLoan, ApiError> {
        let loan = sqlx::query_as::<_, GoldLoan>("SELECT * FROM gold_loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        let mut loans = vec![loan];
        self.attach_details(&mut loans).await?;

        Ok(loans.remove(0))
    }

    /// List loans with filters, newest first
    pub async fn list_loans(&self, query: ListLoansQuery) -> Result<Vec<GoldLoan>, ApiError> {
        let status = query.status.as_deref().map(LoanStatus::parse).transpose()?;

        let mut query_builder = sqlx::QueryBuilder::new("SELECT * FROM gold_loans WHERE 1=1");

        if let Some(customer_id) = query.customer_id {
            query_builder.push(" AND customer_id = ");
            query_builder.push_bind(customer_id);
        }

        if let Some(status) = status {
            query_builder.push(" AND status = ");
            query_builder.push_bind(status);
        }

        query_builder.push(" ORDER BY created_at DESC");

        let mut loans = query_builder
            .build_query_as::<GoldLoan>()
            .fetch_all(&self.db_pool)
            .await?;

        self.attach_details(&mut loans).await?;

        Ok(loans)
    }

    /// Record a repayment. The loan row stays locked until the new balance,
    /// status, due date and history entry are written.
    pub async fn record_repayment(
        &self,
        id: Uuid,
        request: RepaymentRequest,
    ) -> Result<GoldLoan, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let mut loan =
            sqlx::query_as::<_, GoldLoan>("SELECT * FROM gold_loans WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        let date = request.date.unwrap_or_else(Utc::now);
        let repayment = loan.apply_repayment(request.amount, date)?;

        sqlx::query(
            r#"
            INSERT INTO gold_loan_repayments (
                loan_id, date, amount, interest_paid, principal_paid, remaining_balance
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(loan.id)
        .bind(repayment.date)
        .bind(repayment.amount)
        .bind(repayment.interest_paid)
        .bind(repayment.principal_paid)
        .bind(repayment.remaining_balance)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE gold_loans
            SET remaining_amount = $2, status = $3, next_payment_due = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(loan.id)
        .bind(loan.remaining_amount)
        .bind(loan.status)
        .bind(loan.next_payment_due)
        .bind(loan.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            loan_number = %loan.loan_number,
            amount = repayment.amount,
            interest_paid = repayment.interest_paid,
            principal_paid = repayment.principal_paid,
            remaining = repayment.remaining_balance,
            "Repayment applied"
        );
        if loan.status == LoanStatus::Closed {
            tracing::info!(loan_number = %loan.loan_number, "Gold loan closed");
        }

        self.get_loan(id).await
    }

    /// Set a loan's status (renewal, default, manual close)
    pub async fn update_status(
        &self,
        id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<GoldLoan, ApiError> {
        let status = LoanStatus::parse(&request.status)?;

        let mut tx = self.db_pool.begin().await?;

        let mut loan =
            sqlx::query_as::<_, GoldLoan>("SELECT * FROM gold_loans WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        let previous = loan.set_status(status, Utc::now());

        sqlx::query("UPDATE gold_loans SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(loan.id)
            .bind(loan.status)
            .bind(loan.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            loan_number = %loan.loan_number,
            from = %previous,
            to = %loan.status,
            reason = request.reason.as_deref().unwrap_or(""),
            "Gold loan status changed"
        );

        self.get_loan(id).await
    }

    async fn attach_details(&self, loans: &mut [GoldLoan]) -> Result<(), ApiError> {
        if loans.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = loans.iter().map(|l| l.id).collect();

        let item_rows = sqlx::query_as::<_, PledgedItemRow>(
            r#"
            SELECT loan_id, item_type, description, weight, purity, market_value
            FROM gold_loan_items
            WHERE loan_id = ANY($1)
            ORDER BY position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db_pool)
        .await?;

        let repayment_rows = sqlx::query_as::<_, RepaymentRow>(
            r#"
            SELECT loan_id, date, amount, interest_paid, principal_paid, remaining_balance
            FROM gold_loan_repayments
            WHERE loan_id = ANY($1)
            ORDER BY seq
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db_pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<PledgedItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.loan_id).or_default().push(row.item);
        }

        let mut repayments: HashMap<Uuid, Vec<Repayment>> = HashMap::new();
        for row in repayment_rows {
            repayments.entry(row.loan_id).or_default().push(row.repayment);
        }

        let customer_ids: Vec<Uuid> = loans.iter().map(|l| l.customer_id).collect();
        let customers = self.customers.get_customers(&customer_ids).await?;

        for loan in loans.iter_mut() {
            loan.items = items.remove(&loan.id).unwrap_or_default();
            loan.repayments = repayments.remove(&loan.id).unwrap_or_default();
            loan.customer = customers.get(&loan.customer_id).cloned();
        }

        Ok(())
    }
}
