use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::customer::model::{
    CreateCustomerRequest, Customer, CustomerFilter, HistoryEntry, UpdateCustomerRequest,
};
use crate::error::ApiError;

#[derive(Clone)]
pub struct CustomerService {
    db_pool: PgPool,
}

impl CustomerService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, ApiError> {
        let request = request.normalized();
        request.validate()?;

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, mobile, email, address, dob, gender, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.mobile)
        .bind(&request.email)
        .bind(&request.address)
        .bind(request.dob)
        .bind(request.gender)
        .bind(&request.notes)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(customer_id = %customer.id, "Customer created");

        Ok(customer)
    }

    pub async fn list_customers(&self, filter: CustomerFilter) -> Result<Vec<Customer>, ApiError> {
        let mut query_builder = sqlx::QueryBuilder::new("SELECT * FROM customers WHERE 1=1");

        if let Some(mobile) = filter.mobile {
            query_builder.push(" AND mobile = ");
            query_builder.push_bind(mobile.trim().to_string());
        }

        query_builder.push(" ORDER BY created_at");

        let mut customers = query_builder
            .build_query_as::<Customer>()
            .fetch_all(&self.db_pool)
            .await?;

        self.attach_history(&mut customers).await?;

        Ok(customers)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<Customer, ApiError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;

        let mut customers = vec![customer];
        self.attach_history(&mut customers).await?;

        Ok(customers.remove(0))
    }

    /// Fetch several customers keyed by id, for embedding in loans and invoices
    pub async fn get_customers(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Customer>, ApiError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut customers =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.db_pool)
                .await?;

        self.attach_history(&mut customers).await?;

        Ok(customers.into_iter().map(|c| (c.id, c)).collect())
    }

    pub async fn update_customer(
        &self,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<Customer, ApiError> {
        let request = request.normalized();
        request.validate()?;

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = COALESCE($2, name),
                mobile = COALESCE($3, mobile),
                email = COALESCE($4, email),
                address = COALESCE($5, address),
                dob = COALESCE($6, dob),
                gender = COALESCE($7, gender),
                notes = COALESCE($8, notes)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.mobile)
        .bind(&request.email)
        .bind(&request.address)
        .bind(request.dob)
        .bind(request.gender)
        .bind(&request.notes)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;

        let mut customers = vec![customer];
        self.attach_history(&mut customers).await?;

        Ok(customers.remove(0))
    }

    /// Delete a customer. Customers with invoices or loans are kept.
    pub async fn delete_customer(&self, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| match ApiError::from(e) {
                ApiError::Conflict(_) => ApiError::Conflict(
                    "Customer has invoices or loans and cannot be deleted".to_string(),
                ),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Customer not found".to_string()));
        }

        tracing::info!(customer_id = %id, "Customer deleted");

        Ok(())
    }

    async fn attach_history(&self, customers: &mut [Customer]) -> Result<(), ApiError> {
        if customers.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = customers.iter().map(|c| c.id).collect();
        let entries = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT customer_id, invoice_id, date, total_amount, paid_amount, due_amount
            FROM customer_history
            WHERE customer_id = ANY($1)
            ORDER BY date
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db_pool)
        .await?;

        let mut by_customer: HashMap<Uuid, Vec<HistoryEntry>> = HashMap::new();
        for entry in entries {
            by_customer.entry(entry.customer_id).or_default().push(entry);
        }

        for customer in customers.iter_mut() {
            customer.history = by_customer.remove(&customer.id).unwrap_or_default();
        }

        Ok(())
    }
}

// Ledger operations run on the caller's transaction so the customer's dues
// move together with the invoice that caused them.

/// Lock a customer row for the rest of the transaction
pub(crate) async fn lock_customer(conn: &mut PgConnection, id: Uuid) -> Result<Customer, ApiError> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))
}

pub(crate) async fn append_history(
    conn: &mut PgConnection,
    entry: &HistoryEntry,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        INSERT INTO customer_history (customer_id, invoice_id, date, total_amount, paid_amount, due_amount)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(entry.customer_id)
    .bind(entry.invoice_id)
    .bind(entry.date)
    .bind(entry.total_amount)
    .bind(entry.paid_amount)
    .bind(entry.due_amount)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn update_history(
    conn: &mut PgConnection,
    invoice_id: Uuid,
    paid_amount: f64,
    due_amount: f64,
) -> Result<(), ApiError> {
    sqlx::query(
        "UPDATE customer_history SET paid_amount = $2, due_amount = $3 WHERE invoice_id = $1",
    )
    .bind(invoice_id)
    .bind(paid_amount)
    .bind(due_amount)
    .execute(conn)
    .await?;

    Ok(())
}

/// Shift a customer's outstanding dues and loyalty balance
pub(crate) async fn apply_ledger_delta(
    conn: &mut PgConnection,
    customer_id: Uuid,
    due_delta: f64,
    loyalty_points: i64,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        UPDATE customers
        SET total_due = total_due + $2, loyalty_points = loyalty_points + $3
        WHERE id = $1
        "#,
    )
    .bind(customer_id)
    .bind(due_delta)
    .bind(loyalty_points)
    .execute(conn)
    .await?;

    Ok(())
}
