use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::customer::service::{append_history, apply_ledger_delta, lock_customer, update_history};
use crate::customer::{loyalty_points_for, CustomerService, HistoryEntry};
use crate::error::ApiError;
use crate::invoice::model::{
    CreateInvoiceRequest, Invoice, InvoiceItem, InvoiceStatus, InvoiceTotals, RecordPaymentRequest,
};
use crate::sequence::{reserve_next, Sequence};

#[derive(sqlx::FromRow)]
struct InvoiceItemRow {
    invoice_id: Uuid,
    #[sqlx(flatten)]
    item: InvoiceItem,
}

/// Invoice service. Invoice writes and the customer ledger update share one
/// transaction.
#[derive(Clone)]
pub struct InvoiceService {
    db_pool: PgPool,
    customers: CustomerService,
}

impl InvoiceService {
    pub fn new(db_pool: PgPool, customers: CustomerService) -> Self {
        Self { db_pool, customers }
    }

    pub async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<Invoice, ApiError> {
        request.validate()?;

        let totals = InvoiceTotals::compute(&request.items, request.gst)?;
        totals.reconcile(request.total_amount)?;

        let (status, due_amount) = InvoiceStatus::settle(request.total_amount, request.paid_amount);
        let date = request.date.unwrap_or_else(Utc::now);

        let mut tx = self.db_pool.begin().await?;

        lock_customer(&mut *tx, request.customer_id).await?;
        let invoice_number = reserve_next(&mut *tx, Sequence::Invoice).await?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_number, date, customer_id, total_amount, paid_amount,
                due_amount, gst, gst_amount, subtotal, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(invoice_number)
        .bind(date)
        .bind(request.customer_id)
        .bind(request.total_amount)
        .bind(request.paid_amount)
        .bind(due_amount)
        .bind(totals.gst)
        .bind(totals.gst_amount)
        .bind(totals.subtotal)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in totals.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (invoice_id, position, name, weight, rate, making_charge, total_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(invoice.id)
            .bind(position as i32)
            .bind(&item.name)
            .bind(item.weight)
            .bind(item.rate)
            .bind(item.making_charge)
            .bind(item.total_price)
            .execute(&mut *tx)
            .await?;
        }

        append_history(
            &mut *tx,
            &HistoryEntry {
                customer_id: invoice.customer_id,
                invoice_id: invoice.id,
                date: invoice.date,
                total_amount: invoice.total_amount,
                paid_amount: invoice.paid_amount,
                due_amount: invoice.due_amount,
            },
        )
        .await?;
        apply_ledger_delta(
            &mut *tx,
            invoice.customer_id,
            invoice.due_amount,
            loyalty_points_for(invoice.paid_amount),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice.id,
            invoice_number = invoice.invoice_number,
            customer_id = %invoice.customer_id,
            total = invoice.total_amount,
            due = invoice.due_amount,
            "Invoice created"
        );

        self.get_invoice(invoice.id).await
    }

    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, ApiError> {
        let mut invoices =
            sqlx::query_as::<_, Invoice>("SELECT * FROM invoices ORDER BY date DESC, invoice_number DESC")
                .fetch_all(&self.db_pool)
                .await?;

        self.attach_details(&mut invoices).await?;

        Ok(invoices)
    }

    pub async fn get_invoice(&self, id: Uuid) -> Result<Invoice, ApiError> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

        let mut invoices = vec![invoice];
        self.attach_details(&mut invoices).await?;

        Ok(invoices.remove(0))
    }

    /// Record a payment made after the invoice was issued
    pub async fn record_payment(
        &self,
        id: Uuid,
        request: RecordPaymentRequest,
    ) -> Result<Invoice, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let mut invoice =
            sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

        let delta = invoice.apply_payment(request.amount)?;

        sqlx::query(
            "UPDATE invoices SET paid_amount = $2, due_amount = $3, status = $4 WHERE id = $1",
        )
        .bind(invoice.id)
        .bind(invoice.paid_amount)
        .bind(invoice.due_amount)
        .bind(invoice.status)
        .execute(&mut *tx)
        .await?;

        update_history(&mut *tx, invoice.id, invoice.paid_amount, invoice.due_amount).await?;
        apply_ledger_delta(&mut *tx, invoice.customer_id, delta.due_delta, delta.loyalty_points)
            .await?;

        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice.id,
            amount = request.amount,
            status = ?invoice.status,
            "Invoice payment recorded"
        );

        self.get_invoice(id).await
    }

    async fn attach_details(&self, invoices: &mut [Invoice]) -> Result<(), ApiError> {
        if invoices.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = invoices.iter().map(|i| i.id).collect();
        let rows = sqlx::query_as::<_, InvoiceItemRow>(
            r#"
            SELECT invoice_id, name, weight, rate, making_charge, total_price
            FROM invoice_items
            WHERE invoice_id = ANY($1)
            ORDER BY position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db_pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<InvoiceItem>> = HashMap::new();
        for row in rows {
            items.entry(row.invoice_id).or_default().push(row.item);
        }

        let customer_ids: Vec<Uuid> = invoices.iter().map(|i| i.customer_id).collect();
        let customers = self.customers.get_customers(&customer_ids).await?;

        for invoice in invoices.iter_mut() {
            invoice.items = items.remove(&invoice.id).unwrap_or_default();
            invoice.customer = customers.get(&invoice.customer_id).cloned();
        }

        Ok(())
    }
}
