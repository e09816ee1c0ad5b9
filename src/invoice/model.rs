//! Sales invoices
//!
//! Item pricing, GST, total reconciliation and payment status are plain
//! functions over the request so they can be checked without a database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::customer::{loyalty_points_for, Customer};
use crate::error::ApiError;

/// GST percentage applied when the request does not name one
pub const DEFAULT_GST_RATE: f64 = 3.0;

/// Largest accepted difference between the computed and the provided total
pub const TOTAL_TOLERANCE: f64 = 0.01;

/// Invoice payment status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Partial,
    Paid,
}

impl InvoiceStatus {
    /// Derive the status and the amount still due from a total and a paid amount
    pub fn settle(total_amount: f64, paid_amount: f64) -> (InvoiceStatus, f64) {
        if paid_amount >= total_amount {
            (InvoiceStatus::Paid, 0.0)
        } else if paid_amount > 0.0 {
            (InvoiceStatus::Partial, total_amount - paid_amount)
        } else {
            (InvoiceStatus::Pending, total_amount)
        }
    }
}

/// Invoice model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: i64,
    pub date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub due_amount: f64,
    pub gst: f64,
    pub gst_amount: f64,
    pub subtotal: f64,
    pub status: InvoiceStatus,
    #[sqlx(skip)]
    pub items: Vec<InvoiceItem>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    pub created_at: DateTime<Utc>,
}

/// Change to a customer's ledger caused by an invoice event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerDelta {
    pub due_delta: f64,
    pub loyalty_points: i64,
}

impl Invoice {
    /// Record a later payment against this invoice
    pub fn apply_payment(&mut self, amount: f64) -> Result<LedgerDelta, ApiError> {
        if amount.is_nan() || amount <= 0.0 {
            return Err(ApiError::ValidationError(
                "Payment amount must be greater than 0".to_string(),
            ));
        }
        if self.status == InvoiceStatus::Paid {
            return Err(ApiError::Conflict(format!(
                "Invoice {} is already paid",
                self.invoice_number
            )));
        }

        let paid_amount = self.paid_amount + amount;
        let (status, due_amount) = InvoiceStatus::settle(self.total_amount, paid_amount);

        let delta = LedgerDelta {
            due_delta: due_amount - self.due_amount,
            loyalty_points: loyalty_points_for(paid_amount) - loyalty_points_for(self.paid_amount),
        };

        self.paid_amount = paid_amount;
        self.status = status;
        self.due_amount = due_amount;

        Ok(delta)
    }
}

/// Priced invoice line
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub name: String,
    pub weight: f64,
    pub rate: f64,
    pub making_charge: f64,
    pub total_price: f64,
}

/// Invoice line as submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemInput {
    pub name: String,
    pub weight: f64,
    pub rate: f64,
    #[serde(default)]
    pub making_charge: f64,
}

impl InvoiceItemInput {
    /// `weight × rate + makingCharge`
    pub fn price(&self) -> InvoiceItem {
        InvoiceItem {
            name: self.name.trim().to_string(),
            weight: self.weight,
            rate: self.rate,
            making_charge: self.making_charge,
            total_price: self.weight * self.rate + self.making_charge,
        }
    }
}

fn default_gst() -> f64 {
    DEFAULT_GST_RATE
}

/// Request to create an invoice
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "Invoice needs at least one item"))]
    pub items: Vec<InvoiceItemInput>,
    pub total_amount: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Paid amount cannot be negative"))]
    pub paid_amount: f64,
    #[serde(default = "default_gst")]
    #[validate(range(min = 0.0, max = 100.0, message = "GST must be between 0 and 100"))]
    pub gst: f64,
    pub date: Option<DateTime<Utc>>,
}

/// Request to record a payment on an existing invoice
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: f64,
}

/// Computed invoice amounts
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceTotals {
    pub items: Vec<InvoiceItem>,
    pub subtotal: f64,
    pub gst: f64,
    pub gst_amount: f64,
    pub total: f64,
}

impl InvoiceTotals {
    /// Price every line and add GST on the subtotal
    pub fn compute(items: &[InvoiceItemInput], gst: f64) -> Result<Self, ApiError> {
        for item in items {
            if item.name.trim().is_empty() {
                return Err(ApiError::ValidationError("Item name is required".to_string()));
            }
            if item.weight < 0.0 || item.rate < 0.0 || item.making_charge < 0.0 {
                return Err(ApiError::ValidationError(format!(
                    "Item '{}' has a negative weight, rate or making charge",
                    item.name.trim()
                )));
            }
        }

        let items: Vec<InvoiceItem> = items.iter().map(InvoiceItemInput::price).collect();
        let subtotal: f64 = items.iter().map(|i| i.total_price).sum();
        let gst_amount = subtotal * (gst / 100.0);

        Ok(Self {
            items,
            subtotal,
            gst,
            gst_amount,
            total: subtotal + gst_amount,
        })
    }

    /// Check the caller's total against the computed one
    pub fn reconcile(&self, provided: f64) -> Result<(), ApiError> {
        if (self.total - provided).abs() > TOTAL_TOLERANCE {
            return Err(ApiError::ValidationFailed {
                message: "Total amount mismatch".to_string(),
                details: json!({
                    "calculated": self.total,
                    "provided": provided,
                }),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(weight: f64, rate: f64, making_charge: f64) -> InvoiceItemInput {
        InvoiceItemInput {
            name: "Bangle".to_string(),
            weight,
            rate,
            making_charge,
        }
    }

    fn invoice(total: f64, paid: f64) -> Invoice {
        let (status, due) = InvoiceStatus::settle(total, paid);
        Invoice {
            id: Uuid::new_v4(),
            invoice_number: 7,
            date: Utc::now(),
            customer_id: Uuid::new_v4(),
            total_amount: total,
            paid_amount: paid,
            due_amount: due,
            gst: DEFAULT_GST_RATE,
            gst_amount: 0.0,
            subtotal: total,
            status,
            items: Vec::new(),
            customer: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_item_price_includes_making_charge() {
        let priced = item(10.0, 6000.0, 1500.0).price();
        assert_eq!(priced.total_price, 61_500.0);
    }

    #[test]
    fn test_totals_apply_gst_on_subtotal() {
        let totals =
            InvoiceTotals::compute(&[item(10.0, 6000.0, 1500.0), item(2.0, 500.0, 0.0)], 3.0)
                .unwrap();
        assert_eq!(totals.subtotal, 62_500.0);
        assert_eq!(totals.gst_amount, 1875.0);
        assert_eq!(totals.total, 64_375.0);
    }

    #[test]
    fn test_reconcile_within_tolerance() {
        let totals = InvoiceTotals::compute(&[item(1.0, 100.0, 0.0)], 3.0).unwrap();
        assert!(totals.reconcile(103.0).is_ok());
        assert!(totals.reconcile(103.009).is_ok());
        assert!(totals.reconcile(102.995).is_ok());
    }

    #[test]
    fn test_reconcile_mismatch_reports_both_totals() {
        let totals = InvoiceTotals::compute(&[item(1.0, 100.0, 0.0)], 3.0).unwrap();
        let err = totals.reconcile(103.02).unwrap_err();
        let details = err.details().cloned().unwrap();
        assert_eq!(details["calculated"], 103.0);
        assert_eq!(details["provided"], 103.02);
    }

    #[test]
    fn test_create_request_requires_items() {
        let request = CreateInvoiceRequest {
            customer_id: Uuid::new_v4(),
            items: Vec::new(),
            total_amount: 0.0,
            paid_amount: 0.0,
            gst: DEFAULT_GST_RATE,
            date: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));

        let request = CreateInvoiceRequest {
            items: vec![item(1.0, 100.0, 0.0)],
            total_amount: 103.0,
            ..request
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        assert!(InvoiceTotals::compute(&[item(-1.0, 100.0, 0.0)], 3.0).is_err());
    }

    #[test]
    fn test_settle_status() {
        assert_eq!(InvoiceStatus::settle(1000.0, 0.0), (InvoiceStatus::Pending, 1000.0));
        assert_eq!(InvoiceStatus::settle(1000.0, 400.0), (InvoiceStatus::Partial, 600.0));
        assert_eq!(InvoiceStatus::settle(1000.0, 1000.0), (InvoiceStatus::Paid, 0.0));
        assert_eq!(InvoiceStatus::settle(1000.0, 1200.0), (InvoiceStatus::Paid, 0.0));
    }

    #[test]
    fn test_apply_payment_moves_ledger() {
        let mut inv = invoice(1000.0, 150.0);
        let delta = inv.apply_payment(400.0).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Partial);
        assert_eq!(inv.due_amount, 450.0);
        assert_eq!(delta.due_delta, -400.0);
        // 150 -> 550 paid crosses four hundreds
        assert_eq!(delta.loyalty_points, 4);

        let delta = inv.apply_payment(450.0).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert_eq!(inv.due_amount, 0.0);
        assert_eq!(delta.due_delta, -450.0);
    }

    #[test]
    fn test_apply_payment_on_paid_invoice_conflicts() {
        let mut inv = invoice(1000.0, 1000.0);
        assert!(matches!(inv.apply_payment(10.0), Err(ApiError::Conflict(_))));
        assert_eq!(inv.paid_amount, 1000.0);
    }

    #[test]
    fn test_apply_payment_requires_positive_amount() {
        let mut inv = invoice(1000.0, 0.0);
        assert!(matches!(
            inv.apply_payment(0.0),
            Err(ApiError::ValidationError(_))
        ));
    }
}
