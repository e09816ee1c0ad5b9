//! Inventory items, stock movements and stock alerts
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::ApiError;

/// Kind of stock item
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "inventory_item_type")]
pub enum InventoryItemType {
    Gold,
    Silver,
    Diamond,
    Platinum,
    Other,
}

impl InventoryItemType {
    /// Item code prefix: the first two letters of the type, upper-cased
    pub fn code_prefix(&self) -> &'static str {
        match self {
            InventoryItemType::Gold => "GO",
            InventoryItemType::Silver => "SI",
            InventoryItemType::Diamond => "DI",
            InventoryItemType::Platinum => "PL",
            InventoryItemType::Other => "OT",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "inventory_category")]
pub enum InventoryCategory {
    Ornament,
    Bullion,
    #[serde(rename = "Loose Stone")]
    #[sqlx(rename = "Loose Stone")]
    LooseStone,
    #[serde(rename = "Raw Material")]
    #[sqlx(rename = "Raw Material")]
    RawMaterial,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "inventory_unit", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StockUnit {
    Gram,
    Carat,
    Piece,
}

/// Stock level status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "stock_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
    /// Restock requested; only set explicitly
    Ordered,
}

impl StockStatus {
    /// Status implied by the quantity on hand
    pub fn derive(quantity: i32, reorder_level: i32) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= reorder_level {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "stock_transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StockTransactionType {
    Purchase,
    Sale,
    Return,
    Adjustment,
}

impl StockTransactionType {
    /// Signed change in quantity. Adjustments remove stock.
    pub fn quantity_delta(&self, quantity: i32) -> i32 {
        match self {
            StockTransactionType::Purchase | StockTransactionType::Return => quantity,
            StockTransactionType::Sale | StockTransactionType::Adjustment => -quantity,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub invoice_number: Option<String>,
}

/// Recorded stock movement
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct StockTransaction {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub transaction_type: StockTransactionType,
    pub quantity: i32,
    pub price: Option<f64>,
    /// Invoice or purchase order number
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Inventory item model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub item_code: String,
    pub item_type: InventoryItemType,
    pub category: InventoryCategory,
    pub name: String,
    pub description: Option<String>,
    pub weight: f64,
    pub unit: StockUnit,
    /// Karat for gold and platinum, percent for silver
    pub purity: f64,
    pub purchase_price: f64,
    pub selling_price: f64,
    pub making_charges: f64,
    pub quantity: i32,
    pub reorder_level: i32,
    pub supplier: Option<Json<Supplier>>,
    pub location: String,
    pub status: StockStatus,
    pub images: Vec<String>,
    #[sqlx(skip)]
    pub transactions: Vec<StockTransaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StockAlert {
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub message: String,
}

/// Inventory item as listed, with its stock alerts
#[derive(Debug, Serialize)]
pub struct InventoryItemWithAlerts {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub alerts: Vec<StockAlert>,
}

/// Row of the stock alert report
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockAlertSummary {
    pub item_code: String,
    pub name: String,
    pub quantity: i32,
    pub reorder_level: i32,
    pub status: StockStatus,
    pub message: String,
}

/// Aggregate stock figures
#[derive(Debug, Default, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_items: i64,
    /// Σ quantity × selling price
    pub total_value: f64,
    pub low_stock_items: i64,
    pub out_of_stock_items: i64,
}

impl InventoryItem {
    /// Alerts shown next to the item in listings
    pub fn alerts(&self) -> Vec<StockAlert> {
        match self.status {
            StockStatus::LowStock => vec![StockAlert {
                level: AlertLevel::Warning,
                message: format!("Quantity below reorder level ({})", self.reorder_level),
            }],
            StockStatus::OutOfStock => vec![StockAlert {
                level: AlertLevel::Error,
                message: "Item out of stock".to_string(),
            }],
            _ => Vec::new(),
        }
    }

    /// Entry for the stock alert report, for low and out-of-stock items
    pub fn alert_summary(&self) -> Option<StockAlertSummary> {
        let message = match self.status {
            StockStatus::OutOfStock => "Item is out of stock".to_string(),
            StockStatus::LowStock => format!(
                "Quantity ({}) is below reorder level ({})",
                self.quantity, self.reorder_level
            ),
            _ => return None,
        };

        Some(StockAlertSummary {
            item_code: self.item_code.clone(),
            name: self.name.clone(),
            quantity: self.quantity,
            reorder_level: self.reorder_level,
            status: self.status,
            message,
        })
    }

    /// Apply a stock movement and re-derive the status
    pub fn apply_transaction(
        &mut self,
        request: StockTransactionRequest,
        now: DateTime<Utc>,
    ) -> Result<StockTransaction, ApiError> {
        if request.quantity <= 0 {
            return Err(ApiError::ValidationError(
                "Transaction quantity must be greater than 0".to_string(),
            ));
        }
        if request.transaction_type == StockTransactionType::Sale
            && request.quantity > self.quantity
        {
            return Err(ApiError::ValidationError("Insufficient stock".to_string()));
        }

        let quantity = self
            .quantity
            .checked_add(request.transaction_type.quantity_delta(request.quantity))
            .filter(|q| *q >= 0)
            .ok_or_else(|| {
                ApiError::ValidationError("Quantity cannot go below zero".to_string())
            })?;

        let transaction = StockTransaction {
            date: now,
            transaction_type: request.transaction_type,
            quantity: request.quantity,
            price: request.price,
            reference: request.reference,
            notes: request.notes,
        };

        self.quantity = quantity;
        self.status = StockStatus::derive(self.quantity, self.reorder_level);
        self.transactions.push(transaction.clone());
        self.updated_at = now;

        Ok(transaction)
    }

    /// Apply a partial update. The status follows the new quantity unless the
    /// request sets it.
    pub fn apply_update(
        &mut self,
        request: UpdateInventoryItemRequest,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        request.validate()?;

        if let Some(item_type) = request.item_type {
            self.item_type = item_type;
        }
        if let Some(category) = request.category {
            self.category = category;
        }
        if let Some(name) = request.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            self.description = Some(description);
        }
        if let Some(weight) = request.weight {
            self.weight = weight;
        }
        if let Some(unit) = request.unit {
            self.unit = unit;
        }
        if let Some(purity) = request.purity {
            self.purity = purity;
        }
        if let Some(purchase_price) = request.purchase_price {
            self.purchase_price = purchase_price;
        }
        if let Some(selling_price) = request.selling_price {
            self.selling_price = selling_price;
        }
        if let Some(making_charges) = request.making_charges {
            self.making_charges = making_charges;
        }
        if let Some(quantity) = request.quantity {
            self.quantity = quantity;
        }
        if let Some(reorder_level) = request.reorder_level {
            self.reorder_level = reorder_level;
        }
        if let Some(supplier) = request.supplier {
            self.supplier = Some(Json(supplier));
        }
        if let Some(location) = request.location {
            self.location = location.trim().to_string();
        }
        if let Some(images) = request.images {
            self.images = images;
        }

        self.status = request
            .status
            .unwrap_or_else(|| StockStatus::derive(self.quantity, self.reorder_level));
        self.updated_at = now;

        Ok(())
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Request to add an inventory item
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryItemRequest {
    pub item_type: InventoryItemType,
    pub category: InventoryCategory,
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Weight cannot be negative"))]
    pub weight: f64,
    pub unit: StockUnit,
    pub purity: f64,
    pub purchase_price: f64,
    pub selling_price: f64,
    #[serde(default)]
    pub making_charges: f64,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    pub reorder_level: i32,
    pub supplier: Option<Supplier>,
    #[validate(custom = "validate_not_blank")]
    pub location: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial inventory update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryItemRequest {
    pub item_type: Option<InventoryItemType>,
    pub category: Option<InventoryCategory>,
    #[validate(custom = "validate_not_blank")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Weight cannot be negative"))]
    pub weight: Option<f64>,
    pub unit: Option<StockUnit>,
    pub purity: Option<f64>,
    pub purchase_price: Option<f64>,
    pub selling_price: Option<f64>,
    pub making_charges: Option<f64>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    pub reorder_level: Option<i32>,
    pub supplier: Option<Supplier>,
    #[validate(custom = "validate_not_blank")]
    pub location: Option<String>,
    pub status: Option<StockStatus>,
    pub images: Option<Vec<String>>,
}

/// Request to record a stock movement
#[derive(Debug, Clone, Deserialize)]
pub struct StockTransactionRequest {
    #[serde(rename = "type")]
    pub transaction_type: StockTransactionType,
    pub quantity: i32,
    pub price: Option<f64>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Query for listing inventory
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    #[serde(default, deserialize_with = "crate::models::empty_as_none")]
    pub item_type: Option<InventoryItemType>,
    #[serde(default, deserialize_with = "crate::models::empty_as_none")]
    pub category: Option<InventoryCategory>,
    #[serde(default, deserialize_with = "crate::models::empty_as_none")]
    pub status: Option<StockStatus>,
    #[serde(default, deserialize_with = "crate::models::empty_as_none")]
    pub search: Option<String>,
}
