use std::collections::HashMap;

use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::inventory::model::{
    CreateInventoryItemRequest, InventoryFilter, InventoryItem, InventoryItemWithAlerts,
    InventoryStats, StockAlertSummary, StockStatus, StockTransaction, StockTransactionRequest,
    UpdateInventoryItemRequest,
};
use crate::sequence::{format_code, reserve_next, Sequence};

#[derive(sqlx::FromRow)]
struct StockTransactionRow {
    item_id: Uuid,
    #[sqlx(flatten)]
    transaction: StockTransaction,
}

#[derive(Clone)]
pub struct InventoryService {
    db_pool: PgPool,
}

impl InventoryService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create_item(
        &self,
        request: CreateInventoryItemRequest,
    ) -> Result<InventoryItem, ApiError> {
        request.validate()?;

        let prefix = request.item_type.code_prefix();
        let status = StockStatus::derive(request.quantity, request.reorder_level);
        let now = Utc::now();

        let mut tx = self.db_pool.begin().await?;

        let sequence = reserve_next(&mut *tx, Sequence::InventoryItem(prefix)).await?;
        let item_code = format_code(prefix, sequence);

        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items (
                item_code, item_type, category, name, description, weight, unit,
                purity, purchase_price, selling_price, making_charges, quantity,
                reorder_level, supplier, location, status, images, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(&item_code)
        .bind(request.item_type)
        .bind(request.category)
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.weight)
        .bind(request.unit)
        .bind(request.purity)
        .bind(request.purchase_price)
        .bind(request.selling_price)
        .bind(request.making_charges)
        .bind(request.quantity)
        .bind(request.reorder_level)
        .bind(request.supplier.map(Json))
        .bind(request.location.trim())
        .bind(status)
        .bind(&request.images)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            item_id = %item.id,
            item_code = %item.item_code,
            quantity = item.quantity,
            "Inventory item created"
        );

        Ok(item)
    }

    /// List items matching the filter, each with its stock alerts
    pub async fn list_items(
        &self,
        filter: InventoryFilter,
    ) -> Result<Vec<InventoryItemWithAlerts>, ApiError> {
        let mut query_builder = sqlx::QueryBuilder::new("SELECT * FROM inventory_items WHERE 1=1");

        if let Some(item_type) = filter.item_type {
            query_builder.push(" AND item_type = ");
            query_builder.push_bind(item_type);
        }

        if let Some(category) = filter.category {
            query_builder.push(" AND category = ");
            query_builder.push_bind(category);
        }

        if let Some(status) = filter.status {
            query_builder.push(" AND status = ");
            query_builder.push_bind(status);
        }

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            query_builder.push(" AND (name ILIKE ");
            query_builder.push_bind(pattern.clone());
            query_builder.push(" OR item_code ILIKE ");
            query_builder.push_bind(pattern.clone());
            query_builder.push(" OR description ILIKE ");
            query_builder.push_bind(pattern);
            query_builder.push(")");
        }

        query_builder.push(" ORDER BY created_at DESC");

        let mut items = query_builder
            .build_query_as::<InventoryItem>()
            .fetch_all(&self.db_pool)
            .await?;

        self.attach_transactions(&mut items).await?;

        Ok(items
            .into_iter()
            .map(|item| {
                let alerts = item.alerts();
                InventoryItemWithAlerts { item, alerts }
            })
            .collect())
    }

    pub async fn get_item(&self, id: Uuid) -> Result<InventoryItem, ApiError> {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

        let mut items = vec![item];
        self.attach_transactions(&mut items).await?;

        Ok(items.remove(0))
    }

    pub async fn update_item(
        &self,
        id: Uuid,
        request: UpdateInventoryItemRequest,
    ) -> Result<InventoryItem, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let mut item = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

        item.apply_update(request, Utc::now())?;

        sqlx::query(
            r#"
            UPDATE inventory_items SET
                item_type = $2, category = $3, name = $4, description = $5, weight = $6,
                unit = $7, purity = $8, purchase_price = $9, selling_price = $10,
                making_charges = $11, quantity = $12, reorder_level = $13, supplier = $14,
                location = $15, status = $16, images = $17, updated_at = $18
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(item.item_type)
        .bind(item.category)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.weight)
        .bind(item.unit)
        .bind(item.purity)
        .bind(item.purchase_price)
        .bind(item.selling_price)
        .bind(item.making_charges)
        .bind(item.quantity)
        .bind(item.reorder_level)
        .bind(&item.supplier)
        .bind(&item.location)
        .bind(item.status)
        .bind(&item.images)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(item_code = %item.item_code, status = ?item.status, "Inventory item updated");

        self.get_item(id).await
    }

    /// Record a stock movement. The item row stays locked until the new
    /// quantity and the transaction entry are written.
    pub async fn record_transaction(
        &self,
        id: Uuid,
        request: StockTransactionRequest,
    ) -> Result<InventoryItem, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let mut item = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

        let transaction = item.apply_transaction(request, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO inventory_transactions (
                item_id, date, transaction_type, quantity, price, reference, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id)
        .bind(transaction.date)
        .bind(transaction.transaction_type)
        .bind(transaction.quantity)
        .bind(transaction.price)
        .bind(&transaction.reference)
        .bind(&transaction.notes)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE inventory_items SET quantity = $2, status = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(item.id)
        .bind(item.quantity)
        .bind(item.status)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            item_code = %item.item_code,
            transaction_type = ?transaction.transaction_type,
            quantity = transaction.quantity,
            on_hand = item.quantity,
            "Stock transaction recorded"
        );
        if item.status != StockStatus::InStock {
            tracing::warn!(item_code = %item.item_code, status = ?item.status, "Stock level alert");
        }

        self.get_item(id).await
    }

    /// Items that are low on stock or out of stock
    pub async fn stock_alerts(&self) -> Result<Vec<StockAlertSummary>, ApiError> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT * FROM inventory_items
            WHERE status IN ('low-stock', 'out-of-stock')
            ORDER BY item_code
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(items.iter().filter_map(InventoryItem::alert_summary).collect())
    }

    pub async fn stats(&self) -> Result<InventoryStats, ApiError> {
        let stats = sqlx::query_as::<_, InventoryStats>(
            r#"
            SELECT
                COUNT(*) AS total_items,
                COALESCE(SUM(quantity * selling_price), 0)::DOUBLE PRECISION AS total_value,
                COUNT(*) FILTER (WHERE status = 'low-stock') AS low_stock_items,
                COUNT(*) FILTER (WHERE status = 'out-of-stock') AS out_of_stock_items
            FROM inventory_items
            "#,
        )
        .fetch_one(&self.db_pool)
        .await?;

        Ok(stats)
    }

    async fn attach_transactions(&self, items: &mut [InventoryItem]) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        let rows = sqlx::query_as::<_, StockTransactionRow>(
            r#"
            SELECT item_id, date, transaction_type, quantity, price, reference, notes
            FROM inventory_transactions
            WHERE item_id = ANY($1)
            ORDER BY seq
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db_pool)
        .await?;

        let mut by_item: HashMap<Uuid, Vec<StockTransaction>> = HashMap::new();
        for row in rows {
            by_item.entry(row.item_id).or_default().push(row.transaction);
        }

        for item in items.iter_mut() {
            item.transactions = by_item.remove(&item.id).unwrap_or_default();
        }

        Ok(())
    }
}

/// Substring pattern for `ILIKE`; `%`, `_` and `\` in the search are matched literally
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_plain_text() {
        assert_eq!(like_pattern("ring"), "%ring%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%"), r"%100\%%");
        assert_eq!(like_pattern("GO_0"), r"%GO\_0%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
