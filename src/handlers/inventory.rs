use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiJson, ApiQuery};
use crate::error::ApiError;
use crate::inventory::{
    CreateInventoryItemRequest, InventoryFilter, InventoryItem, InventoryItemWithAlerts,
    InventoryService, InventoryStats, StockAlertSummary, StockTransactionRequest,
    UpdateInventoryItemRequest,
};
use crate::models::ApiResponse;

pub async fn create_inventory_item(
    State(service): State<Arc<InventoryService>>,
    ApiJson(request): ApiJson<CreateInventoryItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InventoryItem>>), ApiError> {
    let item = service.create_item(request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

pub async fn list_inventory(
    State(service): State<Arc<InventoryService>>,
    ApiQuery(filter): ApiQuery<InventoryFilter>,
) -> Result<Json<ApiResponse<Vec<InventoryItemWithAlerts>>>, ApiError> {
    let items = service.list_items(filter).await?;

    Ok(Json(ApiResponse::ok(items)))
}

pub async fn get_inventory_item(
    State(service): State<Arc<InventoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InventoryItem>>, ApiError> {
    let item = service.get_item(id).await?;

    Ok(Json(ApiResponse::ok(item)))
}

pub async fn update_inventory_item(
    State(service): State<Arc<InventoryService>>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateInventoryItemRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, ApiError> {
    let item = service.update_item(id, request).await?;

    Ok(Json(ApiResponse::ok(item)))
}

pub async fn record_stock_transaction(
    State(service): State<Arc<InventoryService>>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<StockTransactionRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, ApiError> {
    let item = service.record_transaction(id, request).await?;

    Ok(Json(ApiResponse::ok(item)))
}

pub async fn get_stock_alerts(
    State(service): State<Arc<InventoryService>>,
) -> Result<Json<ApiResponse<Vec<StockAlertSummary>>>, ApiError> {
    let alerts = service.stock_alerts().await?;

    Ok(Json(ApiResponse::ok(alerts)))
}

pub async fn get_inventory_stats(
    State(service): State<Arc<InventoryService>>,
) -> Result<Json<ApiResponse<InventoryStats>>, ApiError> {
    let stats = service.stats().await?;

    Ok(Json(ApiResponse::ok(stats)))
}
