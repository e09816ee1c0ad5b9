use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::ApiJson;
use crate::error::ApiError;
use crate::invoice::{CreateInvoiceRequest, Invoice, InvoiceService, RecordPaymentRequest};
use crate::models::ApiResponse;

pub async fn create_invoice(
    State(service): State<Arc<InvoiceService>>,
    ApiJson(request): ApiJson<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Invoice>>), ApiError> {
    let invoice = service.create_invoice(request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(invoice))))
}

pub async fn list_invoices(
    State(service): State<Arc<InvoiceService>>,
) -> Result<Json<ApiResponse<Vec<Invoice>>>, ApiError> {
    let invoices = service.list_invoices().await?;

    Ok(Json(ApiResponse::ok(invoices)))
}

pub async fn get_invoice(
    State(service): State<Arc<InvoiceService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Invoice>>, ApiError> {
    let invoice = service.get_invoice(id).await?;

    Ok(Json(ApiResponse::ok(invoice)))
}

pub async fn record_invoice_payment(
    State(service): State<Arc<InvoiceService>>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<RecordPaymentRequest>,
) -> Result<Json<ApiResponse<Invoice>>, ApiError> {
    let invoice = service.record_payment(id, request).await?;

    Ok(Json(ApiResponse::ok(invoice)))
}
