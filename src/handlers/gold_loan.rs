use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiJson, ApiQuery};
use crate::error::ApiError;
use crate::gold_loan::{
    CreateLoanRequest, GoldLoan, GoldLoanService, ListLoansQuery, RepaymentRequest,
    UpdateStatusRequest,
};
use crate::models::ApiResponse;

pub async fn create_gold_loan(
    State(service): State<Arc<GoldLoanService>>,
    ApiJson(request): ApiJson<CreateLoanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GoldLoan>>), ApiError> {
    let loan = service.create_loan(request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(loan))))
}

pub async fn list_gold_loans(
    State(service): State<Arc<GoldLoanService>>,
    ApiQuery(query): ApiQuery<ListLoansQuery>,
) -> Result<Json<ApiResponse<Vec<GoldLoan>>>, ApiError> {
    let loans = service.list_loans(query).await?;

    Ok(Json(ApiResponse::ok(loans)))
}

pub async fn get_gold_loan(
    State(service): State<Arc<GoldLoanService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GoldLoan>>, ApiError> {
    let loan = service.get_loan(id).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

pub async fn record_repayment(
    State(service): State<Arc<GoldLoanService>>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<RepaymentRequest>,
) -> Result<Json<ApiResponse<GoldLoan>>, ApiError> {
    let loan = service.record_repayment(id, request).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

pub async fn update_gold_loan_status(
    State(service): State<Arc<GoldLoanService>>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<GoldLoan>>, ApiError> {
    let loan = service.update_status(id, request).await?;

    Ok(Json(ApiResponse::ok(loan)))
}
