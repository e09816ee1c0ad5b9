use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::customer::{
    CreateCustomerRequest, Customer, CustomerFilter, CustomerService, UpdateCustomerRequest,
};
use super::{ApiJson, ApiQuery};
use crate::error::ApiError;
use crate::models::{ApiResponse, MessageResponse};

pub async fn create_customer(
    State(service): State<Arc<CustomerService>>,
    ApiJson(request): ApiJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Customer>>), ApiError> {
    let customer = service.create_customer(request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(customer))))
}

pub async fn list_customers(
    State(service): State<Arc<CustomerService>>,
    ApiQuery(filter): ApiQuery<CustomerFilter>,
) -> Result<Json<ApiResponse<Vec<Customer>>>, ApiError> {
    let customers = service.list_customers(filter).await?;

    Ok(Json(ApiResponse::ok(customers)))
}

pub async fn get_customer(
    State(service): State<Arc<CustomerService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    let customer = service.get_customer(id).await?;

    Ok(Json(ApiResponse::ok(customer)))
}

pub async fn update_customer(
    State(service): State<Arc<CustomerService>>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateCustomerRequest>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    let customer = service.update_customer(id, request).await?;

    Ok(Json(ApiResponse::ok(customer)))
}

pub async fn delete_customer(
    State(service): State<Arc<CustomerService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    service.delete_customer(id).await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Customer deleted successfully".to_string(),
    })))
}
