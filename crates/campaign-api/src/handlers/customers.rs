use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{page_request, IdQuery};
use crate::auth::AuthUser;
use crate::domain::{permissions, Customer, CustomerFilter, CustomerInput};
use crate::state::AppState;
use crate::utils::{ApiError, ApiJson, ApiQuery, ApiResponse, ListResponse};

#[derive(Debug, Deserialize)]
pub struct CustomerListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub inscription: Option<String>,
    pub name: Option<String>,
}

pub async fn create_customer(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<CustomerInput>,
) -> Result<(StatusCode, Json<ApiResponse<Customer>>), ApiError> {
    user.require(permissions::CUSTOMER_WRITE)?;
    let customer = state.catalog.create_customer(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(customer, "Cliente registrado correctamente.")),
    ))
}

pub async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<CustomerListQuery>,
) -> Result<Json<ListResponse<Customer>>, ApiError> {
    user.require(permissions::CUSTOMER_READ)?;
    let page = page_request(&state, query.page, query.limit)?;
    let filter = CustomerFilter {
        inscription: query.inscription,
        name: query.name,
    };
    let customers = state.catalog.list_customers(&filter, page).await?;
    Ok(Json(ListResponse::new(customers, page)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    user.require(permissions::CUSTOMER_READ)?;
    let customer = state.catalog.get_customer(query.id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    user.require(permissions::CUSTOMER_WRITE)?;
    let customer = state.catalog.update_customer(query.id, input).await?;
    Ok(Json(ApiResponse::success_with_message(
        customer,
        "Cliente actualizado correctamente.",
    )))
}
