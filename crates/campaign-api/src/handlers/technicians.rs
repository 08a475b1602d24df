use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{page_request, IdQuery, MSG_DELETED};
use crate::auth::AuthUser;
use crate::domain::{permissions, Technician, TechnicianFilter, TechnicianInput};
use crate::state::AppState;
use crate::utils::{ApiError, ApiJson, ApiQuery, ApiResponse, ListResponse};

#[derive(Debug, Deserialize)]
pub struct TechnicianListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub dni: Option<String>,
    pub name: Option<String>,
}

pub async fn create_technician(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<TechnicianInput>,
) -> Result<(StatusCode, Json<ApiResponse<Technician>>), ApiError> {
    user.require(permissions::TECHNICIAN_WRITE)?;
    let technician = state.catalog.create_technician(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(technician, "Técnico registrado correctamente.")),
    ))
}

pub async fn list_technicians(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<TechnicianListQuery>,
) -> Result<Json<ListResponse<Technician>>, ApiError> {
    user.require(permissions::TECHNICIAN_READ)?;
    let page = page_request(&state, query.page, query.limit)?;
    let filter = TechnicianFilter {
        dni: query.dni,
        name: query.name,
    };
    let technicians = state.catalog.list_technicians(&filter, page).await?;
    Ok(Json(ListResponse::new(technicians, page)))
}

pub async fn update_technician(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(input): ApiJson<TechnicianInput>,
) -> Result<Json<ApiResponse<Technician>>, ApiError> {
    user.require(permissions::TECHNICIAN_WRITE)?;
    let technician = state.catalog.update_technician(query.id, input).await?;
    Ok(Json(ApiResponse::success_with_message(
        technician,
        "Técnico actualizado correctamente.",
    )))
}

pub async fn delete_technician(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(permissions::TECHNICIAN_DELETE)?;
    state.catalog.delete_technician(query.id).await?;
    Ok(Json(ApiResponse::message(MSG_DELETED)))
}
