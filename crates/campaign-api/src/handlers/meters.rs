use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{page_request, IdQuery};
use crate::auth::AuthUser;
use crate::domain::{permissions, MeterFilter, MeterInput, MeterRenovation};
use crate::state::AppState;
use crate::utils::{ApiError, ApiJson, ApiQuery, ApiResponse, ListResponse};

#[derive(Debug, Deserialize)]
pub struct MeterListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub serial: Option<String>,
    /// `true` lists meters no live act has consumed.
    pub available: Option<bool>,
}

pub async fn create_meter(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<MeterInput>,
) -> Result<(StatusCode, Json<ApiResponse<MeterRenovation>>), ApiError> {
    user.require(permissions::METER_WRITE)?;
    let meter = state.catalog.create_meter(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(meter, "Medidor registrado correctamente.")),
    ))
}

pub async fn list_meters(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<MeterListQuery>,
) -> Result<Json<ListResponse<MeterRenovation>>, ApiError> {
    user.require(permissions::METER_READ)?;
    let page = page_request(&state, query.page, query.limit)?;
    let filter = MeterFilter {
        serial: query.serial,
        available: query.available,
    };
    let meters = state.catalog.list_meters(&filter, page).await?;
    Ok(Json(ListResponse::new(meters, page)))
}

pub async fn update_meter(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(input): ApiJson<MeterInput>,
) -> Result<Json<ApiResponse<MeterRenovation>>, ApiError> {
    user.require(permissions::METER_WRITE)?;
    let meter = state.catalog.update_meter(query.id, input).await?;
    Ok(Json(ApiResponse::success_with_message(meter, "Medidor actualizado correctamente.")))
}
