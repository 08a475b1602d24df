use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{page_request, IdQuery};
use crate::auth::AuthUser;
use crate::domain::{permissions, Lot, LotDeletion, LotFilter, LotInput, LotStatus};
use crate::state::AppState;
use crate::utils::{ApiError, ApiJson, ApiQuery, ApiResponse, ListResponse};

#[derive(Debug, Deserialize)]
pub struct LotListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub name: Option<String>,
    pub status: Option<String>,
}

pub async fn create_lot(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<LotInput>,
) -> Result<(StatusCode, Json<ApiResponse<Lot>>), ApiError> {
    user.require(permissions::LOT_WRITE)?;
    let lot = state.lots.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(lot, "Lote creado correctamente.")),
    ))
}

pub async fn list_lots(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<LotListQuery>,
) -> Result<Json<ListResponse<Lot>>, ApiError> {
    user.require(permissions::LOT_READ)?;
    let page = page_request(&state, query.page, query.limit)?;
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<LotStatus>()?),
        None => None,
    };
    let filter = LotFilter {
        name: query.name,
        status,
    };
    let lots = state.lots.list(&filter, page).await?;
    Ok(Json(ListResponse::new(lots, page)))
}

pub async fn active_lot(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Lot>>, ApiError> {
    user.require(permissions::LOT_READ)?;
    let lot = state.lots.active().await?;
    Ok(Json(ApiResponse::success(lot)))
}

pub async fn update_lot(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(input): ApiJson<LotInput>,
) -> Result<Json<ApiResponse<Lot>>, ApiError> {
    user.require(permissions::LOT_WRITE)?;
    let lot = state.lots.update(query.id, input).await?;
    Ok(Json(ApiResponse::success_with_message(lot, "Lote actualizado correctamente.")))
}

pub async fn activate_lot(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<Lot>>, ApiError> {
    user.require(permissions::LOT_WRITE)?;
    let lot = state.lots.activate(query.id).await?;
    Ok(Json(ApiResponse::success_with_message(lot, "Lote activado correctamente.")))
}

pub async fn delete_lot(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<LotDeletion>>, ApiError> {
    user.require(permissions::LOT_DELETE)?;
    let deletion = state.lots.delete(query.id).await?;
    let message = match &deletion.promoted {
        Some(next) => format!("Lote eliminado. El lote {} quedó activo.", next.name),
        None => "Lote eliminado correctamente.".to_string(),
    };
    Ok(Json(ApiResponse::success_with_message(deletion, &message)))
}
