use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{page_request, DeleteQuery, IdQuery, MSG_DELETED};
use crate::auth::AuthUser;
use crate::domain::{permissions, HistoryEntry, PreCatastral, PreCatastralFilter, PreCatastralInput};
use crate::state::AppState;
use crate::utils::{ApiError, ApiJson, ApiQuery, ApiResponse, ListResponse};

#[derive(Debug, Deserialize)]
pub struct PreCatastralListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub file_number: Option<String>,
    pub inscription: Option<String>,
    pub lot_id: Option<i32>,
}

pub async fn create_pre_catastral(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<PreCatastralInput>,
) -> Result<(StatusCode, Json<ApiResponse<PreCatastral>>), ApiError> {
    user.require(permissions::PRECATASTRAL_WRITE)?;
    let record = state.pre_catastrals.create(input, user.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(record, "Precatastral registrado correctamente.")),
    ))
}

pub async fn list_pre_catastrals(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<PreCatastralListQuery>,
) -> Result<Json<ListResponse<PreCatastral>>, ApiError> {
    user.require(permissions::PRECATASTRAL_READ)?;
    let page = page_request(&state, query.page, query.limit)?;
    let filter = PreCatastralFilter {
        file_number: query.file_number,
        inscription: query.inscription,
        lot_id: query.lot_id,
    };
    let records = state.pre_catastrals.list(&filter, page).await?;
    Ok(Json(ListResponse::new(records, page)))
}

pub async fn get_pre_catastral(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<PreCatastral>>, ApiError> {
    user.require(permissions::PRECATASTRAL_READ)?;
    let record = state.pre_catastrals.get(query.id).await?;
    Ok(Json(ApiResponse::success(record)))
}

pub async fn update_pre_catastral(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(input): ApiJson<PreCatastralInput>,
) -> Result<Json<ApiResponse<PreCatastral>>, ApiError> {
    user.require(permissions::PRECATASTRAL_WRITE)?;
    let record = state.pre_catastrals.update(query.id, input, user.user_id).await?;
    Ok(Json(ApiResponse::success_with_message(
        record,
        "Precatastral actualizado correctamente.",
    )))
}

pub async fn delete_pre_catastral(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(permissions::PRECATASTRAL_DELETE)?;
    let actor = query.deleted_by.unwrap_or(user.user_id);
    state.pre_catastrals.delete(query.id, actor).await?;
    Ok(Json(ApiResponse::message(MSG_DELETED)))
}

pub async fn pre_catastral_history(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    user.require(permissions::PRECATASTRAL_READ)?;
    let history = state.pre_catastrals.history(query.id).await?;
    Ok(Json(ApiResponse::success(history)))
}
