use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{page_request, DeleteQuery, IdQuery, MSG_DELETED};
use crate::auth::AuthUser;
use crate::domain::{
    permissions, HistoryEntry, Labeled, LabeledFilter, LabeledInput, LabeledSummary,
};
use crate::state::AppState;
use crate::utils::{ApiError, ApiJson, ApiQuery, ApiResponse, ListResponse};

#[derive(Debug, Deserialize)]
pub struct LabeledListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub name: Option<String>,
    pub serial: Option<String>,
    pub lot_id: Option<i32>,
}

pub async fn create_labeled(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<LabeledInput>,
) -> Result<(StatusCode, Json<ApiResponse<Labeled>>), ApiError> {
    user.require(permissions::LABELED_WRITE)?;
    let labeled = state.labeled.create(input, user.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(labeled, "Caja registrada correctamente.")),
    ))
}

pub async fn list_labeled(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<LabeledListQuery>,
) -> Result<Json<ListResponse<LabeledSummary>>, ApiError> {
    user.require(permissions::LABELED_READ)?;
    let page = page_request(&state, query.page, query.limit)?;
    let filter = LabeledFilter {
        name: query.name,
        serial: query.serial,
        lot_id: query.lot_id,
    };
    let boxes = state.labeled.list(&filter, page).await?;
    Ok(Json(ListResponse::new(boxes, page)))
}

pub async fn get_labeled(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<Labeled>>, ApiError> {
    user.require(permissions::LABELED_READ)?;
    let labeled = state.labeled.get(query.id).await?;
    Ok(Json(ApiResponse::success(labeled)))
}

pub async fn update_labeled(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(input): ApiJson<LabeledInput>,
) -> Result<Json<ApiResponse<Labeled>>, ApiError> {
    user.require(permissions::LABELED_WRITE)?;
    let labeled = state.labeled.update(query.id, input, user.user_id).await?;
    Ok(Json(ApiResponse::success_with_message(labeled, "Caja actualizada correctamente.")))
}

pub async fn delete_labeled(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(permissions::LABELED_DELETE)?;
    let actor = query.deleted_by.unwrap_or(user.user_id);
    state.labeled.delete(query.id, actor).await?;
    Ok(Json(ApiResponse::message(MSG_DELETED)))
}

pub async fn labeled_history(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    user.require(permissions::LABELED_READ)?;
    let history = state.labeled.history(query.id).await?;
    Ok(Json(ApiResponse::success(history)))
}
