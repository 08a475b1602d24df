use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{page_request, DeleteQuery, IdQuery, MSG_DELETED};
use crate::auth::AuthUser;
use crate::domain::{permissions, Act, ActFilter, ActInput, HistoryEntry};
use crate::state::AppState;
use crate::utils::{ApiError, ApiJson, ApiQuery, ApiResponse, ListResponse};

#[derive(Debug, Deserialize)]
pub struct ActListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub file_number: Option<String>,
    pub inscription: Option<String>,
    pub serial: Option<String>,
    pub lot_id: Option<i32>,
}

pub async fn create_act(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<ActInput>,
) -> Result<(StatusCode, Json<ApiResponse<Act>>), ApiError> {
    user.require(permissions::ACT_WRITE)?;
    let act = state.acts.create(input, user.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(act, "Acta registrada correctamente.")),
    ))
}

pub async fn list_acts(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ActListQuery>,
) -> Result<Json<ListResponse<Act>>, ApiError> {
    user.require(permissions::ACT_READ)?;
    let page = page_request(&state, query.page, query.limit)?;
    let filter = ActFilter {
        file_number: query.file_number,
        inscription: query.inscription,
        serial: query.serial,
        lot_id: query.lot_id,
    };
    let acts = state.acts.list(&filter, page).await?;
    Ok(Json(ListResponse::new(acts, page)))
}

pub async fn get_act(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<Act>>, ApiError> {
    user.require(permissions::ACT_READ)?;
    let act = state.acts.get(query.id).await?;
    Ok(Json(ApiResponse::success(act)))
}

pub async fn update_act(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(input): ApiJson<ActInput>,
) -> Result<Json<ApiResponse<Act>>, ApiError> {
    user.require(permissions::ACT_WRITE)?;
    let act = state.acts.update(query.id, input, user.user_id).await?;
    Ok(Json(ApiResponse::success_with_message(act, "Acta actualizada correctamente.")))
}

pub async fn delete_act(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(permissions::ACT_DELETE)?;
    let actor = query.deleted_by.unwrap_or(user.user_id);
    state.acts.delete(query.id, actor).await?;
    Ok(Json(ApiResponse::message(MSG_DELETED)))
}

pub async fn act_history(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    user.require(permissions::ACT_READ)?;
    let history = state.acts.history(query.id).await?;
    Ok(Json(ApiResponse::success(history)))
}
