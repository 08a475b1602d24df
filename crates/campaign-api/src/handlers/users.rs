use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{page_request, IdQuery, MSG_DELETED};
use crate::auth::AuthUser;
use crate::domain::{permissions, User, UserFilter, UserInput};
use crate::state::AppState;
use crate::utils::{ApiError, ApiJson, ApiQuery, ApiResponse, ListResponse};

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub username: Option<String>,
    pub role_id: Option<i32>,
}

pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<UserInput>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    user.require(permissions::USER_WRITE)?;
    let created = state.access.create_user(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(created, "Usuario creado correctamente.")),
    ))
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<ListResponse<User>>, ApiError> {
    user.require(permissions::USER_READ)?;
    let page = page_request(&state, query.page, query.limit)?;
    let filter = UserFilter {
        username: query.username,
        role_id: query.role_id,
    };
    let users = state.access.list_users(&filter, page).await?;
    Ok(Json(ListResponse::new(users, page)))
}

pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(input): ApiJson<UserInput>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    user.require(permissions::USER_WRITE)?;
    let updated = state.access.update_user(query.id, input).await?;
    Ok(Json(ApiResponse::success_with_message(updated, "Usuario actualizado correctamente.")))
}

pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(permissions::USER_DELETE)?;
    state.access.delete_user(query.id, user.user_id).await?;
    Ok(Json(ApiResponse::message(MSG_DELETED)))
}
