use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{page_request, IdQuery, MSG_DELETED};
use crate::auth::AuthUser;
use crate::domain::{permissions, Permission, Role, RoleInput};
use crate::state::AppState;
use crate::utils::{ApiError, ApiJson, ApiQuery, ApiResponse, ListResponse};

#[derive(Debug, Deserialize)]
pub struct RoleListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn create_role(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<RoleInput>,
) -> Result<(StatusCode, Json<ApiResponse<Role>>), ApiError> {
    user.require(permissions::ROLE_WRITE)?;
    let role = state.access.create_role(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(role, "Rol creado correctamente.")),
    ))
}

pub async fn list_roles(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<RoleListQuery>,
) -> Result<Json<ListResponse<Role>>, ApiError> {
    user.require(permissions::ROLE_READ)?;
    let page = page_request(&state, query.page, query.limit)?;
    let roles = state.access.list_roles(page).await?;
    Ok(Json(ListResponse::new(roles, page)))
}

pub async fn update_role(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(input): ApiJson<RoleInput>,
) -> Result<Json<ApiResponse<Role>>, ApiError> {
    user.require(permissions::ROLE_WRITE)?;
    let role = state.access.update_role(query.id, input).await?;
    Ok(Json(ApiResponse::success_with_message(role, "Rol actualizado correctamente.")))
}

pub async fn delete_role(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(permissions::ROLE_DELETE)?;
    state.access.delete_role(query.id).await?;
    Ok(Json(ApiResponse::message(MSG_DELETED)))
}

pub async fn list_permissions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Permission>>>, ApiError> {
    user.require(permissions::ROLE_READ)?;
    let permissions = state.access.list_permissions().await?;
    Ok(Json(ApiResponse::success(permissions)))
}
