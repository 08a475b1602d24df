use axum::{extract::State, Json};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::domain::User;
use crate::services::LoginResult;
use crate::state::AppState;
use crate::utils::{ApiError, ApiJson, ApiResponse};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let result = state.access.login(&req.username, &req.password).await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let me = state.access.me(user.user_id).await?;
    Ok(Json(ApiResponse::success(me)))
}
