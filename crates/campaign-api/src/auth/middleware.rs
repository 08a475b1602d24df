use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use tracing::warn;

use crate::domain::UserSession;
use crate::state::AppState;
use crate::utils::ApiError;

/// Session resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl From<UserSession> for AuthUser {
    fn from(session: UserSession) -> Self {
        Self {
            user_id: session.user.id,
            username: session.user.username,
            role: session.user.role_name,
            permissions: session.permissions,
        }
    }
}

impl AuthUser {
    pub fn has(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn require(&self, permission: &str) -> Result<(), ApiError> {
        if self.has(permission) {
            Ok(())
        } else {
            warn!("User {} lacks permission {}", self.user_id, permission);
            Err(ApiError::Forbidden(format!(
                "No tiene permiso para esta acción ({}).",
                permission
            )))
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Debe iniciar sesión.".to_string()))?;

        let claims = state.jwt.validate_token(token).map_err(|e| {
            warn!("Rejected session token: {}", e);
            ApiError::Unauthorized("Sesión inválida o expirada.".to_string())
        })?;

        // Token claims only identify the user; deletion and role edits apply immediately.
        let session = state
            .access
            .session(claims.user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Sesión inválida o expirada.".to_string()))?;

        Ok(session.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(permissions: &[&str]) -> AuthUser {
        AuthUser {
            user_id: 2,
            username: "jperez".into(),
            role: "Supervisor".into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn require_checks_exact_key() {
        let u = user(&["act.read"]);
        assert!(u.require("act.read").is_ok());
        assert!(matches!(u.require("act.write"), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn bearer_prefix_is_required() {
        let (mut parts, _) = axum::http::Request::builder()
            .header(AUTHORIZATION, "Token abc")
            .body(())
            .unwrap()
            .into_parts();
        assert!(bearer_token(&parts).is_none());

        parts
            .headers
            .insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&parts), Some("abc"));
    }
}
