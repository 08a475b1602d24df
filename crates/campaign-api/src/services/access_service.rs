//! Login, users, roles and permissions

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{JwtManager, PasswordService, TokenSubject};
use crate::domain::access::{ADMIN_ROLE, ADMIN_USERNAME, MIN_PASSWORD_LENGTH};
use crate::domain::{
    DomainError, Permission, Role, RoleInput, User, UserFilter, UserInput, UserRecord,
    UserSession,
};
use crate::repositories::AccessRepository;
use crate::utils::{PageRequest, Paged};

#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: User,
    pub permissions: Vec<String>,
}

pub struct AccessService {
    repo: Arc<dyn AccessRepository>,
    jwt: Arc<JwtManager>,
}

fn hash_password(password: &str) -> Result<String, DomainError> {
    PasswordService::hash(password).map_err(|e| DomainError::Internal(e.to_string()))
}

impl AccessService {
    pub fn new(repo: Arc<dyn AccessRepository>, jwt: Arc<JwtManager>) -> Self {
        Self { repo, jwt }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, DomainError> {
        let username = username.trim();
        info!("Login attempt for user: {}", username);

        let credentials = self.repo.find_credentials(username).await?.ok_or_else(|| {
            warn!("Login failed: unknown user {}", username);
            DomainError::InvalidCredentials
        })?;

        let valid = PasswordService::verify(password, &credentials.password_hash).unwrap_or_else(|e| {
            error!("Stored password hash for {} is unreadable: {}", username, e);
            false
        });
        if !valid {
            warn!("Login failed: invalid password for {}", username);
            return Err(DomainError::InvalidCredentials);
        }

        let user = credentials.user;
        let token = self
            .jwt
            .generate_token(&TokenSubject {
                user_id: user.id,
                username: &user.username,
                role: &user.role_name,
                permissions: &credentials.permissions,
            })
            .map_err(|e| DomainError::Internal(format!("token generation failed: {}", e)))?;

        info!("Login successful for: {}", username);
        Ok(LoginResult {
            token,
            token_type: "Bearer",
            expires_in: self.jwt.expiration_seconds(),
            user,
            permissions: credentials.permissions,
        })
    }

    /// Creates the `admin` account on an empty users table.
    pub async fn ensure_admin(&self, password: Option<&str>) -> Result<(), DomainError> {
        if self.repo.count_users().await? > 0 {
            return Ok(());
        }
        let Some(password) = password.filter(|p| p.chars().count() >= MIN_PASSWORD_LENGTH) else {
            warn!(
                "No users exist and no usable auth.bootstrap_admin_password is configured; \
                 nobody can log in"
            );
            return Ok(());
        };

        let role = self
            .repo
            .find_role_by_name(ADMIN_ROLE)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("role '{}' is not seeded", ADMIN_ROLE)))?;

        let user = self
            .repo
            .create_user(&UserRecord {
                username: ADMIN_USERNAME.to_string(),
                name: ADMIN_ROLE.to_string(),
                password_hash: Some(hash_password(password)?),
                role_id: role.id,
            })
            .await?;
        info!("Bootstrap user '{}' created (id={})", user.username, user.id);
        Ok(())
    }

    /// Current state of a token's user; deleted users get no session.
    pub async fn session(&self, user_id: i32) -> Result<Option<UserSession>, DomainError> {
        let session = self.repo.find_session(user_id).await?;
        if session.is_none() {
            warn!("Token presented for deleted or unknown user {}", user_id);
        }
        Ok(session)
    }

    pub async fn me(&self, user_id: i32) -> Result<User, DomainError> {
        self.repo
            .find_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Usuario {} no encontrado", user_id)))
    }

    pub async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Paged<User>, DomainError> {
        self.repo.list_users(filter, page).await
    }

    pub async fn create_user(&self, mut input: UserInput) -> Result<User, DomainError> {
        input.validate(true)?;
        let password_hash = input.password.as_deref().map(hash_password).transpose()?;
        let user = self
            .repo
            .create_user(&UserRecord {
                username: input.username,
                name: input.name,
                password_hash,
                role_id: input.role_id,
            })
            .await?;
        info!("User {} created (id={})", user.username, user.id);
        Ok(user)
    }

    pub async fn update_user(&self, id: i32, mut input: UserInput) -> Result<User, DomainError> {
        input.validate(false)?;
        let password_hash = input.password.as_deref().map(hash_password).transpose()?;
        let user = self
            .repo
            .update_user(
                id,
                &UserRecord {
                    username: input.username,
                    name: input.name,
                    password_hash,
                    role_id: input.role_id,
                },
            )
            .await?;
        info!("User {} updated", id);
        Ok(user)
    }

    pub async fn delete_user(&self, id: i32, actor: i32) -> Result<(), DomainError> {
        if id == actor {
            return Err(DomainError::validation("No puede eliminar su propio usuario."));
        }
        self.repo.delete_user(id).await?;
        info!("User {} deleted by user {}", id, actor);
        Ok(())
    }

    pub async fn list_roles(&self, page: PageRequest) -> Result<Paged<Role>, DomainError> {
        self.repo.list_roles(page).await
    }

    pub async fn create_role(&self, mut input: RoleInput) -> Result<Role, DomainError> {
        input.validate()?;
        let role = self.repo.create_role(&input).await?;
        info!("Role {} created with {} permissions", role.name, role.permissions.len());
        Ok(role)
    }

    pub async fn update_role(&self, id: i32, mut input: RoleInput) -> Result<Role, DomainError> {
        input.validate()?;
        let role = self.repo.update_role(id, &input).await?;
        info!("Role {} updated", id);
        Ok(role)
    }

    pub async fn delete_role(&self, id: i32) -> Result<(), DomainError> {
        self.repo.delete_role(id).await?;
        info!("Role {} deleted", id);
        Ok(())
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, DomainError> {
        self.repo.list_permissions().await
    }
}
