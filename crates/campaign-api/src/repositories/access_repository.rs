//! User, role and permission repository trait (port)

use async_trait::async_trait;

use crate::domain::{
    DomainError, Permission, Role, RoleInput, User, UserCredentials, UserFilter, UserRecord,
    UserSession,
};
use crate::utils::{PageRequest, Paged};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessRepository: Send + Sync {
    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, DomainError>;
    async fn find_user(&self, id: i32) -> Result<Option<User>, DomainError>;
    /// `None` once the user (or their role) has been deleted.
    async fn find_session(&self, user_id: i32) -> Result<Option<UserSession>, DomainError>;
    async fn count_users(&self) -> Result<i64, DomainError>;
    async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Paged<User>, DomainError>;
    async fn create_user(&self, record: &UserRecord) -> Result<User, DomainError>;
    /// A `None` password hash keeps the stored one.
    async fn update_user(&self, id: i32, record: &UserRecord) -> Result<User, DomainError>;
    async fn delete_user(&self, id: i32) -> Result<(), DomainError>;

    async fn list_roles(&self, page: PageRequest) -> Result<Paged<Role>, DomainError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DomainError>;
    /// Writes the role and replaces its permission set in one transaction.
    async fn create_role(&self, input: &RoleInput) -> Result<Role, DomainError>;
    async fn update_role(&self, id: i32, input: &RoleInput) -> Result<Role, DomainError>;
    /// Fails with a validation error while live users still hold the role.
    async fn delete_role(&self, id: i32) -> Result<(), DomainError>;
    async fn list_permissions(&self) -> Result<Vec<Permission>, DomainError>;
}
