//! Lot repository trait (port)

use async_trait::async_trait;

use crate::domain::{DomainError, Lot, LotDeletion, LotFilter, LotInput};
use crate::utils::{PageRequest, Paged};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LotRepository: Send + Sync {
    async fn list(&self, filter: &LotFilter, page: PageRequest) -> Result<Paged<Lot>, DomainError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Lot>, DomainError>;
    async fn find_active(&self) -> Result<Option<Lot>, DomainError>;
    /// Inserts the lot; an ACTIVE status activates it in the same transaction.
    async fn create(&self, input: &LotInput) -> Result<Lot, DomainError>;
    async fn update(&self, id: i32, input: &LotInput) -> Result<Lot, DomainError>;
    /// Makes `id` the only ACTIVE lot. Idempotent.
    async fn activate(&self, id: i32) -> Result<Lot, DomainError>;
    /// Soft-deletes the lot and promotes a successor when it was ACTIVE.
    async fn delete(&self, id: i32) -> Result<LotDeletion, DomainError>;
}
