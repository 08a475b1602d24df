//! Act repository trait (port)

use async_trait::async_trait;

use crate::domain::{Act, ActFilter, ActInput, DomainError, HistoryEntry, HistoryNote};
use crate::utils::{PageRequest, Paged};

/// Every mutation writes the act row and its history row atomically.
/// Uniqueness of file number, customer and meter among live acts is
/// reported as the matching `DomainError` guard variant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActRepository: Send + Sync {
    async fn list(&self, filter: &ActFilter, page: PageRequest) -> Result<Paged<Act>, DomainError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Act>, DomainError>;
    async fn create(&self, input: &ActInput, note: &HistoryNote) -> Result<Act, DomainError>;
    async fn update(&self, id: i32, input: &ActInput, note: &HistoryNote) -> Result<Act, DomainError>;
    async fn soft_delete(&self, id: i32, note: &HistoryNote) -> Result<(), DomainError>;
    async fn history(&self, id: i32) -> Result<Vec<HistoryEntry>, DomainError>;
}
