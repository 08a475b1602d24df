//! PreCatastral repository trait (port)

use async_trait::async_trait;

use crate::domain::{
    DomainError, HistoryEntry, HistoryNote, PreCatastral, PreCatastralFilter, PreCatastralInput,
};
use crate::utils::{PageRequest, Paged};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreCatastralRepository: Send + Sync {
    async fn list(
        &self,
        filter: &PreCatastralFilter,
        page: PageRequest,
    ) -> Result<Paged<PreCatastral>, DomainError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<PreCatastral>, DomainError>;
    async fn create(
        &self,
        input: &PreCatastralInput,
        note: &HistoryNote,
    ) -> Result<PreCatastral, DomainError>;
    async fn update(
        &self,
        id: i32,
        input: &PreCatastralInput,
        note: &HistoryNote,
    ) -> Result<PreCatastral, DomainError>;
    async fn soft_delete(&self, id: i32, note: &HistoryNote) -> Result<(), DomainError>;
    async fn history(&self, id: i32) -> Result<Vec<HistoryEntry>, DomainError>;
}
