//! Labeled box repository trait (port)

use async_trait::async_trait;

use crate::domain::{
    DomainError, HistoryEntry, HistoryNote, Labeled, LabeledFilter, LabeledInput, LabeledSummary,
};
use crate::utils::{PageRequest, Paged};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LabeledRepository: Send + Sync {
    async fn list(
        &self,
        filter: &LabeledFilter,
        page: PageRequest,
    ) -> Result<Paged<LabeledSummary>, DomainError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Labeled>, DomainError>;
    async fn create(&self, input: &LabeledInput, note: &HistoryNote) -> Result<Labeled, DomainError>;
    /// Replaces the box's meter list.
    async fn update(
        &self,
        id: i32,
        input: &LabeledInput,
        note: &HistoryNote,
    ) -> Result<Labeled, DomainError>;
    async fn soft_delete(&self, id: i32, note: &HistoryNote) -> Result<(), DomainError>;
    async fn history(&self, id: i32) -> Result<Vec<HistoryEntry>, DomainError>;
}
