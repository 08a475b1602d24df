use std::sync::Arc;
use tracing::info;

use crate::domain::labeled::{creation_detail, deletion_detail, update_detail};
use crate::domain::{
    DomainError, HistoryEntry, HistoryNote, Labeled, LabeledFilter, LabeledInput, LabeledSummary,
};
use crate::repositories::LabeledRepository;
use crate::utils::{PageRequest, Paged};

pub struct LabeledService {
    repo: Arc<dyn LabeledRepository>,
}

impl LabeledService {
    pub fn new(repo: Arc<dyn LabeledRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        filter: &LabeledFilter,
        page: PageRequest,
    ) -> Result<Paged<LabeledSummary>, DomainError> {
        self.repo.list(filter, page).await
    }

    pub async fn get(&self, id: i32) -> Result<Labeled, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Caja {} no encontrada", id)))
    }

    pub async fn create(&self, mut input: LabeledInput, actor: i32) -> Result<Labeled, DomainError> {
        input.validate()?;
        let note = HistoryNote::new(actor, creation_detail(&input));
        let labeled = self.repo.create(&input, &note).await?;
        info!(
            "Labeled box {} created with {} meters by user {}",
            labeled.name,
            labeled.meters.len(),
            actor
        );
        Ok(labeled)
    }

    pub async fn update(&self, id: i32, mut input: LabeledInput, actor: i32) -> Result<Labeled, DomainError> {
        input.validate()?;
        let current = self.get(id).await?;
        let note = HistoryNote::new(actor, update_detail(&current, &input));
        let labeled = self.repo.update(id, &input, &note).await?;
        info!("Labeled box {} updated by user {}", id, actor);
        Ok(labeled)
    }

    pub async fn delete(&self, id: i32, actor: i32) -> Result<(), DomainError> {
        let current = self.get(id).await?;
        let note = HistoryNote::new(actor, deletion_detail(&current));
        self.repo.soft_delete(id, &note).await?;
        info!("Labeled box {} deleted by user {}", id, actor);
        Ok(())
    }

    pub async fn history(&self, id: i32) -> Result<Vec<HistoryEntry>, DomainError> {
        self.repo.history(id).await
    }
}
