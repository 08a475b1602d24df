use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::pre_catastral::{creation_detail, deletion_detail, update_detail};
use crate::domain::{
    DomainError, HistoryEntry, HistoryNote, PreCatastral, PreCatastralFilter, PreCatastralInput,
};
use crate::repositories::PreCatastralRepository;
use crate::utils::{PageRequest, Paged};

pub struct PreCatastralService {
    repo: Arc<dyn PreCatastralRepository>,
}

impl PreCatastralService {
    pub fn new(repo: Arc<dyn PreCatastralRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        filter: &PreCatastralFilter,
        page: PageRequest,
    ) -> Result<Paged<PreCatastral>, DomainError> {
        self.repo.list(filter, page).await
    }

    pub async fn get(&self, id: i32) -> Result<PreCatastral, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Precatastral {} no encontrado", id)))
    }

    pub async fn create(&self, mut input: PreCatastralInput, actor: i32) -> Result<PreCatastral, DomainError> {
        input.validate()?;
        let note = HistoryNote::new(actor, creation_detail(&input));

        let record = self.repo.create(&input, &note).await.inspect_err(|e| {
            warn!("PreCatastral {} rejected: {}", input.file_number, e);
        })?;
        info!("PreCatastral {} created (id={}) by user {}", record.file_number, record.id, actor);
        Ok(record)
    }

    pub async fn update(
        &self,
        id: i32,
        mut input: PreCatastralInput,
        actor: i32,
    ) -> Result<PreCatastral, DomainError> {
        input.validate()?;
        let current = self.get(id).await?;
        let note = HistoryNote::new(actor, update_detail(&current, &input));

        let record = self.repo.update(id, &input, &note).await.inspect_err(|e| {
            warn!("PreCatastral {} update rejected: {}", id, e);
        })?;
        info!("PreCatastral {} updated by user {}", id, actor);
        Ok(record)
    }

    pub async fn delete(&self, id: i32, actor: i32) -> Result<(), DomainError> {
        let current = self.get(id).await?;
        let note = HistoryNote::new(actor, deletion_detail(&current));
        self.repo.soft_delete(id, &note).await?;
        info!("PreCatastral {} deleted by user {}", id, actor);
        Ok(())
    }

    pub async fn history(&self, id: i32) -> Result<Vec<HistoryEntry>, DomainError> {
        self.repo.history(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pre_catastral::fixtures::{input, record};
    use crate::repositories::MockPreCatastralRepository;

    #[tokio::test]
    async fn customer_already_linked_is_propagated() {
        let mut repo = MockPreCatastralRepository::new();
        repo.expect_create()
            .returning(|_, _| Err(DomainError::CustomerAlreadyLinked));

        let service = PreCatastralService::new(Arc::new(repo));
        let err = service.create(input("P-01"), 2).await.unwrap_err();
        assert!(matches!(err, DomainError::CustomerAlreadyLinked));
    }

    #[tokio::test]
    async fn update_of_deleted_record_is_not_found() {
        let mut repo = MockPreCatastralRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_update().never();

        let service = PreCatastralService::new(Arc::new(repo));
        let err = service.update(4, input("P-01"), 2).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_returns_stored_record() {
        let mut repo = MockPreCatastralRepository::new();
        repo.expect_create()
            .withf(|_, note| note.detail == "Precatastral creado con ficha P-01")
            .returning(|_, _| Ok(record(3, "P-01")));

        let service = PreCatastralService::new(Arc::new(repo));
        assert_eq!(service.create(input("P-01"), 2).await.unwrap().id, 3);
    }
}
