//! Act registration with uniqueness guard and audit trail

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::act::{creation_detail, deletion_detail, update_detail};
use crate::domain::{Act, ActFilter, ActInput, DomainError, HistoryEntry, HistoryNote};
use crate::repositories::ActRepository;
use crate::utils::{PageRequest, Paged};

pub struct ActService {
    repo: Arc<dyn ActRepository>,
}

impl ActService {
    pub fn new(repo: Arc<dyn ActRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, filter: &ActFilter, page: PageRequest) -> Result<Paged<Act>, DomainError> {
        self.repo.list(filter, page).await
    }

    pub async fn get(&self, id: i32) -> Result<Act, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Acta {} no encontrada", id)))
    }

    pub async fn create(&self, mut input: ActInput, actor: i32) -> Result<Act, DomainError> {
        input.validate()?;
        let note = HistoryNote::new(actor, creation_detail(&input));

        let act = self.repo.create(&input, &note).await.inspect_err(|e| {
            warn!("Act {} rejected: {}", input.file_number, e);
        })?;
        info!("Act {} created (id={}) by user {}", act.file_number, act.id, actor);
        Ok(act)
    }

    pub async fn update(&self, id: i32, mut input: ActInput, actor: i32) -> Result<Act, DomainError> {
        input.validate()?;
        let current = self.get(id).await?;
        let note = HistoryNote::new(actor, update_detail(&current, &input));

        let act = self.repo.update(id, &input, &note).await.inspect_err(|e| {
            warn!("Act {} update rejected: {}", id, e);
        })?;
        info!("Act {} updated by user {}", id, actor);
        Ok(act)
    }

    pub async fn delete(&self, id: i32, actor: i32) -> Result<(), DomainError> {
        let current = self.get(id).await?;
        let note = HistoryNote::new(actor, deletion_detail(&current));
        self.repo.soft_delete(id, &note).await?;
        info!("Act {} deleted by user {}", id, actor);
        Ok(())
    }

    pub async fn history(&self, id: i32) -> Result<Vec<HistoryEntry>, DomainError> {
        self.repo.history(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::act::fixtures::{act, input};
    use crate::repositories::MockActRepository;

    #[tokio::test]
    async fn create_records_creation_note_for_actor() {
        let mut repo = MockActRepository::new();
        repo.expect_create()
            .withf(|input, note| {
                input.file_number == "1001"
                    && note.user_id == 2
                    && note.detail == "Acta creada con ficha 1001"
            })
            .times(1)
            .returning(|_, _| Ok(act(1, "1001")));

        let service = ActService::new(Arc::new(repo));
        let created = service.create(input(" 1001 "), 2).await.unwrap();
        assert_eq!(created.id, 1);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_repository() {
        let repo = MockActRepository::new();
        let service = ActService::new(Arc::new(repo));

        let mut bad = input("1001");
        bad.customer_id = 0;
        assert!(matches!(service.create(bad, 2).await, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_file_number_propagates_guard_error() {
        let mut repo = MockActRepository::new();
        repo.expect_create()
            .returning(|_, _| Err(DomainError::DuplicateFileNumber));

        let service = ActService::new(Arc::new(repo));
        let err = service.create(input("1001"), 2).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateFileNumber));
    }

    #[tokio::test]
    async fn update_describes_changes_against_current_row() {
        let mut repo = MockActRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(act(id, "1001"))));
        repo.expect_update()
            .withf(|id, _, note| *id == 5 && note.detail == "Acta 1002 actualizada (ficha: 1001 -> 1002)")
            .times(1)
            .returning(|id, _, _| Ok(act(id, "1002")));

        let service = ActService::new(Arc::new(repo));
        let updated = service.update(5, input("1002"), 3).await.unwrap();
        assert_eq!(updated.file_number, "1002");
    }

    #[tokio::test]
    async fn deleting_missing_act_is_not_found() {
        let mut repo = MockActRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_soft_delete().never();

        let service = ActService::new(Arc::new(repo));
        assert!(matches!(service.delete(9, 2).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_notes_deleting_user() {
        let mut repo = MockActRepository::new();
        repo.expect_find_by_id().returning(|id| Ok(Some(act(id, "1001"))));
        repo.expect_soft_delete()
            .withf(|id, note| *id == 5 && note.user_id == 2 && note.detail.contains("1001"))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = ActService::new(Arc::new(repo));
        service.delete(5, 2).await.unwrap();
    }
}
