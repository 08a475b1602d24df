use std::sync::Arc;
use tracing::info;

use crate::domain::{DomainError, Lot, LotDeletion, LotFilter, LotInput};
use crate::repositories::LotRepository;
use crate::utils::{PageRequest, Paged};

pub struct LotService {
    repo: Arc<dyn LotRepository>,
}

impl LotService {
    pub fn new(repo: Arc<dyn LotRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, filter: &LotFilter, page: PageRequest) -> Result<Paged<Lot>, DomainError> {
        self.repo.list(filter, page).await
    }

    pub async fn active(&self) -> Result<Lot, DomainError> {
        self.repo
            .find_active()
            .await?
            .ok_or_else(|| DomainError::not_found("No hay un lote activo."))
    }

    pub async fn create(&self, mut input: LotInput) -> Result<Lot, DomainError> {
        input.validate()?;
        let lot = self.repo.create(&input).await?;
        info!("Lot {} created (id={}, status={})", lot.name, lot.id, lot.status.as_str());
        Ok(lot)
    }

    pub async fn update(&self, id: i32, mut input: LotInput) -> Result<Lot, DomainError> {
        input.validate()?;
        let lot = self.repo.update(id, &input).await?;
        info!("Lot {} updated (status={})", id, lot.status.as_str());
        Ok(lot)
    }

    pub async fn activate(&self, id: i32) -> Result<Lot, DomainError> {
        let lot = self.repo.activate(id).await?;
        info!("Lot {} is now the active lot", id);
        Ok(lot)
    }

    pub async fn delete(&self, id: i32) -> Result<LotDeletion, DomainError> {
        let deletion = self.repo.delete(id).await?;
        match &deletion.promoted {
            Some(next) => info!("Lot {} deleted; lot {} promoted to active", id, next.id),
            None => info!("Lot {} deleted", id),
        }
        Ok(deletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LotStatus;
    use crate::repositories::MockLotRepository;
    use chrono::{NaiveDate, Utc};

    fn lot_input(name: &str, status: Option<LotStatus>) -> LotInput {
        LotInput {
            name: name.into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            status,
        }
    }

    fn lot(id: i32, status: LotStatus) -> Lot {
        Lot {
            id,
            name: format!("Lote {}", id),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            status,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn inverted_dates_are_rejected() {
        let repo = MockLotRepository::new();
        let service = LotService::new(Arc::new(repo));
        let mut input = lot_input("Lote A", None);
        input.end_date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        assert!(matches!(service.create(input).await, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn create_passes_trimmed_name_and_status() {
        let mut repo = MockLotRepository::new();
        repo.expect_create()
            .withf(|input| input.name == "Lote A" && input.status == Some(LotStatus::Active))
            .times(1)
            .returning(|_| Ok(lot(1, LotStatus::Active)));

        let service = LotService::new(Arc::new(repo));
        let created = service
            .create(lot_input("  Lote A ", Some(LotStatus::Active)))
            .await
            .unwrap();
        assert!(created.status.is_active());
    }

    #[tokio::test]
    async fn no_active_lot_is_not_found() {
        let mut repo = MockLotRepository::new();
        repo.expect_find_active().returning(|| Ok(None));
        let service = LotService::new(Arc::new(repo));
        assert!(matches!(service.active().await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_reports_promoted_successor() {
        let mut repo = MockLotRepository::new();
        repo.expect_delete().returning(|id| {
            Ok(LotDeletion {
                deleted: lot(id, LotStatus::Inactive),
                promoted: Some(lot(3, LotStatus::Active)),
            })
        });

        let service = LotService::new(Arc::new(repo));
        let deletion = service.delete(1).await.unwrap();
        assert_eq!(deletion.promoted.map(|l| l.id), Some(3));
    }
}
