//! Repository traits (ports)

pub mod access_repository;
pub mod act_repository;
pub mod catalog_repository;
pub mod labeled_repository;
pub mod lot_repository;
pub mod pre_catastral_repository;
pub mod report_repository;

pub use access_repository::AccessRepository;
pub use act_repository::ActRepository;
pub use catalog_repository::CatalogRepository;
pub use labeled_repository::LabeledRepository;
pub use lot_repository::LotRepository;
pub use pre_catastral_repository::PreCatastralRepository;
pub use report_repository::ReportRepository;

#[cfg(test)]
pub use access_repository::MockAccessRepository;
#[cfg(test)]
pub use act_repository::MockActRepository;
#[cfg(test)]
pub use catalog_repository::MockCatalogRepository;
#[cfg(test)]
pub use labeled_repository::MockLabeledRepository;
#[cfg(test)]
pub use lot_repository::MockLotRepository;
#[cfg(test)]
pub use pre_catastral_repository::MockPreCatastralRepository;
#[cfg(test)]
pub use report_repository::MockReportRepository;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Readiness check for the backing store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), DomainError>;
}
