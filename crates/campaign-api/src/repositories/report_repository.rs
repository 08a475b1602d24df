//! Report source trait (port)

use async_trait::async_trait;

use crate::domain::{DomainError, ReportFilter, ReportKind, ReportRow};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Every matching row in a stable order, read from a single snapshot
    /// in batches of `batch_size`.
    async fn fetch_all(
        &self,
        kind: ReportKind,
        filter: &ReportFilter,
        batch_size: i64,
    ) -> Result<Vec<ReportRow>, DomainError>;
}
