//! Batched spreadsheet export

pub mod workbook;

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::report::report_filename;
use crate::domain::{DomainError, ReportFilter, ReportKind, ReportQuery};
use crate::repositories::ReportRepository;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug)]
pub struct ReportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub total: usize,
}

pub struct ReportService {
    repo: Arc<dyn ReportRepository>,
    batch_size: i64,
}

impl ReportService {
    pub fn new(repo: Arc<dyn ReportRepository>, batch_size: i64) -> Self {
        Self {
            repo,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn export(&self, kind: ReportKind, query: &ReportQuery) -> Result<ReportFile, DomainError> {
        let filter = ReportFilter::from_query(query)?;
        let rows = self.repo.fetch_all(kind, &filter, self.batch_size).await?;
        debug!("Report {:?} collected {} rows", kind, rows.len());
        if rows.is_empty() {
            return Err(DomainError::not_found(
                "No se encontraron registros para los criterios indicados.",
            ));
        }

        let filename = report_filename(kind, &filter, &rows);
        let total = rows.len();
        let bytes = tokio::task::spawn_blocking(move || workbook::build(kind, &rows))
            .await
            .map_err(|e| DomainError::Internal(format!("report task failed: {}", e)))??;

        info!("Report {} generated: {} rows, {} bytes", filename, total, bytes.len());
        Ok(ReportFile {
            filename,
            bytes,
            total,
        })
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReportRow;
    use crate::repositories::MockReportRepository;
    use chrono::NaiveDate;
    use mockall::predicate::eq;

    fn row(n: usize) -> ReportRow {
        ReportRow {
            file_number: format!("{}", 1000 + n),
            lot_name: "Lote 1".into(),
            recorded_at: NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            customer_name: "Ana Quispe".into(),
            address: "Jr. Lima 123".into(),
            old_meter: Some("OLD-1".into()),
            new_meter: Some(format!("NEW-{}", n)),
            technician_name: "Luis Ramos".into(),
            last_user: Some("admin".into()),
        }
    }

    fn range_query() -> ReportQuery {
        ReportQuery {
            start: Some("2024-01-01".into()),
            end: Some("2024-01-31".into()),
            lot_id: None,
        }
    }

    #[tokio::test]
    async fn fetches_with_configured_batch_size() {
        let mut repo = MockReportRepository::new();
        repo.expect_fetch_all()
            .with(eq(ReportKind::Acts), mockall::predicate::always(), eq(2))
            .times(1)
            .returning(|_, _, _| Ok(vec![row(1), row(2), row(3)]));

        let service = ReportService::new(Arc::new(repo), 2);
        let file = service.export(ReportKind::Acts, &range_query()).await.unwrap();
        assert_eq!(file.total, 3);
        assert_eq!(file.filename, "reporte_actas_2024-01-01_a_2024-01-31.xlsx");
        assert_eq!(&file.bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn empty_result_is_not_found() {
        let mut repo = MockReportRepository::new();
        repo.expect_fetch_all().returning(|_, _, _| Ok(vec![]));

        let service = ReportService::new(Arc::new(repo), 1000);
        let err = service
            .export(ReportKind::PreCatastrals, &range_query())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_range_is_rejected_without_querying() {
        let mut repo = MockReportRepository::new();
        repo.expect_fetch_all().never();

        let service = ReportService::new(Arc::new(repo), 1000);
        let err = service
            .export(ReportKind::Acts, &ReportQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
