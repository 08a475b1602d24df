use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::begin_snapshot;
use crate::database::constraints::db_err;
use crate::domain::{DomainError, ReportFilter, ReportKind, ReportRow};
use crate::repositories::ReportRepository;

const ACT_REPORT: &str = r#"
    SELECT a.file_number, l.name AS lot_name, a.installed_at AS recorded_at,
           c.name AS customer_name, c.address, c.prior_meter AS old_meter,
           m.serial AS new_meter, t.name AS technician_name, h.username AS last_user
    FROM acts a
    JOIN lots l ON l.id = a.lot_id
    JOIN customers c ON c.id = a.customer_id
    JOIN meter_renovations m ON m.id = a.meter_id
    JOIN technicians t ON t.id = a.technician_id
    LEFT JOIN LATERAL (
        SELECT u.username
        FROM act_history ah
        JOIN users u ON u.id = ah.user_id
        WHERE ah.act_id = a.id
        ORDER BY ah.created_at DESC, ah.id DESC
        LIMIT 1
    ) h ON TRUE
    WHERE a.deleted_at IS NULL
"#;

const PRE_CATASTRAL_REPORT: &str = r#"
    SELECT p.file_number, l.name AS lot_name, p.surveyed_at AS recorded_at,
           c.name AS customer_name, c.address, c.prior_meter AS old_meter,
           NULL::TEXT AS new_meter, t.name AS technician_name, h.username AS last_user
    FROM pre_catastrals p
    JOIN lots l ON l.id = p.lot_id
    JOIN customers c ON c.id = p.customer_id
    JOIN technicians t ON t.id = p.technician_id
    LEFT JOIN LATERAL (
        SELECT u.username
        FROM pre_catastral_history ph
        JOIN users u ON u.id = ph.user_id
        WHERE ph.pre_catastral_id = p.id
        ORDER BY ph.created_at DESC, ph.id DESC
        LIMIT 1
    ) h ON TRUE
    WHERE p.deleted_at IS NULL
"#;

pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReportDbRow {
    file_number: String,
    lot_name: String,
    recorded_at: NaiveDateTime,
    customer_name: String,
    address: String,
    old_meter: Option<String>,
    new_meter: Option<String>,
    technician_name: String,
    last_user: Option<String>,
}

impl From<ReportDbRow> for ReportRow {
    fn from(row: ReportDbRow) -> Self {
        ReportRow {
            file_number: row.file_number,
            lot_name: row.lot_name,
            recorded_at: row.recorded_at,
            customer_name: row.customer_name,
            address: row.address,
            old_meter: row.old_meter,
            new_meter: row.new_meter,
            technician_name: row.technician_name,
            last_user: row.last_user,
        }
    }
}

/// Builds the page query for one report kind.
fn report_query(
    kind: ReportKind,
    filter: &ReportFilter,
    offset: i64,
    limit: i64,
) -> QueryBuilder<'static, Postgres> {
    let (base, alias, date_column) = match kind {
        ReportKind::Acts => (ACT_REPORT, "a", "installed_at"),
        ReportKind::PreCatastrals => (PRE_CATASTRAL_REPORT, "p", "surveyed_at"),
    };

    let mut qb = QueryBuilder::new(base);
    match filter {
        ReportFilter::DateRange { start, end } => {
            let (from, until) = ReportFilter::bounds(*start, *end);
            qb.push(format!(" AND {}.{} >= ", alias, date_column))
                .push_bind(from)
                .push(format!(" AND {}.{} < ", alias, date_column))
                .push_bind(until);
        }
        ReportFilter::Lot(lot_id) => {
            qb.push(format!(" AND {}.lot_id = ", alias)).push_bind(*lot_id);
        }
    }
    qb.push(format!(
        " ORDER BY {alias}.{date_column}, {alias}.id LIMIT ",
        alias = alias,
        date_column = date_column
    ))
    .push_bind(limit)
    .push(" OFFSET ")
    .push_bind(offset);
    qb
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn fetch_all(
        &self,
        kind: ReportKind,
        filter: &ReportFilter,
        batch_size: i64,
    ) -> Result<Vec<ReportRow>, DomainError> {
        let batch_size = batch_size.max(1);
        // Offsets stay consistent only while every batch sees the same snapshot.
        let mut tx = begin_snapshot(&self.pool)
            .await
            .map_err(db_err("opening report snapshot"))?;

        let mut rows = Vec::new();
        let mut offset = 0;
        loop {
            let batch = report_query(kind, filter, offset, batch_size)
                .build_query_as::<ReportDbRow>()
                .fetch_all(&mut *tx)
                .await
                .map_err(db_err("fetching report batch"))?;
            let fetched = batch.len() as i64;
            debug!("Report {:?} batch at offset {}: {} rows", kind, offset, fetched);
            rows.extend(batch.into_iter().map(ReportRow::from));
            if fetched < batch_size {
                break;
            }
            offset += batch_size;
            tokio::task::yield_now().await;
        }

        tx.commit().await.map_err(db_err("closing report snapshot"))?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn date_range_filters_on_the_record_date() {
        let filter = ReportFilter::DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        let qb = report_query(ReportKind::PreCatastrals, &filter, 0, 1000);
        let sql = qb.sql();
        assert!(sql.contains("AND p.surveyed_at >= $1 AND p.surveyed_at < $2"));
        assert!(sql.ends_with("ORDER BY p.surveyed_at, p.id LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn lot_filter_binds_lot_id() {
        let qb = report_query(ReportKind::Acts, &ReportFilter::Lot(7), 1000, 1000);
        assert!(qb.sql().contains("AND a.lot_id = $1"));
        assert!(qb.sql().contains("FROM act_history ah"));
    }
}
