use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

use super::{begin_snapshot, push_contains, push_equals, push_page};
use crate::database::constraints::db_err;
use crate::database::history::{self, HistoryTable};
use crate::database::references::{ensure_live, LiveRef};
use crate::domain::labeled::MeterLabeledInput;
use crate::domain::{
    DomainError, HistoryAction, HistoryEntry, HistoryNote, Labeled, LabeledFilter, LabeledInput,
    LabeledSummary, MeterLabeled,
};
use crate::repositories::LabeledRepository;
use crate::utils::{PageRequest, Paged};

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.name, b.lot_id, l.name AS lot_name,
           (SELECT COUNT(*) FROM meter_labeled ml WHERE ml.labeled_id = b.id) AS meter_count,
           b.created_at
    FROM labeled b
    JOIN lots l ON l.id = b.lot_id
"#;

pub struct PgLabeledRepository {
    pool: PgPool,
}

impl PgLabeledRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: i32,
    name: String,
    lot_id: i32,
    lot_name: String,
    meter_count: i64,
    created_at: DateTime<Utc>,
}

impl From<SummaryRow> for LabeledSummary {
    fn from(row: SummaryRow) -> Self {
        LabeledSummary {
            id: row.id,
            name: row.name,
            lot_id: row.lot_id,
            lot_name: row.lot_name,
            meter_count: row.meter_count,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LabeledRow {
    id: i32,
    name: String,
    lot_id: i32,
    lot_name: String,
    created_by: i32,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct MeterRow {
    id: i32,
    serial: String,
    reading: f64,
}

fn not_found(id: i32) -> DomainError {
    DomainError::not_found(format!("Caja {} no encontrada", id))
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &LabeledFilter) {
    qb.push(" WHERE b.deleted_at IS NULL");
    push_contains(qb, "b.name", &filter.name);
    if let Some(serial) = filter.serial.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        qb.push(
            " AND EXISTS (SELECT 1 FROM meter_labeled ml \
             WHERE ml.labeled_id = b.id AND strpos(ml.serial, ",
        )
        .push_bind(serial.to_string())
        .push(") > 0)");
    }
    push_equals(qb, "b.lot_id", filter.lot_id);
}

async fn fetch_labeled(conn: &mut PgConnection, id: i32) -> Result<Option<Labeled>, sqlx::Error> {
    let row: Option<LabeledRow> = sqlx::query_as(
        r#"
        SELECT b.id, b.name, b.lot_id, l.name AS lot_name,
               b.created_by, b.created_at, b.updated_at
        FROM labeled b
        JOIN lots l ON l.id = b.lot_id
        WHERE b.id = $1 AND b.deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let meters: Vec<MeterRow> = sqlx::query_as(
        "SELECT id, serial, reading FROM meter_labeled WHERE labeled_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(Labeled {
        id: row.id,
        name: row.name,
        lot_id: row.lot_id,
        lot_name: row.lot_name,
        meters: meters
            .into_iter()
            .map(|m| MeterLabeled {
                id: m.id,
                serial: m.serial,
                reading: m.reading,
            })
            .collect(),
        created_by: row.created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

async fn insert_meters(
    conn: &mut PgConnection,
    labeled_id: i32,
    meters: &[MeterLabeledInput],
) -> Result<(), sqlx::Error> {
    if meters.is_empty() {
        return Ok(());
    }
    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO meter_labeled (labeled_id, serial, reading) ");
    qb.push_values(meters, |mut b, meter| {
        b.push_bind(labeled_id)
            .push_bind(meter.serial.clone())
            .push_bind(meter.reading);
    });
    qb.build().execute(conn).await?;
    Ok(())
}

#[async_trait]
impl LabeledRepository for PgLabeledRepository {
    async fn list(
        &self,
        filter: &LabeledFilter,
        page: PageRequest,
    ) -> Result<Paged<LabeledSummary>, DomainError> {
        let mut tx = begin_snapshot(&self.pool)
            .await
            .map_err(db_err("listing labeled boxes"))?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM labeled b");
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("counting labeled boxes"))?;

        let mut select = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_filters(&mut select, filter);
        push_page(&mut select, "b.created_at DESC, b.id DESC", page);
        let rows = select
            .build_query_as::<SummaryRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("listing labeled boxes"))?;

        tx.commit().await.map_err(db_err("listing labeled boxes"))?;
        Ok(Paged::new(rows.into_iter().map(LabeledSummary::from).collect(), total))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Labeled>, DomainError> {
        let mut conn = self.pool.acquire().await.map_err(db_err("finding labeled box"))?;
        fetch_labeled(&mut conn, id)
            .await
            .map_err(db_err("finding labeled box"))
    }

    async fn create(&self, input: &LabeledInput, note: &HistoryNote) -> Result<Labeled, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("creating labeled box"))?;
        ensure_live(&mut tx, LiveRef::Lot, input.lot_id).await?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO labeled (name, lot_id, created_by) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&input.name)
        .bind(input.lot_id)
        .bind(note.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("creating labeled box"))?;

        insert_meters(&mut tx, id, &input.meters)
            .await
            .map_err(db_err("creating labeled box"))?;
        history::append(&mut tx, HistoryTable::Labeled, id, HistoryAction::Create, note)
            .await
            .map_err(db_err("appending labeled history"))?;

        let labeled = fetch_labeled(&mut tx, id)
            .await
            .map_err(db_err("creating labeled box"))?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await.map_err(db_err("creating labeled box"))?;
        Ok(labeled)
    }

    async fn update(
        &self,
        id: i32,
        input: &LabeledInput,
        note: &HistoryNote,
    ) -> Result<Labeled, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("updating labeled box"))?;
        ensure_live(&mut tx, LiveRef::Lot, input.lot_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE labeled SET name = $1, lot_id = $2, updated_by = $3, updated_at = NOW()
            WHERE id = $4 AND deleted_at IS NULL
            "#,
        )
        .bind(&input.name)
        .bind(input.lot_id)
        .bind(note.user_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("updating labeled box"))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        sqlx::query("DELETE FROM meter_labeled WHERE labeled_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("updating labeled box"))?;
        insert_meters(&mut tx, id, &input.meters)
            .await
            .map_err(db_err("updating labeled box"))?;
        history::append(&mut tx, HistoryTable::Labeled, id, HistoryAction::Update, note)
            .await
            .map_err(db_err("appending labeled history"))?;

        let labeled = fetch_labeled(&mut tx, id)
            .await
            .map_err(db_err("updating labeled box"))?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await.map_err(db_err("updating labeled box"))?;
        Ok(labeled)
    }

    async fn soft_delete(&self, id: i32, note: &HistoryNote) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("deleting labeled box"))?;

        let result = sqlx::query(
            "UPDATE labeled SET deleted_at = NOW(), deleted_by = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(note.user_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("deleting labeled box"))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        history::append(&mut tx, HistoryTable::Labeled, id, HistoryAction::Delete, note)
            .await
            .map_err(db_err("appending labeled history"))?;

        tx.commit().await.map_err(db_err("deleting labeled box"))?;
        Ok(())
    }

    async fn history(&self, id: i32) -> Result<Vec<HistoryEntry>, DomainError> {
        history::list(&self.pool, HistoryTable::Labeled, id).await
    }
}
