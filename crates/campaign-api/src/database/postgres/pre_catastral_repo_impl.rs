use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{begin_snapshot, push_contains, push_equals, push_page};
use crate::database::constraints::db_err;
use crate::database::history::{self, HistoryTable};
use crate::database::references::{ensure_all_live, LiveRef};
use crate::domain::{
    DomainError, HistoryAction, HistoryEntry, HistoryNote, PreCatastral,
    PreCatastralFilter, PreCatastralInput,
};
use crate::repositories::PreCatastralRepository;
use crate::utils::{PageRequest, Paged};

const PRE_CATASTRAL_SELECT: &str = r#"
    SELECT p.id, p.file_number, p.surveyed_at, p.reading, p.observation,
           p.customer_id, c.inscription AS customer_inscription, c.name AS customer_name,
           p.technician_id, t.name AS technician_name,
           p.lot_id, l.name AS lot_name,
           p.created_by, p.updated_by, p.created_at, p.updated_at
    FROM pre_catastrals p
    JOIN customers c ON c.id = p.customer_id
    JOIN technicians t ON t.id = p.technician_id
    JOIN lots l ON l.id = p.lot_id
"#;

const PRE_CATASTRAL_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM pre_catastrals p
    JOIN customers c ON c.id = p.customer_id
"#;

pub struct PgPreCatastralRepository {
    pool: PgPool,
}

impl PgPreCatastralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PreCatastralRow {
    id: i32,
    file_number: String,
    surveyed_at: NaiveDateTime,
    reading: Option<f64>,
    observation: String,
    customer_id: i32,
    customer_inscription: String,
    customer_name: String,
    technician_id: i32,
    technician_name: String,
    lot_id: i32,
    lot_name: String,
    created_by: i32,
    updated_by: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<PreCatastralRow> for PreCatastral {
    fn from(row: PreCatastralRow) -> Self {
        PreCatastral {
            id: row.id,
            file_number: row.file_number,
            surveyed_at: row.surveyed_at,
            reading: row.reading,
            observation: row.observation.parse().unwrap_or_default(),
            customer_id: row.customer_id,
            customer_inscription: row.customer_inscription,
            customer_name: row.customer_name,
            technician_id: row.technician_id,
            technician_name: row.technician_name,
            lot_id: row.lot_id,
            lot_name: row.lot_name,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &PreCatastralFilter) {
    qb.push(" WHERE p.deleted_at IS NULL");
    push_contains(qb, "p.file_number", &filter.file_number);
    push_contains(qb, "c.inscription", &filter.inscription);
    push_equals(qb, "p.lot_id", filter.lot_id);
}

async fn fetch_pre_catastral<'e, E>(executor: E, id: i32) -> Result<Option<PreCatastral>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{} WHERE p.id = $1 AND p.deleted_at IS NULL", PRE_CATASTRAL_SELECT);
    let row: Option<PreCatastralRow> = sqlx::query_as(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(PreCatastral::from))
}

fn live_references(input: &PreCatastralInput) -> [(LiveRef, i32); 2] {
    [(LiveRef::Lot, input.lot_id), (LiveRef::Technician, input.technician_id)]
}

fn not_found(id: i32) -> DomainError {
    DomainError::not_found(format!("Precatastral {} no encontrado", id))
}

#[async_trait]
impl PreCatastralRepository for PgPreCatastralRepository {
    async fn list(
        &self,
        filter: &PreCatastralFilter,
        page: PageRequest,
    ) -> Result<Paged<PreCatastral>, DomainError> {
        let mut tx = begin_snapshot(&self.pool)
            .await
            .map_err(db_err("listing pre-catastrals"))?;

        let mut count = QueryBuilder::<Postgres>::new(PRE_CATASTRAL_COUNT);
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("counting pre-catastrals"))?;

        let mut select = QueryBuilder::<Postgres>::new(PRE_CATASTRAL_SELECT);
        push_filters(&mut select, filter);
        push_page(&mut select, "p.created_at DESC, p.id DESC", page);
        debug!("PreCatastral list query: {}", select.sql());
        let rows = select
            .build_query_as::<PreCatastralRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("listing pre-catastrals"))?;

        tx.commit().await.map_err(db_err("listing pre-catastrals"))?;
        Ok(Paged::new(rows.into_iter().map(PreCatastral::from).collect(), total))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<PreCatastral>, DomainError> {
        fetch_pre_catastral(&self.pool, id)
            .await
            .map_err(db_err("finding pre-catastral"))
    }

    async fn create(
        &self,
        input: &PreCatastralInput,
        note: &HistoryNote,
    ) -> Result<PreCatastral, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("creating pre-catastral"))?;
        ensure_all_live(&mut tx, &live_references(input)).await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO pre_catastrals (
                file_number, surveyed_at, reading, observation,
                customer_id, technician_id, lot_id, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&input.file_number)
        .bind(input.surveyed_at)
        .bind(input.reading)
        .bind(input.observation.as_str())
        .bind(input.customer_id)
        .bind(input.technician_id)
        .bind(input.lot_id)
        .bind(note.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("creating pre-catastral"))?;

        history::append(&mut tx, HistoryTable::PreCatastral, id, HistoryAction::Create, note)
            .await
            .map_err(db_err("appending pre-catastral history"))?;

        let record = fetch_pre_catastral(&mut *tx, id)
            .await
            .map_err(db_err("creating pre-catastral"))?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await.map_err(db_err("creating pre-catastral"))?;
        Ok(record)
    }

    async fn update(
        &self,
        id: i32,
        input: &PreCatastralInput,
        note: &HistoryNote,
    ) -> Result<PreCatastral, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("updating pre-catastral"))?;
        ensure_all_live(&mut tx, &live_references(input)).await?;

        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE pre_catastrals
            SET file_number = $1, surveyed_at = $2, reading = $3, observation = $4,
                customer_id = $5, technician_id = $6, lot_id = $7,
                updated_by = $8, updated_at = NOW()
            WHERE id = $9 AND deleted_at IS NULL
            RETURNING id
            "#,
        )
        .bind(&input.file_number)
        .bind(input.surveyed_at)
        .bind(input.reading)
        .bind(input.observation.as_str())
        .bind(input.customer_id)
        .bind(input.technician_id)
        .bind(input.lot_id)
        .bind(note.user_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("updating pre-catastral"))?;

        if updated.is_none() {
            return Err(not_found(id));
        }

        history::append(&mut tx, HistoryTable::PreCatastral, id, HistoryAction::Update, note)
            .await
            .map_err(db_err("appending pre-catastral history"))?;

        let record = fetch_pre_catastral(&mut *tx, id)
            .await
            .map_err(db_err("updating pre-catastral"))?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await.map_err(db_err("updating pre-catastral"))?;
        Ok(record)
    }

    async fn soft_delete(&self, id: i32, note: &HistoryNote) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("deleting pre-catastral"))?;

        let result = sqlx::query(
            r#"
            UPDATE pre_catastrals SET deleted_at = NOW(), deleted_by = $1
            WHERE id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(note.user_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("deleting pre-catastral"))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        history::append(&mut tx, HistoryTable::PreCatastral, id, HistoryAction::Delete, note)
            .await
            .map_err(db_err("appending pre-catastral history"))?;

        tx.commit().await.map_err(db_err("deleting pre-catastral"))?;
        Ok(())
    }

    async fn history(&self, id: i32) -> Result<Vec<HistoryEntry>, DomainError> {
        history::list(&self.pool, HistoryTable::PreCatastral, id).await
    }
}
