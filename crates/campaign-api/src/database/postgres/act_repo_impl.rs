use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{begin_snapshot, push_contains, push_equals, push_page};
use crate::database::constraints::db_err;
use crate::database::history::{self, HistoryTable};
use crate::database::references::{ensure_all_live, LiveRef};
use crate::domain::{
    Act, ActFilter, ActInput, DomainError, HistoryAction, HistoryEntry, HistoryNote,
};
use crate::repositories::ActRepository;
use crate::utils::{PageRequest, Paged};

const ACT_SELECT: &str = r#"
    SELECT a.id, a.file_number, a.installed_at, a.reading, a.observation,
           a.customer_id, c.inscription AS customer_inscription, c.name AS customer_name,
           a.technician_id, t.name AS technician_name,
           a.meter_id, m.serial AS meter_serial,
           a.lot_id, l.name AS lot_name,
           a.created_by, a.updated_by, a.created_at, a.updated_at
    FROM acts a
    JOIN customers c ON c.id = a.customer_id
    JOIN technicians t ON t.id = a.technician_id
    JOIN meter_renovations m ON m.id = a.meter_id
    JOIN lots l ON l.id = a.lot_id
"#;

const ACT_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM acts a
    JOIN customers c ON c.id = a.customer_id
    JOIN meter_renovations m ON m.id = a.meter_id
"#;

pub struct PgActRepository {
    pool: PgPool,
}

impl PgActRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ActRow {
    id: i32,
    file_number: String,
    installed_at: NaiveDateTime,
    reading: f64,
    observation: String,
    customer_id: i32,
    customer_inscription: String,
    customer_name: String,
    technician_id: i32,
    technician_name: String,
    meter_id: i32,
    meter_serial: String,
    lot_id: i32,
    lot_name: String,
    created_by: i32,
    updated_by: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ActRow> for Act {
    fn from(row: ActRow) -> Self {
        Act {
            id: row.id,
            file_number: row.file_number,
            installed_at: row.installed_at,
            reading: row.reading,
            observation: row.observation.parse().unwrap_or_default(),
            customer_id: row.customer_id,
            customer_inscription: row.customer_inscription,
            customer_name: row.customer_name,
            technician_id: row.technician_id,
            technician_name: row.technician_name,
            meter_id: row.meter_id,
            meter_serial: row.meter_serial,
            lot_id: row.lot_id,
            lot_name: row.lot_name,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ActFilter) {
    qb.push(" WHERE a.deleted_at IS NULL");
    push_contains(qb, "a.file_number", &filter.file_number);
    push_contains(qb, "c.inscription", &filter.inscription);
    push_contains(qb, "m.serial", &filter.serial);
    push_equals(qb, "a.lot_id", filter.lot_id);
}

async fn fetch_act<'e, E>(executor: E, id: i32) -> Result<Option<Act>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{} WHERE a.id = $1 AND a.deleted_at IS NULL", ACT_SELECT);
    let row: Option<ActRow> = sqlx::query_as(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(Act::from))
}

fn live_references(input: &ActInput) -> [(LiveRef, i32); 2] {
    [(LiveRef::Lot, input.lot_id), (LiveRef::Technician, input.technician_id)]
}

fn act_not_found(id: i32) -> DomainError {
    DomainError::not_found(format!("Acta {} no encontrada", id))
}

#[async_trait]
impl ActRepository for PgActRepository {
    async fn list(&self, filter: &ActFilter, page: PageRequest) -> Result<Paged<Act>, DomainError> {
        let mut tx = begin_snapshot(&self.pool).await.map_err(db_err("listing acts"))?;

        let mut count = QueryBuilder::<Postgres>::new(ACT_COUNT);
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("counting acts"))?;

        let mut select = QueryBuilder::<Postgres>::new(ACT_SELECT);
        push_filters(&mut select, filter);
        push_page(&mut select, "a.created_at DESC, a.id DESC", page);
        debug!("Act list query: {}", select.sql());
        let rows = select
            .build_query_as::<ActRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("listing acts"))?;

        tx.commit().await.map_err(db_err("listing acts"))?;
        Ok(Paged::new(rows.into_iter().map(Act::from).collect(), total))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Act>, DomainError> {
        fetch_act(&self.pool, id).await.map_err(db_err("finding act"))
    }

    async fn create(&self, input: &ActInput, note: &HistoryNote) -> Result<Act, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("creating act"))?;
        ensure_all_live(&mut tx, &live_references(input)).await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO acts (
                file_number, installed_at, reading, observation,
                customer_id, technician_id, meter_id, lot_id, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&input.file_number)
        .bind(input.installed_at)
        .bind(input.reading)
        .bind(input.observation.as_str())
        .bind(input.customer_id)
        .bind(input.technician_id)
        .bind(input.meter_id)
        .bind(input.lot_id)
        .bind(note.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("creating act"))?;

        history::append(&mut tx, HistoryTable::Act, id, HistoryAction::Create, note)
            .await
            .map_err(db_err("appending act history"))?;

        let act = fetch_act(&mut *tx, id)
            .await
            .map_err(db_err("creating act"))?
            .ok_or_else(|| act_not_found(id))?;
        tx.commit().await.map_err(db_err("creating act"))?;
        Ok(act)
    }

    async fn update(&self, id: i32, input: &ActInput, note: &HistoryNote) -> Result<Act, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("updating act"))?;
        ensure_all_live(&mut tx, &live_references(input)).await?;

        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE acts
            SET file_number = $1, installed_at = $2, reading = $3, observation = $4,
                customer_id = $5, technician_id = $6, meter_id = $7, lot_id = $8,
                updated_by = $9, updated_at = NOW()
            WHERE id = $10 AND deleted_at IS NULL
            RETURNING id
            "#,
        )
        .bind(&input.file_number)
        .bind(input.installed_at)
        .bind(input.reading)
        .bind(input.observation.as_str())
        .bind(input.customer_id)
        .bind(input.technician_id)
        .bind(input.meter_id)
        .bind(input.lot_id)
        .bind(note.user_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("updating act"))?;

        if updated.is_none() {
            return Err(act_not_found(id));
        }

        history::append(&mut tx, HistoryTable::Act, id, HistoryAction::Update, note)
            .await
            .map_err(db_err("appending act history"))?;

        let act = fetch_act(&mut *tx, id)
            .await
            .map_err(db_err("updating act"))?
            .ok_or_else(|| act_not_found(id))?;
        tx.commit().await.map_err(db_err("updating act"))?;
        Ok(act)
    }

    async fn soft_delete(&self, id: i32, note: &HistoryNote) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("deleting act"))?;

        let result = sqlx::query(
            "UPDATE acts SET deleted_at = NOW(), deleted_by = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(note.user_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("deleting act"))?;

        if result.rows_affected() == 0 {
            return Err(act_not_found(id));
        }

        history::append(&mut tx, HistoryTable::Act, id, HistoryAction::Delete, note)
            .await
            .map_err(db_err("appending act history"))?;

        tx.commit().await.map_err(db_err("deleting act"))?;
        Ok(())
    }

    async fn history(&self, id: i32) -> Result<Vec<HistoryEntry>, DomainError> {
        history::list(&self.pool, HistoryTable::Act, id).await
    }
}
