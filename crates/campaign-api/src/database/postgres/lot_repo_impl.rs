use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::info;

use super::{begin_snapshot, push_contains, push_page};
use crate::database::constraints::db_err;
use crate::domain::lot::{needs_successor, pick_successor, LotCandidate};
use crate::domain::{DomainError, Lot, LotDeletion, LotFilter, LotInput, LotStatus};
use crate::repositories::LotRepository;
use crate::utils::{PageRequest, Paged};

const LOT_COLUMNS: &str = "SELECT id, name, start_date, end_date, status, created_at FROM lots";

/// Serializes every status transition on `lots`.
const LOT_STATUS_LOCK: i64 = 0x4c4f_5453;

pub struct PgLotRepository {
    pool: PgPool,
}

impl PgLotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct LotRow {
    id: i32,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<LotRow> for Lot {
    fn from(row: LotRow) -> Self {
        Lot {
            id: row.id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status.parse().unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

fn lot_not_found(id: i32) -> DomainError {
    DomainError::not_found(format!("Lote {} no encontrado", id))
}

async fn fetch_lot<'e, E>(executor: E, id: i32) -> Result<Option<Lot>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{} WHERE id = $1 AND deleted_at IS NULL", LOT_COLUMNS);
    let row: Option<LotRow> = sqlx::query_as(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(Lot::from))
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &LotFilter) {
    qb.push(" WHERE deleted_at IS NULL");
    push_contains(qb, "name", &filter.name);
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
}

async fn lock_lot_status(conn: &mut PgConnection) -> Result<(), DomainError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(LOT_STATUS_LOCK)
        .execute(conn)
        .await
        .map_err(db_err("locking lot status"))?;
    Ok(())
}

/// Leaves `id` as the only ACTIVE lot. Running it twice changes nothing.
pub(crate) async fn activate_lot(conn: &mut PgConnection, id: i32) -> Result<(), DomainError> {
    lock_lot_status(&mut *conn).await?;

    let exists: Option<i32> =
        sqlx::query_scalar("SELECT id FROM lots WHERE id = $1 AND deleted_at IS NULL FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_err("activating lot"))?;
    if exists.is_none() {
        return Err(lot_not_found(id));
    }

    sqlx::query("UPDATE lots SET status = 'INACTIVE' WHERE id <> $1 AND status = 'ACTIVE'")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(db_err("activating lot"))?;
    sqlx::query("UPDATE lots SET status = 'ACTIVE' WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(db_err("activating lot"))?;
    Ok(())
}

/// Marks the lot deleted and INACTIVE, returning it as it was before.
pub(crate) async fn soft_delete_lot(conn: &mut PgConnection, id: i32) -> Result<Lot, DomainError> {
    let sql = format!("{} WHERE id = $1 AND deleted_at IS NULL FOR UPDATE", LOT_COLUMNS);
    let current: LotRow = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err("deleting lot"))?
        .ok_or_else(|| lot_not_found(id))?;

    sqlx::query("UPDATE lots SET deleted_at = NOW(), status = 'INACTIVE' WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(db_err("deleting lot"))?;

    Ok(current.into())
}

/// Activates the newest live lot, if any remain.
pub(crate) async fn promote_next_lot(conn: &mut PgConnection) -> Result<Option<Lot>, DomainError> {
    let candidates: Vec<(i32, DateTime<Utc>)> =
        sqlx::query_as("SELECT id, created_at FROM lots WHERE deleted_at IS NULL")
            .fetch_all(&mut *conn)
            .await
            .map_err(db_err("promoting lot"))?;
    let candidates: Vec<LotCandidate> = candidates
        .into_iter()
        .map(|(id, created_at)| LotCandidate { id, created_at })
        .collect();

    let Some(next) = pick_successor(&candidates) else {
        return Ok(None);
    };
    activate_lot(&mut *conn, next).await?;
    fetch_lot(&mut *conn, next)
        .await
        .map_err(db_err("promoting lot"))
}

#[async_trait]
impl LotRepository for PgLotRepository {
    async fn list(&self, filter: &LotFilter, page: PageRequest) -> Result<Paged<Lot>, DomainError> {
        let mut tx = begin_snapshot(&self.pool).await.map_err(db_err("listing lots"))?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM lots");
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("counting lots"))?;

        let mut select = QueryBuilder::<Postgres>::new(LOT_COLUMNS);
        push_filters(&mut select, filter);
        push_page(&mut select, "created_at DESC, id DESC", page);
        let rows = select
            .build_query_as::<LotRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("listing lots"))?;

        tx.commit().await.map_err(db_err("listing lots"))?;
        Ok(Paged::new(rows.into_iter().map(Lot::from).collect(), total))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Lot>, DomainError> {
        fetch_lot(&self.pool, id).await.map_err(db_err("finding lot"))
    }

    async fn find_active(&self) -> Result<Option<Lot>, DomainError> {
        let sql = format!("{} WHERE status = 'ACTIVE' AND deleted_at IS NULL", LOT_COLUMNS);
        let row: Option<LotRow> = sqlx::query_as(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("finding active lot"))?;
        Ok(row.map(Lot::from))
    }

    async fn create(&self, input: &LotInput) -> Result<Lot, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("creating lot"))?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO lots (name, start_date, end_date, status)
            VALUES ($1, $2, $3, 'INACTIVE')
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(input.start_date)
        .bind(input.end_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("creating lot"))?;

        if input.status.is_some_and(|s| s.is_active()) {
            activate_lot(&mut tx, id).await?;
        }

        let lot = fetch_lot(&mut *tx, id)
            .await
            .map_err(db_err("creating lot"))?
            .ok_or_else(|| lot_not_found(id))?;
        tx.commit().await.map_err(db_err("creating lot"))?;
        Ok(lot)
    }

    async fn update(&self, id: i32, input: &LotInput) -> Result<Lot, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("updating lot"))?;

        let result = sqlx::query(
            r#"
            UPDATE lots SET name = $1, start_date = $2, end_date = $3
            WHERE id = $4 AND deleted_at IS NULL
            "#,
        )
        .bind(&input.name)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("updating lot"))?;

        if result.rows_affected() == 0 {
            return Err(lot_not_found(id));
        }

        match input.status {
            Some(LotStatus::Active) => activate_lot(&mut tx, id).await?,
            Some(LotStatus::Inactive) => {
                sqlx::query("UPDATE lots SET status = 'INACTIVE' WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err("updating lot"))?;
            }
            None => {}
        }

        let lot = fetch_lot(&mut *tx, id)
            .await
            .map_err(db_err("updating lot"))?
            .ok_or_else(|| lot_not_found(id))?;
        tx.commit().await.map_err(db_err("updating lot"))?;
        Ok(lot)
    }

    async fn activate(&self, id: i32) -> Result<Lot, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("activating lot"))?;
        activate_lot(&mut tx, id).await?;
        let lot = fetch_lot(&mut *tx, id)
            .await
            .map_err(db_err("activating lot"))?
            .ok_or_else(|| lot_not_found(id))?;
        tx.commit().await.map_err(db_err("activating lot"))?;
        Ok(lot)
    }

    async fn delete(&self, id: i32) -> Result<LotDeletion, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("deleting lot"))?;
        lock_lot_status(&mut tx).await?;

        let mut deleted = soft_delete_lot(&mut tx, id).await?;
        let promoted = if needs_successor(&deleted) {
            promote_next_lot(&mut tx).await?
        } else {
            None
        };
        deleted.status = LotStatus::Inactive;

        tx.commit().await.map_err(db_err("deleting lot"))?;
        if let Some(next) = &promoted {
            info!("Lot {} deleted while active; lot {} promoted", id, next.id);
        }
        Ok(LotDeletion { deleted, promoted })
    }
}
