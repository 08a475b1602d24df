//! Append-only audit trail shared by acts, pre-catastrals and labeled boxes.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgExecutor};

use crate::domain::{DomainError, HistoryAction, HistoryEntry, HistoryNote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryTable {
    Act,
    PreCatastral,
    Labeled,
}

impl HistoryTable {
    fn table(&self) -> &'static str {
        match self {
            Self::Act => "act_history",
            Self::PreCatastral => "pre_catastral_history",
            Self::Labeled => "labeled_history",
        }
    }

    fn parent_column(&self) -> &'static str {
        match self {
            Self::Act => "act_id",
            Self::PreCatastral => "pre_catastral_id",
            Self::Labeled => "labeled_id",
        }
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: i32,
    record_id: i32,
    action: String,
    user_id: i32,
    username: Option<String>,
    detail: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = DomainError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let action: HistoryAction = row.action.parse()?;
        Ok(HistoryEntry {
            id: row.id,
            record_id: row.record_id,
            action,
            user_id: row.user_id,
            username: row.username,
            detail: row.detail,
            created_at: row.created_at,
        })
    }
}

/// Writes one history row; callers pass the connection of the
/// transaction that performed the mutation.
pub async fn append(
    conn: &mut PgConnection,
    table: HistoryTable,
    record_id: i32,
    action: HistoryAction,
    note: &HistoryNote,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        "INSERT INTO {} ({}, action, user_id, detail) VALUES ($1, $2, $3, $4)",
        table.table(),
        table.parent_column()
    );
    sqlx::query(&sql)
        .bind(record_id)
        .bind(action.as_str())
        .bind(note.user_id)
        .bind(&note.detail)
        .execute(conn)
        .await?;
    Ok(())
}

/// Newest first.
pub async fn list<'e, E>(
    executor: E,
    table: HistoryTable,
    record_id: i32,
) -> Result<Vec<HistoryEntry>, DomainError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT h.id, h.{parent} AS record_id, h.action, h.user_id, u.username,
               h.detail, h.created_at
        FROM {table} h
        LEFT JOIN users u ON u.id = h.user_id
        WHERE h.{parent} = $1
        ORDER BY h.created_at DESC, h.id DESC
        "#,
        parent = table.parent_column(),
        table = table.table()
    );
    let rows: Vec<HistoryRow> = sqlx::query_as(&sql)
        .bind(record_id)
        .fetch_all(executor)
        .await
        .map_err(super::constraints::db_err("listing history"))?;

    rows.into_iter().map(HistoryEntry::try_from).collect()
}
