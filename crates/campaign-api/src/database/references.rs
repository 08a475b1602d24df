//! Liveness checks for soft-deletable rows a write points at.
//!
//! Foreign keys only prove the row exists; soft-deleted lots, technicians
//! and roles still do. Writers call [`ensure_live`] inside their transaction
//! before the insert or update. `FOR SHARE` holds off a concurrent soft
//! delete of the referenced row until the writer commits.

use sqlx::PgConnection;

use crate::database::constraints::db_err;
use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveRef {
    Lot,
    Technician,
    Role,
}

impl LiveRef {
    fn table(&self) -> &'static str {
        match self {
            Self::Lot => "lots",
            Self::Technician => "technicians",
            Self::Role => "roles",
        }
    }

    fn entity(&self) -> &'static str {
        match self {
            Self::Lot => "Lote",
            Self::Technician => "Técnico",
            Self::Role => "Rol",
        }
    }

    pub(crate) fn lookup_sql(&self) -> String {
        format!(
            "SELECT id FROM {} WHERE id = $1 AND deleted_at IS NULL FOR SHARE",
            self.table()
        )
    }

    pub fn not_found(&self) -> DomainError {
        DomainError::not_found(format!("{} no encontrado", self.entity()))
    }
}

pub async fn ensure_live(conn: &mut PgConnection, reference: LiveRef, id: i32) -> Result<(), DomainError> {
    let found: Option<i32> = sqlx::query_scalar(&reference.lookup_sql())
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(db_err("checking referenced row"))?;
    found.map(|_| ()).ok_or_else(|| reference.not_found())
}

/// Checks each reference in order, stopping at the first dead one.
pub async fn ensure_all_live(conn: &mut PgConnection, references: &[(LiveRef, i32)]) -> Result<(), DomainError> {
    for (reference, id) in references {
        ensure_live(&mut *conn, *reference, *id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_only_matches_live_rows_and_locks_them() {
        let sql = LiveRef::Technician.lookup_sql();
        assert!(sql.starts_with("SELECT id FROM technicians"));
        assert!(sql.contains("deleted_at IS NULL"));
        assert!(sql.ends_with("FOR SHARE"));
    }

    #[test]
    fn dead_reference_names_the_entity() {
        match LiveRef::Lot.not_found() {
            DomainError::NotFound(msg) => assert_eq!(msg, "Lote no encontrado"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
