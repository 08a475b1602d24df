//! Translation of PostgreSQL constraint violations into domain errors.
//!
//! Record uniqueness lives in partial unique indexes over live rows, so the
//! index name reported by a failed write is the only signal we need.

use sqlx::error::ErrorKind;
use tracing::error;

use crate::domain::DomainError;

pub const ACT_FILE_NUMBER: &str = "acts_file_number_active_key";
pub const ACT_CUSTOMER: &str = "acts_customer_active_key";
pub const ACT_METER: &str = "acts_meter_active_key";
pub const PRE_CATASTRAL_FILE_NUMBER: &str = "pre_catastrals_file_number_active_key";
pub const PRE_CATASTRAL_CUSTOMER: &str = "pre_catastrals_customer_active_key";
pub const LOT_NAME: &str = "lots_name_active_key";
pub const LOT_SINGLE_ACTIVE: &str = "lots_single_active_key";
pub const LABELED_NAME: &str = "labeled_name_active_key";
pub const METER_LABELED_SERIAL: &str = "meter_labeled_serial_key";
pub const USERNAME: &str = "users_username_active_key";
pub const ROLE_NAME: &str = "roles_name_active_key";
pub const TECHNICIAN_DNI: &str = "technicians_dni_active_key";
pub const CUSTOMER_INSCRIPTION: &str = "customers_inscription_key";
pub const METER_SERIAL: &str = "meter_renovations_serial_key";

pub fn unique_violation(constraint: Option<&str>) -> Option<DomainError> {
    let err = match constraint? {
        ACT_FILE_NUMBER | PRE_CATASTRAL_FILE_NUMBER => DomainError::DuplicateFileNumber,
        ACT_CUSTOMER | PRE_CATASTRAL_CUSTOMER => DomainError::CustomerAlreadyLinked,
        ACT_METER => DomainError::MeterAlreadyLinked,
        LOT_NAME => conflict("Ya existe un lote con ese nombre."),
        LOT_SINGLE_ACTIVE => conflict("Otro lote se activó al mismo tiempo. Intente nuevamente."),
        LABELED_NAME => conflict("Ya existe una caja con ese nombre."),
        METER_LABELED_SERIAL => conflict("El medidor está repetido en la caja."),
        USERNAME => conflict("El nombre de usuario ya está registrado."),
        ROLE_NAME => conflict("Ya existe un rol con ese nombre."),
        TECHNICIAN_DNI => conflict("Ya existe un técnico con ese DNI."),
        CUSTOMER_INSCRIPTION => conflict("Ya existe un cliente con esa inscripción."),
        METER_SERIAL => conflict("Ya existe un medidor con ese número de serie."),
        _ => return None,
    };
    Some(err)
}

/// Foreign keys keep PostgreSQL's default `<table>_<column>_fkey` names.
pub fn foreign_key_violation(constraint: Option<&str>) -> Option<DomainError> {
    let constraint = constraint?;
    let entity = [
        ("customer_id_fkey", "Cliente"),
        ("technician_id_fkey", "Técnico"),
        ("meter_id_fkey", "Medidor"),
        ("lot_id_fkey", "Lote"),
        ("role_id_fkey", "Rol"),
        ("user_id_fkey", "Usuario"),
        ("created_by_fkey", "Usuario"),
        ("updated_by_fkey", "Usuario"),
        ("deleted_by_fkey", "Usuario"),
    ]
    .iter()
    .find(|(suffix, _)| constraint.ends_with(suffix))
    .map(|(_, entity)| *entity)?;

    Some(DomainError::not_found(format!("{} no encontrado", entity)))
}

fn conflict(msg: &str) -> DomainError {
    DomainError::Conflict(msg.to_string())
}

/// Maps a failed query to the matching domain error; `context` names the
/// operation in the log line.
pub fn map_sqlx_error(err: sqlx::Error, context: &str) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        let mapped = match db_err.kind() {
            ErrorKind::UniqueViolation => unique_violation(db_err.constraint()),
            ErrorKind::ForeignKeyViolation => foreign_key_violation(db_err.constraint()),
            _ => None,
        };
        if let Some(mapped) = mapped {
            return mapped;
        }
    }

    error!("Database error {}: {}", context, err);
    DomainError::Database(err.to_string())
}

/// `map_err` adapter carrying the operation name.
pub fn db_err(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |err| map_sqlx_error(err, context)
}
