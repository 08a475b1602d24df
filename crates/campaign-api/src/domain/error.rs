//! Domain errors

use thiserror::Error;

pub const MSG_DUPLICATE_FILE_NUMBER: &str = "Ya existe un registro con ese número de ficha.";
pub const MSG_CUSTOMER_LINKED: &str = "El cliente ya está vinculado a otro registro.";
pub const MSG_METER_LINKED: &str = "El medidor ya está vinculado a otra acta.";

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{}", MSG_DUPLICATE_FILE_NUMBER)]
    DuplicateFileNumber,

    #[error("{}", MSG_CUSTOMER_LINKED)]
    CustomerAlreadyLinked,

    #[error("{}", MSG_METER_LINKED)]
    MeterAlreadyLinked,

    /// Business key clash outside the act/pre-survey guard (lot name, username, ...).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
