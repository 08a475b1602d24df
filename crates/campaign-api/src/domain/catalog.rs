//! Customers, technicians and replacement meters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

fn required(value: &mut String, message: &str) -> Result<(), DomainError> {
    *value = value.trim().to_string();
    if value.is_empty() {
        return Err(DomainError::validation(message));
    }
    Ok(())
}

fn optional(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: i32,
    pub inscription: String,
    pub name: String,
    pub address: String,
    pub prior_meter: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CustomerInput {
    pub inscription: String,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub prior_meter: Option<String>,
}

impl CustomerInput {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        required(&mut self.inscription, "El número de inscripción es obligatorio.")?;
        required(&mut self.name, "El nombre del cliente es obligatorio.")?;
        self.address = self.address.trim().to_string();
        optional(&mut self.prior_meter);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub inscription: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Technician {
    pub id: i32,
    pub dni: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TechnicianInput {
    pub dni: String,
    pub name: String,
}

impl TechnicianInput {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        required(&mut self.dni, "El DNI del técnico es obligatorio.")?;
        if !self.dni.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation("El DNI solo puede contener dígitos."));
        }
        required(&mut self.name, "El nombre del técnico es obligatorio.")
    }
}

#[derive(Debug, Clone, Default)]
pub struct TechnicianFilter {
    pub dni: Option<String>,
    pub name: Option<String>,
}

/// A new meter handed to the campaign; an act consumes it at most once.
#[derive(Debug, Clone, Serialize)]
pub struct MeterRenovation {
    pub id: i32,
    pub serial: String,
    pub verification_code: Option<String>,
    /// True when a non-deleted act already installed this meter.
    pub consumed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MeterInput {
    pub serial: String,
    #[serde(default)]
    pub verification_code: Option<String>,
}

impl MeterInput {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        required(&mut self.serial, "El número de serie del medidor es obligatorio.")?;
        optional(&mut self.verification_code);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeterFilter {
    pub serial: Option<String>,
    /// `Some(true)` keeps meters no live act references.
    pub available: Option<bool>,
}
