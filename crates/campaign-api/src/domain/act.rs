//! Act (meter installation record)

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::DomainError;
use super::history::ChangeSet;

/// Field observation recorded by the technician.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Observation {
    #[default]
    None,
    MeterDamaged,
    NoAccess,
    SealBroken,
    IllegalConnection,
    Other,
}

impl Observation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::MeterDamaged => "METER_DAMAGED",
            Self::NoAccess => "NO_ACCESS",
            Self::SealBroken => "SEAL_BROKEN",
            Self::IllegalConnection => "ILLEGAL_CONNECTION",
            Self::Other => "OTHER",
        }
    }
}

impl FromStr for Observation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Self::None),
            "METER_DAMAGED" => Ok(Self::MeterDamaged),
            "NO_ACCESS" => Ok(Self::NoAccess),
            "SEAL_BROKEN" => Ok(Self::SealBroken),
            "ILLEGAL_CONNECTION" => Ok(Self::IllegalConnection),
            "OTHER" => Ok(Self::Other),
            _ => Err(DomainError::validation(format!("Observación inválida: {}", s))),
        }
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Act {
    pub id: i32,
    pub file_number: String,
    pub installed_at: NaiveDateTime,
    pub reading: f64,
    pub observation: Observation,
    pub customer_id: i32,
    pub customer_inscription: String,
    pub customer_name: String,
    pub technician_id: i32,
    pub technician_name: String,
    pub meter_id: i32,
    pub meter_serial: String,
    pub lot_id: i32,
    pub lot_name: String,
    pub created_by: i32,
    pub updated_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ActInput {
    pub file_number: String,
    pub installed_at: NaiveDateTime,
    pub reading: f64,
    #[serde(default)]
    pub observation: Observation,
    pub customer_id: i32,
    pub technician_id: i32,
    pub meter_id: i32,
    pub lot_id: i32,
}

/// Trims the file number and rejects blanks.
pub(crate) fn normalize_file_number(file_number: &mut String) -> Result<(), DomainError> {
    *file_number = file_number.trim().to_string();
    if file_number.is_empty() {
        return Err(DomainError::validation("El número de ficha es obligatorio."));
    }
    Ok(())
}

pub(crate) fn require_reference(id: i32, what: &str) -> Result<(), DomainError> {
    if id <= 0 {
        return Err(DomainError::validation(format!("Debe seleccionar {}.", what)));
    }
    Ok(())
}

impl ActInput {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        normalize_file_number(&mut self.file_number)?;
        if !self.reading.is_finite() || self.reading < 0.0 {
            return Err(DomainError::validation("La lectura debe ser un número positivo."));
        }
        require_reference(self.customer_id, "un cliente")?;
        require_reference(self.technician_id, "un técnico")?;
        require_reference(self.meter_id, "un medidor")?;
        require_reference(self.lot_id, "un lote")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActFilter {
    pub file_number: Option<String>,
    pub inscription: Option<String>,
    pub serial: Option<String>,
    pub lot_id: Option<i32>,
}

pub fn creation_detail(input: &ActInput) -> String {
    format!("Acta creada con ficha {}", input.file_number)
}

pub fn update_detail(current: &Act, input: &ActInput) -> String {
    let mut changes = ChangeSet::new();
    changes.track("ficha", &current.file_number, &input.file_number);
    changes.track("fecha", &current.installed_at, &input.installed_at);
    changes.track("lectura", &current.reading, &input.reading);
    changes.track("observación", &current.observation, &input.observation);
    changes.track("cliente", &current.customer_id, &input.customer_id);
    changes.track("técnico", &current.technician_id, &input.technician_id);
    changes.track("medidor", &current.meter_id, &input.meter_id);
    changes.track("lote", &current.lot_id, &input.lot_id);
    format!("Acta {} actualizada ({})", input.file_number, changes.summary())
}

pub fn deletion_detail(act: &Act) -> String {
    format!("Acta con ficha {} eliminada", act.file_number)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    pub fn input(file_number: &str) -> ActInput {
        ActInput {
            file_number: file_number.to_string(),
            installed_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            reading: 125.5,
            observation: Observation::None,
            customer_id: 11,
            technician_id: 21,
            meter_id: 31,
            lot_id: 1,
        }
    }

    pub fn act(id: i32, file_number: &str) -> Act {
        let input = input(file_number);
        Act {
            id,
            file_number: input.file_number,
            installed_at: input.installed_at,
            reading: input.reading,
            observation: input.observation,
            customer_id: input.customer_id,
            customer_inscription: "00011".into(),
            customer_name: "Ana Quispe".into(),
            technician_id: input.technician_id,
            technician_name: "Luis Ramos".into(),
            meter_id: input.meter_id,
            meter_serial: "MX-31".into(),
            lot_id: input.lot_id,
            lot_name: "Lote 1".into(),
            created_by: 2,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}
