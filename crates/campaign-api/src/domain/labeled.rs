//! Labeled boxes grouping legacy meters for bulk cataloguing

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Meters are inserted in one statement with three binds each; Postgres
/// caps a statement at 65535 binds.
pub const MAX_METERS_PER_BOX: usize = 5000;

#[derive(Debug, Clone, Serialize)]
pub struct MeterLabeled {
    pub id: i32,
    pub serial: String,
    pub reading: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Labeled {
    pub id: i32,
    pub name: String,
    pub lot_id: i32,
    pub lot_name: String,
    pub meters: Vec<MeterLabeled>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabeledSummary {
    pub id: i32,
    pub name: String,
    pub lot_id: i32,
    pub lot_name: String,
    pub meter_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MeterLabeledInput {
    pub serial: String,
    pub reading: f64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LabeledInput {
    pub name: String,
    pub lot_id: i32,
    pub meters: Vec<MeterLabeledInput>,
}

impl LabeledInput {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(DomainError::validation("El nombre de la caja es obligatorio."));
        }
        if self.lot_id <= 0 {
            return Err(DomainError::validation("Debe seleccionar un lote."));
        }
        if self.meters.is_empty() {
            return Err(DomainError::validation("La caja debe contener al menos un medidor."));
        }
        if self.meters.len() > MAX_METERS_PER_BOX {
            return Err(DomainError::validation(format!(
                "La caja admite como máximo {} medidores.",
                MAX_METERS_PER_BOX
            )));
        }

        let mut seen = HashSet::new();
        for meter in &mut self.meters {
            meter.serial = meter.serial.trim().to_string();
            if meter.serial.is_empty() {
                return Err(DomainError::validation("Cada medidor requiere un número de serie."));
            }
            if !meter.reading.is_finite() || meter.reading < 0.0 {
                return Err(DomainError::validation(format!(
                    "Lectura inválida para el medidor {}.",
                    meter.serial
                )));
            }
            if !seen.insert(meter.serial.clone()) {
                return Err(DomainError::validation(format!(
                    "El medidor {} está repetido en la caja.",
                    meter.serial
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabeledFilter {
    pub name: Option<String>,
    pub serial: Option<String>,
    pub lot_id: Option<i32>,
}

pub fn creation_detail(input: &LabeledInput) -> String {
    format!(
        "Caja {} creada con {} medidores",
        input.name,
        input.meters.len()
    )
}

pub fn update_detail(current: &Labeled, input: &LabeledInput) -> String {
    let mut parts = Vec::new();
    if current.name != input.name {
        parts.push(format!("nombre: {} -> {}", current.name, input.name));
    }
    if current.lot_id != input.lot_id {
        parts.push(format!("lote: {} -> {}", current.lot_id, input.lot_id));
    }
    parts.push(format!(
        "medidores: {} -> {}",
        current.meters.len(),
        input.meters.len()
    ));
    format!("Caja {} actualizada ({})", input.name, parts.join(", "))
}

pub fn deletion_detail(labeled: &Labeled) -> String {
    format!("Caja {} eliminada", labeled.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meter(serial: &str, reading: f64) -> MeterLabeledInput {
        MeterLabeledInput {
            serial: serial.into(),
            reading,
        }
    }

    #[test]
    fn rejects_empty_box_and_duplicate_serials() {
        let mut input = LabeledInput {
            name: "Caja 01".into(),
            lot_id: 1,
            meters: vec![],
        };
        assert!(input.validate().is_err());

        input.meters = vec![meter("A1", 10.0), meter(" A1 ", 12.0)];
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("A1"));
    }

    #[test]
    fn oversized_box_is_rejected() {
        let mut input = LabeledInput {
            name: "Caja 03".into(),
            lot_id: 1,
            meters: (0..=MAX_METERS_PER_BOX)
                .map(|n| meter(&format!("S{}", n), 1.0))
                .collect(),
        };
        let err = input.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(err.to_string().contains("5000"));

        input.meters.truncate(MAX_METERS_PER_BOX);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn creation_detail_counts_meters() {
        let mut input = LabeledInput {
            name: " Caja 02 ".into(),
            lot_id: 3,
            meters: vec![meter("A1", 1.0), meter("A2", 2.0)],
        };
        input.validate().unwrap();
        assert_eq!(creation_detail(&input), "Caja Caja 02 creada con 2 medidores");
    }
}
