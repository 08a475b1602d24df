//! PreCatastral (pre-installation survey)

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::act::{normalize_file_number, require_reference, Observation};
use super::error::DomainError;
use super::history::ChangeSet;

#[derive(Debug, Clone, Serialize)]
pub struct PreCatastral {
    pub id: i32,
    pub file_number: String,
    pub surveyed_at: NaiveDateTime,
    pub reading: Option<f64>,
    pub observation: Observation,
    pub customer_id: i32,
    pub customer_inscription: String,
    pub customer_name: String,
    pub technician_id: i32,
    pub technician_name: String,
    pub lot_id: i32,
    pub lot_name: String,
    pub created_by: i32,
    pub updated_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PreCatastralInput {
    pub file_number: String,
    pub surveyed_at: NaiveDateTime,
    #[serde(default)]
    pub reading: Option<f64>,
    #[serde(default)]
    pub observation: Observation,
    pub customer_id: i32,
    pub technician_id: i32,
    pub lot_id: i32,
}

impl PreCatastralInput {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        normalize_file_number(&mut self.file_number)?;
        if let Some(reading) = self.reading {
            if !reading.is_finite() || reading < 0.0 {
                return Err(DomainError::validation("La lectura debe ser un número positivo."));
            }
        }
        require_reference(self.customer_id, "un cliente")?;
        require_reference(self.technician_id, "un técnico")?;
        require_reference(self.lot_id, "un lote")
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreCatastralFilter {
    pub file_number: Option<String>,
    pub inscription: Option<String>,
    pub lot_id: Option<i32>,
}

fn reading_label(reading: Option<f64>) -> String {
    reading.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn creation_detail(input: &PreCatastralInput) -> String {
    format!("Precatastral creado con ficha {}", input.file_number)
}

pub fn update_detail(current: &PreCatastral, input: &PreCatastralInput) -> String {
    let mut changes = ChangeSet::new();
    changes.track("ficha", &current.file_number, &input.file_number);
    changes.track("fecha", &current.surveyed_at, &input.surveyed_at);
    changes.track(
        "lectura",
        &reading_label(current.reading),
        &reading_label(input.reading),
    );
    changes.track("observación", &current.observation, &input.observation);
    changes.track("cliente", &current.customer_id, &input.customer_id);
    changes.track("técnico", &current.technician_id, &input.technician_id);
    changes.track("lote", &current.lot_id, &input.lot_id);
    format!(
        "Precatastral {} actualizado ({})",
        input.file_number,
        changes.summary()
    )
}

pub fn deletion_detail(record: &PreCatastral) -> String {
    format!("Precatastral con ficha {} eliminado", record.file_number)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    pub fn input(file_number: &str) -> PreCatastralInput {
        PreCatastralInput {
            file_number: file_number.to_string(),
            surveyed_at: NaiveDate::from_ymd_opt(2024, 2, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            reading: None,
            observation: Observation::None,
            customer_id: 11,
            technician_id: 21,
            lot_id: 1,
        }
    }

    pub fn record(id: i32, file_number: &str) -> PreCatastral {
        let input = input(file_number);
        PreCatastral {
            id,
            file_number: input.file_number,
            surveyed_at: input.surveyed_at,
            reading: input.reading,
            observation: input.observation,
            customer_id: input.customer_id,
            customer_inscription: "00011".into(),
            customer_name: "Ana Quispe".into(),
            technician_id: input.technician_id,
            technician_name: "Luis Ramos".into(),
            lot_id: input.lot_id,
            lot_name: "Lote 1".into(),
            created_by: 2,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{input, record};
    use super::*;

    #[test]
    fn reading_is_optional_but_must_be_positive() {
        let mut i = input("P-1");
        assert!(i.validate().is_ok());
        i.reading = Some(-3.0);
        assert!(matches!(i.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn update_detail_reports_new_reading() {
        let current = record(3, "P-1");
        let mut next = input("P-1");
        next.reading = Some(88.0);
        assert_eq!(
            update_detail(&current, &next),
            "Precatastral P-1 actualizado (lectura: - -> 88)"
        );
    }
}
