//! Lot (campaign batch) entity and its activation rules

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LotStatus {
    Active,
    #[default]
    Inactive,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Case-insensitive, so `?status=active` filters work.
impl FromStr for LotStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            _ => Err(DomainError::validation(format!("Estado de lote inválido: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Lot {
    pub id: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LotStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LotInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: Option<LotStatus>,
}

impl LotInput {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(DomainError::validation("El nombre del lote es obligatorio."));
        }
        if self.start_date > self.end_date {
            return Err(DomainError::validation(
                "La fecha de inicio no puede ser posterior a la fecha de fin.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LotFilter {
    pub name: Option<String>,
    pub status: Option<LotStatus>,
}

/// Outcome of deleting a lot: the removed lot and, when it was the active
/// one, the lot promoted in its place.
#[derive(Debug, Clone, Serialize)]
pub struct LotDeletion {
    pub deleted: Lot,
    pub promoted: Option<Lot>,
}

/// Minimal view of a lot used to choose a successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotCandidate {
    pub id: i32,
    pub created_at: DateTime<Utc>,
}

/// Whether removing this lot leaves the campaign without an active batch.
pub fn needs_successor(deleted: &Lot) -> bool {
    deleted.status.is_active()
}

/// Picks the most recently created lot; equal timestamps go to the highest id.
pub fn pick_successor(candidates: &[LotCandidate]) -> Option<i32> {
    candidates
        .iter()
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
        .map(|c| c.id)
}
