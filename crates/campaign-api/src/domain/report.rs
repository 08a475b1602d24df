//! Report selection and row schema

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Acts,
    PreCatastrals,
}

impl ReportKind {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Acts => "actas",
            Self::PreCatastrals => "precatastrales",
        }
    }

    pub fn sheet_name(&self) -> &'static str {
        match self {
            Self::Acts => "Actas",
            Self::PreCatastrals => "Precatastrales",
        }
    }
}

/// Raw query string of a report request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub lot_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportFilter {
    DateRange { start: NaiveDate, end: NaiveDate },
    Lot(i32),
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        DomainError::validation(format!(
            "Fecha inválida en '{}': use el formato AAAA-MM-DD.",
            field
        ))
    })
}

impl ReportFilter {
    /// A lot id wins over dates; otherwise both ends of the range are required.
    pub fn from_query(query: &ReportQuery) -> Result<Self, DomainError> {
        if let Some(lot_id) = query.lot_id {
            if lot_id <= 0 {
                return Err(DomainError::validation("Lote inválido."));
            }
            return Ok(Self::Lot(lot_id));
        }

        let (Some(start), Some(end)) = (query.start.as_deref(), query.end.as_deref()) else {
            return Err(DomainError::validation(
                "Debe indicar un rango de fechas (start, end) o un lote.",
            ));
        };
        let start = parse_date(start, "start")?;
        let end = parse_date(end, "end")?;
        if start > end {
            return Err(DomainError::validation(
                "La fecha de inicio no puede ser posterior a la fecha de fin.",
            ));
        }
        Ok(Self::DateRange { start, end })
    }

    /// Half-open timestamp bounds covering whole days `[start, end + 1)`.
    pub fn bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let from = start.and_time(NaiveTime::MIN);
        let until = end
            .succ_opt()
            .map(|d| d.and_time(NaiveTime::MIN))
            .unwrap_or(NaiveDateTime::MAX);
        (from, until)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportRow {
    pub file_number: String,
    pub lot_name: String,
    pub recorded_at: NaiveDateTime,
    pub customer_name: String,
    pub address: String,
    pub old_meter: Option<String>,
    pub new_meter: Option<String>,
    pub technician_name: String,
    pub last_user: Option<String>,
}

pub const REPORT_COLUMNS: [&str; 9] = [
    "Ficha",
    "Lote",
    "Fecha",
    "Cliente",
    "Dirección",
    "Medidor anterior",
    "Medidor nuevo",
    "Técnico",
    "Último usuario",
];

/// Attachment name derived from what the report covers.
pub fn report_filename(kind: ReportKind, filter: &ReportFilter, rows: &[ReportRow]) -> String {
    let scope = match filter {
        ReportFilter::DateRange { start, end } => format!("{}_a_{}", start, end),
        ReportFilter::Lot(id) => {
            let name = rows
                .first()
                .map(|r| sanitize(&r.lot_name))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| id.to_string());
            format!("lote_{}", name)
        }
    };
    format!("reporte_{}_{}.xlsx", kind.slug(), scope)
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}
