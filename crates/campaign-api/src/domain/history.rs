//! Append-only audit trail shared by acts, pre-surveys and labeled boxes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

}

impl FromStr for HistoryAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(DomainError::Internal(format!("unknown history action '{}'", s))),
        }
    }
}

/// Who did it and what happened, written next to the mutation it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryNote {
    pub user_id: i32,
    pub detail: String,
}

impl HistoryNote {
    pub fn new(user_id: i32, detail: impl Into<String>) -> Self {
        Self {
            user_id,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: i32,
    pub record_id: i32,
    pub action: HistoryAction,
    pub user_id: i32,
    pub username: Option<String>,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

/// Collects "field: old -> new" fragments for update details.
#[derive(Debug, Default)]
pub struct ChangeSet {
    changes: Vec<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track<T: PartialEq + std::fmt::Display>(&mut self, field: &str, old: &T, new: &T) {
        if old != new {
            self.changes.push(format!("{}: {} -> {}", field, old, new));
        }
    }

    pub fn summary(&self) -> String {
        if self.changes.is_empty() {
            "sin cambios".to_string()
        } else {
            self.changes.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_strings_match_history_column() {
        for action in [HistoryAction::Create, HistoryAction::Update, HistoryAction::Delete] {
            assert_eq!(action.as_str().parse::<HistoryAction>().ok(), Some(action));
        }
        assert!("create".parse::<HistoryAction>().is_err());
    }

    #[test]
    fn change_set_lists_only_changed_fields() {
        let mut changes = ChangeSet::new();
        changes.track("ficha", &"1001".to_string(), &"1002".to_string());
        changes.track("lectura", &12.5, &12.5);
        assert_eq!(changes.summary(), "ficha: 1001 -> 1002");

        assert_eq!(ChangeSet::new().summary(), "sin cambios");
    }
}
