//! Users, roles and permission keys

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Permission keys seeded by the initial migration.
pub mod permissions {
    pub const ACT_READ: &str = "act.read";
    pub const ACT_WRITE: &str = "act.write";
    pub const ACT_DELETE: &str = "act.delete";
    pub const PRECATASTRAL_READ: &str = "precatastral.read";
    pub const PRECATASTRAL_WRITE: &str = "precatastral.write";
    pub const PRECATASTRAL_DELETE: &str = "precatastral.delete";
    pub const LOT_READ: &str = "lot.read";
    pub const LOT_WRITE: &str = "lot.write";
    pub const LOT_DELETE: &str = "lot.delete";
    pub const LABELED_READ: &str = "labeled.read";
    pub const LABELED_WRITE: &str = "labeled.write";
    pub const LABELED_DELETE: &str = "labeled.delete";
    pub const CUSTOMER_READ: &str = "customer.read";
    pub const CUSTOMER_WRITE: &str = "customer.write";
    pub const TECHNICIAN_READ: &str = "technician.read";
    pub const TECHNICIAN_WRITE: &str = "technician.write";
    pub const TECHNICIAN_DELETE: &str = "technician.delete";
    pub const METER_READ: &str = "meter.read";
    pub const METER_WRITE: &str = "meter.write";
    pub const USER_READ: &str = "user.read";
    pub const USER_WRITE: &str = "user.write";
    pub const USER_DELETE: &str = "user.delete";
    pub const ROLE_READ: &str = "role.read";
    pub const ROLE_WRITE: &str = "role.write";
    pub const ROLE_DELETE: &str = "role.delete";
    pub const REPORT_EXPORT: &str = "report.export";

    pub const ALL: &[&str] = &[
        ACT_READ,
        ACT_WRITE,
        ACT_DELETE,
        PRECATASTRAL_READ,
        PRECATASTRAL_WRITE,
        PRECATASTRAL_DELETE,
        LOT_READ,
        LOT_WRITE,
        LOT_DELETE,
        LABELED_READ,
        LABELED_WRITE,
        LABELED_DELETE,
        CUSTOMER_READ,
        CUSTOMER_WRITE,
        TECHNICIAN_READ,
        TECHNICIAN_WRITE,
        TECHNICIAN_DELETE,
        METER_READ,
        METER_WRITE,
        USER_READ,
        USER_WRITE,
        USER_DELETE,
        ROLE_READ,
        ROLE_WRITE,
        ROLE_DELETE,
        REPORT_EXPORT,
    ];

    pub fn is_known(key: &str) -> bool {
        ALL.contains(&key)
    }
}

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_ROLE: &str = "Administrador";

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub role_id: i32,
    pub role_name: String,
    pub created_at: DateTime<Utc>,
}

/// Everything login needs, never serialized.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
    pub permissions: Vec<String>,
}

/// A live user with the permission keys their role grants right now.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user: User,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UserInput {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role_id: i32,
}

pub const MIN_PASSWORD_LENGTH: usize = 6;

impl UserInput {
    /// `password_required` is true on create; updates may keep the old hash.
    pub fn validate(&mut self, password_required: bool) -> Result<(), DomainError> {
        self.username = self.username.trim().to_string();
        self.name = self.name.trim().to_string();
        if self.username.is_empty() || self.username.contains(char::is_whitespace) {
            return Err(DomainError::validation(
                "El usuario es obligatorio y no puede contener espacios.",
            ));
        }
        if self.name.is_empty() {
            return Err(DomainError::validation("El nombre es obligatorio."));
        }
        if self.role_id <= 0 {
            return Err(DomainError::validation("Debe seleccionar un rol."));
        }
        match &self.password {
            Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => Err(DomainError::validation(
                format!(
                    "La contraseña debe tener al menos {} caracteres.",
                    MIN_PASSWORD_LENGTH
                ),
            )),
            None if password_required => {
                Err(DomainError::validation("La contraseña es obligatoria."))
            }
            _ => Ok(()),
        }
    }
}

/// User row to persist once the password has been hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub username: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub role_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub username: Option<String>,
    pub role_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RoleInput {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl RoleInput {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(DomainError::validation("El nombre del rol es obligatorio."));
        }
        self.permissions.sort();
        self.permissions.dedup();
        if let Some(unknown) = self.permissions.iter().find(|p| !permissions::is_known(p)) {
            return Err(DomainError::validation(format!(
                "Permiso desconocido: {}",
                unknown
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Permission {
    pub id: i32,
    pub key: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_input_dedups_and_rejects_unknown_keys() {
        let mut input = RoleInput {
            name: "Supervisor".into(),
            permissions: vec![
                permissions::ACT_READ.into(),
                permissions::ACT_READ.into(),
                permissions::REPORT_EXPORT.into(),
            ],
        };
        input.validate().unwrap();
        assert_eq!(input.permissions, vec!["act.read", "report.export"]);

        input.permissions.push("act.fly".into());
        assert!(matches!(input.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn password_rules_differ_between_create_and_update() {
        let mut input = UserInput {
            username: "jperez".into(),
            name: "Juan Perez".into(),
            password: None,
            role_id: 2,
        };
        assert!(input.validate(true).is_err());
        assert!(input.validate(false).is_ok());

        input.password = Some("123".into());
        assert!(input.validate(false).is_err());
    }

    #[test]
    fn username_cannot_contain_spaces() {
        let mut input = UserInput {
            username: "juan perez".into(),
            name: "Juan".into(),
            password: Some("secreto1".into()),
            role_id: 1,
        };
        assert!(input.validate(true).is_err());
    }

    #[test]
    fn every_seeded_key_is_known() {
        assert!(permissions::ALL.iter().all(|k| permissions::is_known(k)));
        assert_eq!(permissions::ALL.len(), 26);
    }
}
