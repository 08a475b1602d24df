use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_max_size: u32,
    pub pool_timeout_seconds: u64,
    pub run_migrations: bool,
}

/// Shortest signing secret accepted at startup.
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "changeme", "secret", "jwt_secret"];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_seconds: u64,
    /// Password for the `admin` account created when the users table is empty.
    pub bootstrap_admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportConfig {
    /// Rows fetched per database round trip while building a report.
    pub batch_size: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.pool_max_size", 10)?
            .set_default("database.pool_timeout_seconds", 5)?
            .set_default("database.run_migrations", true)?
            .set_default("auth.token_expiry_seconds", 28_800)?
            .set_default("pagination.default_limit", 10)?
            .set_default("pagination.max_limit", 100)?
            .set_default("report.batch_size", 1000)?
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.auth.validate()?;
        Ok(settings)
    }
}

impl AuthConfig {
    /// Refuses secrets that would let anyone mint valid tokens.
    pub fn validate(&self) -> Result<()> {
        let secret = self.jwt_secret.trim();
        if secret.is_empty() {
            bail!("auth.jwt_secret is not set; provide APP__AUTH__JWT_SECRET");
        }
        if PLACEHOLDER_SECRETS
            .iter()
            .any(|p| secret.eq_ignore_ascii_case(p))
        {
            bail!("auth.jwt_secret still holds a placeholder value");
        }
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            bail!(
                "auth.jwt_secret must be at least {} characters",
                MIN_JWT_SECRET_LENGTH
            );
        }
        if let Some(password) = &self.bootstrap_admin_password {
            if password.trim().is_empty() {
                bail!("auth.bootstrap_admin_password is set but empty");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.into(),
            token_expiry_seconds: 3600,
            bootstrap_admin_password: None,
        }
    }

    #[test]
    fn placeholder_and_short_secrets_are_refused() {
        assert!(auth("").validate().is_err());
        assert!(auth("   ").validate().is_err());
        assert!(auth("change-me").validate().is_err());
        assert!(auth("CHANGE-ME").validate().is_err());
        assert!(auth("too-short-secret").validate().is_err());
    }

    #[test]
    fn long_random_secret_is_accepted() {
        assert!(auth("k3J9vQ2xL8pR5tW1zN7bM4cF6hY0sD2a").validate().is_ok());
    }

    #[test]
    fn blank_bootstrap_password_is_refused() {
        let mut config = auth("k3J9vQ2xL8pR5tW1zN7bM4cF6hY0sD2a");
        config.bootstrap_admin_password = Some(" ".into());
        assert!(config.validate().is_err());
    }
}
