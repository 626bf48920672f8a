//! Configuration loading from the process environment.

use std::net::SocketAddr;

use thiserror::Error;

use obraledger_auth::Email;
use obraledger_ledger::{DEFAULT_EMPLOYEE_WINDOW_HOURS, VisibilityWindow};

pub const BIND_ADDR_VAR: &str = "OBRALEDGER_BIND_ADDR";
pub const JWT_SECRET_VAR: &str = "JWT_SECRET";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const ADMIN_EMAILS_VAR: &str = "OBRALEDGER_ADMIN_EMAILS";
pub const WINDOW_HOURS_VAR: &str = "OBRALEDGER_EMPLOYEE_WINDOW_HOURS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Postgres when set; the in-memory store otherwise.
    pub database_url: Option<String>,
    pub admin_emails: Vec<Email>,
    pub window: VisibilityWindow,
    /// Whether `jwt_secret` is the insecure development default.
    pub dev_secret: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get(BIND_ADDR_VAR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid(BIND_ADDR_VAR, e.to_string()))?;

        let (jwt_secret, dev_secret) = match get(JWT_SECRET_VAR) {
            Some(secret) => (secret, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        let admin_emails = get(ADMIN_EMAILS_VAR)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Email::parse(s).map_err(|e| ConfigError::invalid(ADMIN_EMAILS_VAR, e.to_string())))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let hours = match get(WINDOW_HOURS_VAR) {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|e| ConfigError::invalid(WINDOW_HOURS_VAR, e.to_string()))?,
            None => DEFAULT_EMPLOYEE_WINDOW_HOURS,
        };
        let window =
            VisibilityWindow::hours(hours).map_err(|e| ConfigError::invalid(WINDOW_HOURS_VAR, e.to_string()))?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url: get(DATABASE_URL_VAR),
            admin_emails,
            window,
            dev_secret,
        })
    }

    /// Configuration for tests: in-memory store, ephemeral port.
    pub fn for_tests(jwt_secret: &str, admin_emails: Vec<Email>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.to_string(),
            database_url: None,
            admin_emails,
            window: VisibilityWindow::default(),
            dev_secret: false,
        }
    }
}
