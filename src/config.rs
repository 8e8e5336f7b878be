use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_payroll_per_min: u32,

    pub api_prefix: String,

    /// How far before "now" a leave may start, to absorb client clock and
    /// timezone skew.
    pub leave_grace_hours: i64,

    /// Webhook receiving post-commit notifications; unset disables delivery.
    pub notify_url: Option<String>,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,

            rate_protected_per_min: env_or("RATE_PROTECTED_PER_MIN", 1000)?,
            rate_payroll_per_min: env_or("RATE_PAYROLL_PER_MIN", 30)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            leave_grace_hours: env_or("LEAVE_GRACE_HOURS", 12)?,
            notify_url: env::var("NOTIFY_URL").ok().filter(|url| !url.trim().is_empty()),
        })
    }

    pub fn leave_grace(&self) -> chrono::Duration {
        chrono::Duration::hours(self.leave_grace_hours.max(0))
    }
}
