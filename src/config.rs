use std::{env, net::SocketAddr, time::Duration};

use anyhow::{Context, Result, bail};

/// Default HTTP bind address (overridden by BIND_ADDR)
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Default database location (overridden by DATABASE_URL)
pub const DEFAULT_DATABASE_URL: &str = "sqlite://heartlink.db?mode=rwc";

/// Default pool size (overridden by DB_MAX_CONNECTIONS)
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 16;

/// Default token lifetime in days (overridden by TOKEN_TTL_DAYS)
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// Default upstream companion timeout (overridden by COMPANION_TIMEOUT_MS)
pub const DEFAULT_COMPANION_TIMEOUT_MS: u64 = 5_000;

/// Default log filter when RUST_LOG is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub message_key_secret: String,
    pub companion_url: Option<String>,
    pub companion_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so tests don't touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr_str = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_addr_str
            .parse()
            .with_context(|| format!("Invalid bind address: {bind_addr_str}"))?;

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());

        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        let token_ttl_days = parse_or(&lookup, "TOKEN_TTL_DAYS", DEFAULT_TOKEN_TTL_DAYS)?;
        let companion_timeout_ms = parse_or(&lookup, "COMPANION_TIMEOUT_MS", DEFAULT_COMPANION_TIMEOUT_MS)?;

        let jwt_secret = required(&lookup, "JWT_SECRET")?;
        let message_key_secret = required(&lookup, "MESSAGE_KEY_SECRET")?;

        let companion_url = lookup("COMPANION_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            bind_addr,
            database_url,
            db_max_connections,
            jwt_secret,
            token_ttl_days,
            message_key_secret,
            companion_url,
            companion_timeout: Duration::from_millis(companion_timeout_ms),
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    match lookup(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!("{key} must be set"),
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid {key}: {raw}")),
        None => Ok(default),
    }
}
