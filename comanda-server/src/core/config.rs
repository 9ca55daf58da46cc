use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;

use super::error::{Result, ServerError};

/// Server configuration
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | database, backups and logs |
/// | DATABASE_FILE | comanda.db | SQLite file under WORK_DIR |
/// | HTTP_HOST | 0.0.0.0 | listen address |
/// | HTTP_PORT | 8000 | listen port |
/// | ENVIRONMENT | development | development \| production |
/// | LOG_LEVEL | info | overridden by RUST_LOG |
/// | LOG_JSON | true in production | JSON log lines |
/// | TIMEZONE | UTC | business day for reports |
/// | BACKUP_INTERVAL_SECS | 3600 | 0 disables periodic backups |
/// | BACKUP_RETENTION | 24 | backup files kept |
/// | RESET_ORDERS_ON_STARTUP | false | wipe orders and notes at boot |
/// | ADMIN_PIN | - | bootstrap admin when none exists |
/// | JWT_SECRET | generated in debug builds | token signing key |
/// | JWT_EXPIRATION_MINUTES | 720 | token lifetime |
/// | PIN_RATE_LIMIT | 5 | PIN checks per window and IP |
/// | PIN_RATE_WINDOW_SECS | 60 | rate limit window |
/// | TRUSTED_PROXY | - | peer allowed to set X-Forwarded-For |
/// | AUDIT_BUFFER | 1024 | audit queue capacity |
///
/// ```ignore
/// WORK_DIR=/srv/comanda HTTP_PORT=8080 TIMEZONE=America/Argentina/Buenos_Aires cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub database_file: String,
    pub http_host: String,
    pub http_port: u16,
    /// development | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub timezone: Tz,
    pub backup_interval_secs: u64,
    pub backup_retention: usize,
    pub reset_orders_on_startup: bool,
    pub admin_pin: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_expiration_minutes: i64,
    pub pin_rate_limit: u32,
    pub pin_rate_window_secs: u64,
    /// Reverse proxy whose `X-Forwarded-For` is believed; unset means peers are clients
    pub trusted_proxy: Option<IpAddr>,
    pub audit_buffer: usize,
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.into())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load from environment variables, falling back to defaults.
    ///
    /// Fails on an unknown `TIMEZONE` or a malformed `TRUSTED_PROXY`.
    pub fn from_env() -> Result<Self> {
        let environment = env_string("ENVIRONMENT", "development");
        let production = environment == "production";

        let tz_name = env_string("TIMEZONE", "UTC");
        let timezone = Tz::from_str(tz_name.trim())
            .map_err(|_| ServerError::Config(format!("Unknown TIMEZONE: {tz_name}")))?;

        let trusted_proxy = env_optional("TRUSTED_PROXY")
            .map(|raw| {
                raw.trim()
                    .parse::<IpAddr>()
                    .map_err(|_| ServerError::Config(format!("Invalid TRUSTED_PROXY: {raw}")))
            })
            .transpose()?;

        Ok(Self {
            work_dir: env_string("WORK_DIR", "./data"),
            database_file: env_string("DATABASE_FILE", "comanda.db"),
            http_host: env_string("HTTP_HOST", "0.0.0.0"),
            http_port: env_parse("HTTP_PORT", 8000),
            log_level: env_string("LOG_LEVEL", "info"),
            log_json: env_parse("LOG_JSON", production),
            environment,
            timezone,
            backup_interval_secs: env_parse("BACKUP_INTERVAL_SECS", 3600),
            backup_retention: env_parse("BACKUP_RETENTION", 24),
            reset_orders_on_startup: env_parse("RESET_ORDERS_ON_STARTUP", false),
            admin_pin: env_optional("ADMIN_PIN"),
            jwt_secret: env_optional("JWT_SECRET"),
            jwt_expiration_minutes: env_parse("JWT_EXPIRATION_MINUTES", 720),
            pin_rate_limit: env_parse("PIN_RATE_LIMIT", 5),
            pin_rate_window_secs: env_parse("PIN_RATE_WINDOW_SECS", 60),
            trusted_proxy,
            audit_buffer: env_parse("AUDIT_BUFFER", 1024),
        })
    }

    /// Override a few values, mostly for tests.
    ///
    /// Environment problems fall back to defaults here.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env().unwrap_or_default();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.database_file)
    }

    pub fn backups_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("backups")
    }

    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create work, backup and log directories
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(self.backups_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    /// Built-in defaults, ignoring the environment
    fn default() -> Self {
        Self {
            work_dir: "./data".into(),
            database_file: "comanda.db".into(),
            http_host: "0.0.0.0".into(),
            http_port: 8000,
            environment: "development".into(),
            log_level: "info".into(),
            log_json: false,
            timezone: Tz::UTC,
            backup_interval_secs: 3600,
            backup_retention: 24,
            reset_orders_on_startup: false,
            admin_pin: None,
            jwt_secret: None,
            jwt_expiration_minutes: 720,
            pin_rate_limit: 5,
            pin_rate_window_secs: 60,
            trusted_proxy: None,
            audit_buffer: 1024,
        }
    }
}
