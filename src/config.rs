//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Leaving `REVIEW_DATABASE_URL` unset
//! starts the service in read-only mode.

use std::net::SocketAddr;
use std::time::Duration;

use crate::store::postgres::PoolSettings;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Allowed CORS origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// `*`: any origin.
    Any,
    /// Exact origins.
    List(Vec<String>),
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`QcConfig::from_env`].
#[derive(Debug, Clone)]
pub struct QcConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// PostgreSQL connection string of the analytical source.
    pub source_database_url: String,

    /// PostgreSQL connection string of the review store. `None` means
    /// read-only mode.
    pub review_database_url: Option<String>,

    /// Maximum number of database connections per pool.
    pub database_max_connections: u32,

    /// Minimum idle connections per pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Whether to run the embedded review-store migrations at startup.
    pub review_store_migrate: bool,

    /// Name of the source table.
    pub source_table: String,

    /// Default products per page.
    pub page_size: u32,

    /// Largest accepted `page_size`.
    pub max_page_size: u32,

    /// Seconds a role lookup stays cached (0 disables caching).
    pub role_cache_ttl_secs: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Allowed CORS origins.
    pub cors_origins: CorsOrigins,

    /// Whether to mirror audit events into the analytical store.
    pub audit_export_enabled: bool,

    /// Connection string of the audit export target.
    pub audit_export_database_url: String,

    /// Table receiving exported audit events.
    pub audit_export_table: String,

    /// Value of the `source` column on exported events.
    pub audit_export_source: String,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl QcConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()?;

        let source_database_url = lookup("SOURCE_DATABASE_URL")
            .unwrap_or_else(|| "postgres://qc:qc@localhost:5432/image_qc".to_string());
        let review_database_url = lookup("REVIEW_DATABASE_URL").filter(|v| !v.trim().is_empty());

        let database_max_connections = parse_env(&lookup, "DATABASE_MAX_CONNECTIONS", 10);
        let database_min_connections = parse_env(&lookup, "DATABASE_MIN_CONNECTIONS", 1);
        let database_connect_timeout_secs =
            parse_env(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS", 5);
        let review_store_migrate = parse_env_bool(&lookup, "REVIEW_STORE_MIGRATE", true);

        let source_table =
            lookup("SOURCE_TABLE").unwrap_or_else(|| "qc_image_source".to_string());
        let max_page_size = parse_env(&lookup, "MAX_PAGE_SIZE", 100_u32).max(1);
        let page_size = parse_env(&lookup, "PAGE_SIZE", 100_u32).clamp(1, max_page_size);

        let role_cache_ttl_secs = parse_env(&lookup, "ROLE_CACHE_TTL_SECS", 60);
        let request_timeout_secs = parse_env(&lookup, "REQUEST_TIMEOUT_SECS", 30);
        let cors_origins = parse_cors(lookup("CORS_ORIGINS").as_deref());

        let audit_export_enabled = parse_env_bool(&lookup, "AUDIT_EXPORT_ENABLED", false);
        let audit_export_database_url =
            lookup("AUDIT_EXPORT_DATABASE_URL").unwrap_or_else(|| source_database_url.clone());
        let audit_export_table =
            lookup("AUDIT_EXPORT_TABLE").unwrap_or_else(|| "qc_audit_log".to_string());
        let audit_export_source =
            lookup("AUDIT_EXPORT_SOURCE").unwrap_or_else(|| "review_api".to_string());

        let event_bus_capacity = parse_env(&lookup, "EVENT_BUS_CAPACITY", 1024);
        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            source_database_url,
            review_database_url,
            database_max_connections,
            database_min_connections,
            database_connect_timeout_secs,
            review_store_migrate,
            source_table,
            page_size,
            max_page_size,
            role_cache_ttl_secs,
            request_timeout_secs,
            cors_origins,
            audit_export_enabled,
            audit_export_database_url,
            audit_export_table,
            audit_export_source,
            event_bus_capacity,
            log_format,
        })
    }

    /// Connection pool settings shared by every PostgreSQL store.
    #[must_use]
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.database_max_connections,
            min_connections: self.database_min_connections,
            connect_timeout: Duration::from_secs(self.database_connect_timeout_secs),
        }
    }

    /// Whether a review store is configured.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.review_database_url.is_none()
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

fn parse_cors(raw: Option<&str>) -> CorsOrigins {
    let origins: Vec<String> = raw
        .unwrap_or("*")
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsOrigins::Any
    } else {
        CorsOrigins::List(origins)
    }
}
