//! Configuration for the wallet service

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use common::db::DbPoolSettings;

/// Default time-to-live of cached balances
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Configuration for the wallet service
#[derive(Debug, Clone)]
pub struct WalletServiceConfig {
    /// Database URL. Required for the PostgreSQL ledger.
    pub database_url: Option<String>,
    /// Database connection pool settings
    pub db_pool: DbPoolSettings,
    /// Redis URL. The in-memory cache is used when unset.
    pub redis_url: Option<String>,
    /// Time-to-live of cached balances
    pub cache_ttl: Duration,
    /// Interval between pool statistics reports, `None` disables them
    pub pool_stats_interval: Option<Duration>,
    /// Directory holding the SQL migrations
    pub migrations_dir: PathBuf,
}

fn env_secs(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl Default for WalletServiceConfig {
    fn default() -> Self {
        let pool_defaults = DbPoolSettings::default();
        Self {
            database_url: env::var("DATABASE_URL").ok(),
            db_pool: DbPoolSettings {
                max_connections: env::var("DB_POOL_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(pool_defaults.max_connections),
                max_lifetime: env_secs("DB_MAX_LIFETIME_SECS").unwrap_or(pool_defaults.max_lifetime),
                acquire_timeout: env_secs("DB_ACQUIRE_TIMEOUT_SECS").unwrap_or(pool_defaults.acquire_timeout),
            },
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            cache_ttl: env_secs("CACHE_TTL_SECS").unwrap_or(DEFAULT_CACHE_TTL),
            pool_stats_interval: match env_secs("POOL_STATS_INTERVAL_SECS") {
                Some(d) if d.is_zero() => None,
                Some(d) => Some(d),
                None => Some(Duration::from_secs(5)),
            },
            migrations_dir: env::var("MIGRATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("migrations")),
        }
    }
}

impl WalletServiceConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create a new configuration with custom values
    pub fn new(database_url: String, redis_url: Option<String>, cache_ttl: Duration) -> Self {
        Self {
            database_url: Some(database_url),
            redis_url,
            cache_ttl,
            ..Self::default()
        }
    }
}
