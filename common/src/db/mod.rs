//! Database pool construction, migrations and pool observation

use std::path::Path;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::Result;

/// Database pool type
pub type DbPool = Pool<Postgres>;

/// Connection pool settings
#[derive(Debug, Clone)]
pub struct DbPoolSettings {
    /// Maximum number of open connections
    pub max_connections: u32,
    /// Connections older than this are closed and replaced
    pub max_lifetime: Duration,
    /// How long a caller may wait for a free connection
    pub acquire_timeout: Duration,
}

impl Default for DbPoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 50,
            max_lifetime: Duration::from_secs(120),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str, settings: &DbPoolSettings) -> Result<DbPool> {
    info!("Connecting to PostgreSQL database with pool size: {}", settings.max_connections);

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .max_lifetime(settings.max_lifetime)
        .acquire_timeout(settings.acquire_timeout)
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL database");
    Ok(pool)
}

/// Run migrations from the given directory
pub async fn run_migrations(pool: &PgPool, migrations_dir: &Path) -> Result<()> {
    debug!("Applying migrations from {}", migrations_dir.display());

    sqlx::migrate::Migrator::new(migrations_dir)
        .await?
        .run(pool)
        .await?;

    Ok(())
}

/// Spawn a task that periodically logs pool statistics.
///
/// The task runs independently of request handling; the caller owns the
/// handle and aborts it on shutdown.
pub fn spawn_pool_monitor(pool: PgPool, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if pool.is_closed() {
                debug!("Pool closed, stopping pool monitor");
                break;
            }
            let size = pool.size();
            let idle = pool.num_idle() as u32;
            info!(
                open = size,
                idle,
                in_use = size.saturating_sub(idle),
                max = pool.options().get_max_connections(),
                "DB pool stats"
            );
        }
    })
}
