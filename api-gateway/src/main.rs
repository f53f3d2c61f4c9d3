//! Wallet API server

use std::net::SocketAddr;
use std::sync::Arc;

use api_gateway::config::AppConfig;
use api_gateway::{router, AppState};
use clap::Parser;
use common::db::{init_db_pool, run_migrations, spawn_pool_monitor};
use common::error::Error;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};
use wallet_service::{WalletService, WalletServiceConfig};

/// Wallet API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address, defaults to 0.0.0.0:$PORT
    #[clap(short, long)]
    addr: Option<String>,

    /// Run with in-memory ledger and cache instead of PostgreSQL and Redis
    #[clap(long)]
    in_memory: bool,

    /// Do not apply database migrations at startup
    #[clap(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Debug logging enabled");

    let app_config = AppConfig::new();
    let service_config = WalletServiceConfig::from_env();

    // Initialize services
    let (wallet_service, pool) = if args.in_memory {
        info!("Running with in-memory ledger and balance cache");
        (WalletService::in_memory(), None)
    } else {
        let database_url = service_config
            .database_url
            .as_deref()
            .ok_or_else(|| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?;
        let pool = init_db_pool(database_url, &service_config.db_pool).await?;

        if !args.skip_migrations {
            if let Err(e) = run_migrations(&pool, &service_config.migrations_dir).await {
                warn!("Failed to apply migrations: {}", e);
            }
        }

        let service = WalletService::with_config(&service_config, pool.clone()).await?;
        (service, Some(pool))
    };

    let pool_monitor = match (&pool, service_config.pool_stats_interval) {
        (Some(pool), Some(interval)) => Some(spawn_pool_monitor(pool.clone(), interval)),
        _ => None,
    };

    let state = Arc::new(AppState {
        wallet_service: Arc::new(wallet_service),
    });
    let app = router(state, app_config.request_timeout);

    // Start the server
    let addr: SocketAddr = match args.addr {
        Some(addr) => addr.parse()?,
        None => SocketAddr::from(([0, 0, 0, 0], app_config.port)),
    };
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    // Run until interrupt signal
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(monitor) = pool_monitor {
        monitor.abort();
    }
    if let Some(pool) = pool {
        pool.close().await;
        info!("Database pool closed");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
