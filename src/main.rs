//! Scan coordinator - operational entry point.
//!
//! Prepares the database schema for the session and report store.

use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use scan_coordinator_lib::config::Config;
use scan_coordinator_lib::db::DbPool;

/// Perform health check (for Docker healthcheck).
async fn health_check() -> bool {
    let Ok(config) = Config::from_env() else {
        return false;
    };
    match DbPool::new(&config).await {
        Ok(pool) => pool.ping().await.is_ok(),
        Err(_) => false,
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Check for --health-check flag (used by Docker HEALTHCHECK)
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(if health_check().await { 0 } else { 1 });
    }

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, SCAN_DATABASE_URL must be set");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Scan Coordinator");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if let Err(e) = pool.run_migrations().await {
        error!("{}", e);
        std::process::exit(1);
    }
    info!("Database migrations complete");

    info!(
        "Session transitions: {} ({} update attempts per status change)",
        if config.sessions.strict_transitions {
            "strict"
        } else {
            "unchecked"
        },
        config.sessions.update_retries
    );
}
