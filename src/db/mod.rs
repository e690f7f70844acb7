//! Database module providing connection management, migrations, and queries.

pub mod reports;
pub mod scans;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Shared handle to the document store.
///
/// Cloning is cheap; every clone uses the same underlying connection pool.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        Self::connect(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
    }

    /// Connect to `url` with explicit pool bounds.
    ///
    /// An in-memory SQLite URL needs `max_connections == 1`: every extra
    /// connection would open its own empty database.
    pub async fn connect(url: &str, max_connections: u32, min_connections: u32) -> AppResult<Self> {
        let mut options = ConnectOptions::new(url.to_string());
        options
            .max_connections(max_connections)
            .min_connections(min_connections)
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(DbPool { conn })
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))
    }

    /// Check that the database answers.
    pub async fn ping(&self) -> AppResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))
    }

    /// Get access to the connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}
