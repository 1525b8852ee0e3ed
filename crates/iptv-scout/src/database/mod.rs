//! SeaORM-backed channel store
//!
//! The store is opened once per pipeline run, migrated (tables are created on
//! first open), used sequentially after the batch has finished and closed
//! explicitly at the end of the run.

use sea_orm::{ConnectOptions, Database as SeaOrmDatabase, DatabaseConnection};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, AppResult};

pub mod migrations;
pub mod repositories;

use repositories::{
    AddressSeaOrmRepository, ChannelSeaOrmRepository, RankedResultSeaOrmRepository,
};

/// Lifetime of the single in-memory connection; recycling it drops the database
const IN_MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Database connection manager
#[derive(Clone)]
pub struct Database {
    connection: Arc<DatabaseConnection>,
    insert_batch_size: usize,
}

impl Database {
    /// Connect to the configured SQLite database
    pub async fn new(config: &DatabaseConfig) -> AppResult<Self> {
        if !config.url.starts_with("sqlite:") {
            return Err(AppError::configuration(format!(
                "Unsupported database URL format: {}",
                config.url
            )));
        }

        let connection_url = Self::ensure_sqlite_auto_creation(&config.url)?;

        let connect_options = Self::connect_options(&connection_url, config);

        let connection = match SeaOrmDatabase::connect(connect_options).await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("Database connection failed: {:?}", e);
                let mut source = e.source();
                let mut level = 0;
                while let Some(err) = source {
                    tracing::error!("  Level {}: {}", level, err);
                    source = err.source();
                    level += 1;
                }
                return Err(AppError::storage(format!(
                    "Failed to connect to database at '{}': {}",
                    config.url, e
                )));
            }
        };

        debug!("Database connection established");

        Ok(Self {
            connection: Arc::new(connection),
            insert_batch_size: config.insert_batch_size.max(1),
        })
    }

    /// Connect and bring the schema up to date
    pub async fn open(config: &DatabaseConfig) -> AppResult<Self> {
        let database = Self::new(config).await?;
        database.migrate().await?;
        Ok(database)
    }

    fn connect_options(connection_url: &str, config: &DatabaseConfig) -> ConnectOptions {
        let mut connect_options = ConnectOptions::new(connection_url);
        connect_options
            .connect_timeout(Duration::from_secs(5))
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);

        if Self::is_in_memory(connection_url) {
            connect_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(IN_MEMORY_CONNECTION_LIFETIME)
                .max_lifetime(IN_MEMORY_CONNECTION_LIFETIME);
        } else {
            connect_options
                .max_connections(config.max_connections.unwrap_or(5))
                .min_connections(1)
                .idle_timeout(Duration::from_secs(600))
                .max_lifetime(Duration::from_secs(1800));
        }
        connect_options
    }

    fn is_in_memory(url: &str) -> bool {
        url.contains(":memory:") || url.contains("mode=memory")
    }

    /// Ensure SQLite URL includes auto-creation mode if needed
    fn ensure_sqlite_auto_creation(url: &str) -> AppResult<String> {
        if url.contains("mode=") || url.contains(":memory:") {
            return Ok(url.to_string());
        }

        let file_path = if let Some(path) = url.strip_prefix("sqlite://") {
            path
        } else if let Some(path) = url.strip_prefix("sqlite:") {
            path
        } else {
            return Err(AppError::configuration(format!(
                "Invalid SQLite URL format: {url}"
            )));
        };
        let file_path = file_path.split('?').next().unwrap_or(file_path);

        let path = std::path::Path::new(file_path);
        if path.exists() {
            return Ok(url.to_string());
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::storage(format!(
                        "Failed to create directory for SQLite database {}: {e}",
                        parent.display()
                    ))
                })?;
                info!("Created directory for SQLite database: {}", parent.display());
            }
        }

        let auto_create_url = if url.contains('?') {
            format!("{url}&mode=rwc")
        } else {
            format!("{url}?mode=rwc")
        };
        debug!("Enabled SQLite auto-creation: {}", auto_create_url);
        Ok(auto_create_url)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> AppResult<()> {
        use migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        Migrator::up(&*self.connection, None)
            .await
            .map_err(|e| AppError::storage(format!("Failed to run migrations: {e}")))?;

        debug!("Database migrations completed");
        Ok(())
    }

    pub fn addresses(&self) -> AddressSeaOrmRepository {
        AddressSeaOrmRepository::new(self.connection.clone(), self.insert_batch_size)
    }

    pub fn channels(&self) -> ChannelSeaOrmRepository {
        ChannelSeaOrmRepository::new(self.connection.clone(), self.insert_batch_size)
    }

    pub fn ranked_results(&self) -> RankedResultSeaOrmRepository {
        RankedResultSeaOrmRepository::new(self.connection.clone(), self.insert_batch_size)
    }

    /// Close the underlying pool. Repositories still holding the
    /// connection keep it open until they are dropped.
    pub async fn close(self) -> AppResult<()> {
        match Arc::try_unwrap(self.connection) {
            Ok(connection) => {
                connection.close().await?;
                debug!("Database connection closed");
            }
            Err(_) => debug!("Database connection still shared, deferring close"),
        }
        Ok(())
    }
}
