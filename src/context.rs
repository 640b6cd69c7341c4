//! Process-wide database access context.
//!
//! One [`PosContext`] is opened at startup and handed to every operation by reference.
//! There is no global connection: whoever opens the context closes it.

use crate::{
    config::{
        AppConfig,
        database::{create_connection, run_migrations},
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{info, instrument};

/// Open database connection plus the configuration it was opened with
#[derive(Debug)]
pub struct PosContext {
    /// Connection pool, already migrated
    pub db: DatabaseConnection,
    /// Shared application configuration
    pub config: Arc<AppConfig>,
}

impl PosContext {
    /// Connects to the configured database and applies pending migrations.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be opened or a migration fails.
    #[instrument(skip(config))]
    pub async fn open(config: Arc<AppConfig>) -> Result<Self> {
        let ctx = Self::connect(config).await?;
        run_migrations(&ctx.db).await?;
        info!("Database context opened");
        Ok(ctx)
    }

    /// Connects without touching the schema, for commands that manage migrations
    /// themselves.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be opened.
    pub async fn connect(config: Arc<AppConfig>) -> Result<Self> {
        let db = create_connection(&config.database).await?;
        Ok(Self { db, config })
    }

    /// Closes the connection pool.
    ///
    /// # Errors
    /// Returns an error if the pool fails to shut down cleanly.
    pub async fn close(self) -> Result<()> {
        self.db.close().await?;
        info!("Database context closed");
        Ok(())
    }
}
