//! Database connection module.
//!
//! Builds `SeaORM` connect options from [`DatabaseConfig`], opens the pool, and brings the
//! schema to the latest revision through [`Migrator`]. Tables are never created from entity
//! definitions directly: the migration ledger is the single source of schema changes.

use crate::config::app::DatabaseConfig;
use crate::errors::Result;
use crate::migrator::{Migrator, applied_revision};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info, instrument};

/// Builds connect options for the configured database.
///
/// In-memory `SQLite` databases are private to a single connection, so the pool is pinned
/// to one connection for them.
#[must_use]
pub fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut options = ConnectOptions::new(config.url.clone());
    let max_connections = if config.is_sqlite_memory() {
        1
    } else {
        config.max_connections.max(1)
    };
    options
        .max_connections(max_connections)
        .min_connections(config.min_connections.min(max_connections))
        .connect_timeout(config.connect_timeout())
        .sqlx_logging(config.log_statements);
    options
}

/// Opens a connection pool for the configured database.
///
/// The cascade and restrict rules need `SQLite` foreign key enforcement. sqlx turns it on
/// for every connection it opens, pooled ones included.
#[instrument(skip(config), fields(url = %config.url))]
pub async fn create_connection(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    debug!("Opening database connection");
    Database::connect(connect_options(config))
        .await
        .map_err(Into::into)
}

/// Applies every pending migration.
///
/// # Errors
/// Returns `Error::Migration` if a revision refuses to apply, or `Error::Database` if the
/// connection fails mid-way.
#[instrument(skip(db))]
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None).await?;
    info!(
        "Database schema at revision {}",
        applied_revision(db).await?.unwrap_or_else(|| "<none>".to_string())
    );
    Ok(())
}

/// Opens the database and brings it to the latest schema revision.
pub async fn connect_and_migrate(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let db = create_connection(config).await?;
    run_migrations(&db).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{Order, Product, Sale, Variant};
    use crate::migrator::ORDER_ITEMS_REVISION;
    use crate::test_utils::setup_file_test_db;
    use sea_orm::{
        ConnectionTrait, DbBackend, EntityTrait, QuerySelect, Statement, TransactionTrait,
    };

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 10,
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_memory_database_is_pinned_to_one_connection() {
        let options = connect_options(&memory_config());
        assert_eq!(options.get_max_connections(), Some(1));
        assert_eq!(options.get_min_connections(), Some(1));
    }

    #[tokio::test]
    async fn test_connect_and_migrate() -> Result<()> {
        let db = connect_and_migrate(&memory_config()).await?;

        assert_eq!(
            applied_revision(&db).await?.as_deref(),
            Some(ORDER_ITEMS_REVISION)
        );
        // Tables exist and are queryable through the entities
        let _ = Product::find().limit(1).all(&db).await?;
        let _ = Variant::find().limit(1).all(&db).await?;
        let _ = Order::find().limit(1).all(&db).await?;
        let _ = Sale::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_run_migrations_twice_is_harmless() -> Result<()> {
        let db = create_connection(&memory_config()).await?;
        run_migrations(&db).await?;
        run_migrations(&db).await?;
        assert_eq!(
            applied_revision(&db).await?.as_deref(),
            Some(ORDER_ITEMS_REVISION)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced_on_every_pooled_connection() -> Result<()> {
        let (_dir, db) = setup_file_test_db().await?;

        // Each open transaction holds its own connection from the pool
        let mut held = Vec::new();
        for _ in 0..3 {
            held.push(db.begin().await?);
        }
        for txn in &held {
            let row = txn
                .query_one(Statement::from_string(
                    DbBackend::Sqlite,
                    "PRAGMA foreign_keys",
                ))
                .await?
                .unwrap();
            assert_eq!(row.try_get_by_index::<i32>(0)?, 1);
        }
        Ok(())
    }
}
