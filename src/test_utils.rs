//! Shared test utilities for the POS ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating catalog rows with sensible defaults.

use crate::{
    config::{app::DatabaseConfig, database::connect_and_migrate},
    core::catalog::{self, NewProduct, NewVariant},
    entities,
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database migrated to the latest revision.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    connect_and_migrate(&config).await
}

/// Creates a file-backed `SQLite` database with a pool of several connections, migrated to
/// the latest revision.
///
/// Use this when a test needs writers on separate connections. The database lives as
/// long as the returned [`TempDir`].
pub async fn setup_file_test_db() -> Result<(TempDir, DatabaseConnection)> {
    let dir = tempfile::tempdir()?;
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.path().join("pos.sqlite").display()),
        max_connections: 4,
        ..DatabaseConfig::default()
    };
    let db = connect_and_migrate(&config).await?;
    Ok((dir, db))
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * `description`: None
/// * `image_url`: None
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
) -> Result<entities::product::Model> {
    catalog::create_product(
        db,
        NewProduct {
            name: name.to_string(),
            description: None,
            price,
            image_url: None,
        },
    )
    .await
}

/// Creates a test variant with no size, color or price override.
pub async fn create_test_variant(
    db: &DatabaseConnection,
    product_id: i64,
    sku: &str,
    stock: i32,
) -> Result<entities::variant::Model> {
    catalog::create_variant(
        db,
        NewVariant {
            product_id,
            sku: sku.to_string(),
            size: None,
            color: None,
            price_override: None,
            stock,
        },
    )
    .await
}
