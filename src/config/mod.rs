/// Application settings (`pos-ledger.toml` plus environment overrides)
pub mod app;

/// Seed catalog loading from `catalog.toml`
pub mod catalog;

/// Database connection management and migrations
pub mod database;

pub use app::{AppConfig, load_app_configuration};
