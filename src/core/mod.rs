//! Core business logic - framework-agnostic catalog, ledger and reporting operations.
//!
//! Every function takes a database connection and returns a crate [`Result`](crate::errors::Result);
//! nothing here knows about the CLI or the HTTP client.

pub mod catalog;
pub mod line_item;
pub mod order;
pub mod report;
pub mod sale;
pub mod seed;
