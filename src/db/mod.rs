//! Store access for the rollover.
//!
//! Layout:
//! - `store.rs`: `PartitionStore` seam and its sqlx `Any` implementation
//! - `models.rs`: rows read back from the store
//! - `schema.rs`: SQLite schema standing in for the billing database locally

pub mod models;
pub mod schema;
pub mod store;

pub use models::LogRangeRow;
pub use schema::{SQLITE_DEV_CREATION_TEMPLATE, SQLITE_DEV_SCHEMA};
pub use store::{PartitionStore, SqlPartitionStore};
