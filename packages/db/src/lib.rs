//! SurrealDB backing store for the recruitment data layer.
//!
//! This crate provides database connectivity, the raw row shapes of the
//! `job_descriptions` and `job_applications` tables, repositories behind the
//! [`JobStore`] and [`ApplicationStore`] traits, and a live change feed.
//!
//! # Features
//!
//! - `memory` (default): Use in-memory storage for testing
//! - `rocksdb`: Use RocksDB for persistent file-based storage

mod connection;
mod live;
mod rows;
mod schema;
mod store;
pub mod repositories;

pub use connection::{Database, DbConfig, DbError, connect};
pub use live::{BroadcastFeed, ChangeFeed, LiveFeed};
pub use rows::{
    ApplicationColumns, ApplicationFilter, ApplicationPatch, ApplicationRow, JobColumns,
    JobFilter, JobPatch, JobRow, Row, StatusUpdate,
};
pub use schema::{APPLICATIONS_TABLE, JOBS_TABLE, init_schema};
pub use store::{ApplicationStore, JobStore};

/// Connect and initialize the schema.
///
/// This should be called once at application startup.
pub async fn init(config: &DbConfig) -> Result<Database, DbError> {
    let db = connect(config).await?;
    init_schema(&db).await?;
    Ok(db)
}
