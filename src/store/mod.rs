//! Record storage: dynamic-table CRUD gateway and schema for persistent
//! storage.
//!
//! Layout:
//! - `records.rs`: the table-parameterized CRUD executor
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)

pub mod records;
pub mod schema;

pub use records::{JsonRecord, RecordStore, SqlitePool};
pub use schema::SQLITE_INIT;

use crate::error::FolioError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Open the pooled connection used process-wide. The pool is constructed
/// once at startup and handed to `AppState`; each query leases a connection
/// and returns it on every exit path.
pub async fn connect(database_url: &str) -> Result<SqlitePool, FolioError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    Ok(SqlitePoolOptions::new().connect_with(connect_opts).await?)
}
