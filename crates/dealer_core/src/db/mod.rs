//! Dealer database bootstrap.
//!
//! # Responsibility
//! - Open connections with foreign keys, busy timeout and the crate's SQL
//!   functions in place.
//! - Bring the classifier, party and model-range tables to the latest schema.
//! - Snapshot stored table layouts for the predicate compiler and executor.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A database written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod functions;
pub mod migrations;
mod open;
mod schema;

pub use functions::{register_sql_functions, UNICODE_LOWER};
pub use open::{
    open_db, open_db_in_memory, open_db_in_memory_with, open_db_with, ConnectionOptions,
};
pub use schema::SchemaCatalog;

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating a dealer database.
#[derive(Debug)]
pub enum DbError {
    /// Connection, pragma, function registration or migration SQL failed.
    Sqlite(rusqlite::Error),
    /// The file carries a schema this build does not know how to read.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Whether the failure comes from opening a database written by a newer build.
    pub fn is_newer_schema(&self) -> bool {
        matches!(self, Self::UnsupportedSchemaVersion { .. })
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "dealer database error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "dealer database schema {db_version} was written by a newer build; this build supports up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
