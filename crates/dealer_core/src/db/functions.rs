//! Application-defined SQL functions registered on every connection.
//!
//! # Invariants
//! - Registered before migrations run, so every connection returned by
//!   `open_db*` can evaluate them.
//! - Functions are deterministic and never touch stored data.

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::Connection;

/// Unicode-aware lowercase. SQLite's built-in `LOWER()` folds ASCII only.
pub const UNICODE_LOWER: &str = "unicode_lower";

pub fn register_sql_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        unicode_lower,
    )
}

fn unicode_lower(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
    match ctx.get_raw(0) {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => Ok(Some(String::from_utf8_lossy(bytes).to_lowercase())),
        ValueRef::Integer(value) => Ok(Some(value.to_string())),
        ValueRef::Real(value) => Ok(Some(value.to_string())),
        ValueRef::Blob(_) => Err(rusqlite::Error::UserFunctionError(
            format!("{UNICODE_LOWER} expects text, got a blob").into(),
        )),
    }
}
