//! Repository error taxonomy.
//!
//! # Invariants
//! - `NotFound` is an empty-result signal; callers may treat it as `None`.
//! - `Consistency` is fatal: a query expected to be unique matched many rows.
//! - Storage failures other than the classifier uniqueness race propagate
//!   unchanged inside `Db`.

use crate::db::DbError;
use crate::model::entity::{EntityId, ValidationError};
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: EntityId,
    },
    Consistency {
        entity: &'static str,
        detail: String,
        rows: usize,
    },
    InvalidData(String),
    InvalidSort(String),
    MissingRequiredTable(&'static str),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns whether storage rejected a write on a uniqueness or other
    /// integrity constraint.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _))) => {
                err.code == ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Consistency {
                entity,
                detail,
                rows,
            } => write!(
                f,
                "{entity} query expected at most one row but matched {rows}: {detail}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::InvalidSort(field) => write!(f, "unknown sort field `{field}`"),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Collapses a result set that must hold at most one row.
pub(crate) fn at_most_one<T>(
    mut rows: Vec<T>,
    entity: &'static str,
    detail: impl FnOnce() -> String,
) -> RepoResult<Option<T>> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        count => Err(RepoError::Consistency {
            entity,
            detail: detail(),
            rows: count,
        }),
    }
}
