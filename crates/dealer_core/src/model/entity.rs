//! Entity shape contracts shared by every persisted record.
//!
//! # Responsibility
//! - Describe an entity's table, field descriptors and row mapping once.
//! - Bind a Query Template into a list of constrained fields.
//!
//! # Invariants
//! - Every template field is an `Option`; `None` means "no constraint".
//! - `Some(false)` and `Some(0)` are real constraints.
//! - `Some("")` on a text field is treated as unconstrained.
//! - Identity is a storage-generated `i64`, absent until the first save.

use crate::repo::dao::Hydrator;
use crate::repo::error::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-generated numeric identity shared by every entity.
pub type EntityId = i64;

/// Column holding the identity for every entity table.
pub const ID_COLUMN: &str = "id";

/// Type of one declared entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The entity's own identity column.
    Identity,
    Integer,
    Text,
    Boolean,
    /// Foreign key to another entity, filterable by identity or by the
    /// nested entity's own fields.
    Reference,
}

/// Value carried by one constrained template field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Boolean(bool),
    Reference(NestedTemplate),
}

impl FieldValue {
    /// Binds a nested entity template for a `FieldKind::Reference` field.
    pub fn nested<E: Entity>(template: &E::Template) -> Self {
        Self::Reference(NestedTemplate::bind::<E>(template))
    }

    /// Returns whether this value restricts the result set.
    pub fn is_constrained(&self) -> bool {
        match self {
            Self::Text(text) => !text.is_empty(),
            Self::Reference(nested) => nested.id.is_some() || !nested.fields.is_empty(),
            Self::Integer(_) | Self::Boolean(_) => true,
        }
    }

    /// Converts a scalar value into its SQLite representation.
    ///
    /// Returns `None` for references, which are never bound directly.
    pub fn to_sql_value(&self) -> Option<Value> {
        match self {
            Self::Integer(value) => Some(Value::Integer(*value)),
            Self::Text(value) => Some(Value::Text(value.clone())),
            Self::Boolean(value) => Some(Value::Integer(i64::from(*value))),
            Self::Reference(_) => None,
        }
    }
}

/// Template of a referenced entity, bound against that entity's descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedTemplate {
    pub table: &'static str,
    /// Identity of the referenced entity when the caller knows it.
    pub id: Option<EntityId>,
    /// Constrained non-identity fields of the referenced entity.
    pub fields: Vec<BoundField>,
}

impl NestedTemplate {
    fn bind<E: Entity>(template: &E::Template) -> Self {
        let mut id = None;
        let mut fields = Vec::new();
        for field in bind_template::<E>(template) {
            match (field.kind, &field.value) {
                (FieldKind::Identity, FieldValue::Integer(value)) => id = Some(*value),
                _ => fields.push(field),
            }
        }

        Self {
            table: E::TABLE,
            id,
            fields,
        }
    }
}

/// One template field that passed the "is constrained" check.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundField {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    pub value: FieldValue,
}

/// Declares one filterable field of an entity template.
///
/// Registered once per entity as a static list; the predicate compiler
/// iterates this list instead of inspecting the template by reflection.
pub struct FieldDescriptor<T> {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    pub accessor: fn(&T) -> Option<FieldValue>,
}

impl<T> FieldDescriptor<T> {
    pub const fn new(
        name: &'static str,
        column: &'static str,
        kind: FieldKind,
        accessor: fn(&T) -> Option<FieldValue>,
    ) -> Self {
        Self {
            name,
            column,
            kind,
            accessor,
        }
    }
}

/// Returns the constrained fields of `template` in descriptor order.
pub fn bind_template<E: Entity>(template: &E::Template) -> Vec<BoundField> {
    E::fields()
        .iter()
        .filter_map(|descriptor| {
            let value = (descriptor.accessor)(template)?;
            if !value.is_constrained() {
                return None;
            }
            Some(BoundField {
                name: descriptor.name,
                column: descriptor.column,
                kind: descriptor.kind,
                value,
            })
        })
        .collect()
}

/// Persisted record shape handled by the generic DAO.
pub trait Entity: Sized {
    /// Query Template shape. `Default` is the universal template.
    type Template: Default + 'static;

    /// Human-readable name used in errors and log events.
    const NAME: &'static str;
    const TABLE: &'static str;

    fn fields() -> &'static [FieldDescriptor<Self::Template>];

    /// Template constraining only the identity field.
    fn id_template(id: EntityId) -> Self::Template;

    fn id(&self) -> Option<EntityId>;
    fn set_id(&mut self, id: EntityId);

    /// Maps one stored row into an entity.
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    /// Writable column values, identity excluded.
    fn column_values(&self) -> RepoResult<Vec<(&'static str, Value)>>;

    /// Write-time validation, called before every insert or update.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Loads nested references after row mapping.
    fn hydrate(&mut self, _hydrator: &Hydrator<'_>) -> RepoResult<()> {
        Ok(())
    }
}

/// Reference to another entity, either by identity only or fully loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference<E> {
    Stub(EntityId),
    Loaded(Box<E>),
}

impl<E: Entity> Reference<E> {
    pub fn loaded(entity: E) -> Self {
        Self::Loaded(Box::new(entity))
    }

    /// Identity of the referenced entity; `None` for a loaded entity that
    /// was never saved.
    pub fn id(&self) -> Option<EntityId> {
        match self {
            Self::Stub(id) => Some(*id),
            Self::Loaded(entity) => entity.id(),
        }
    }

    pub fn get(&self) -> Option<&E> {
        match self {
            Self::Stub(_) => None,
            Self::Loaded(entity) => Some(entity),
        }
    }

    /// Foreign key value for writes. Fails when the target is unsaved.
    pub fn require_id(&self, field: &'static str) -> Result<EntityId, ValidationError> {
        self.id().ok_or(ValidationError::UnsavedReference { field })
    }
}

/// Write-time validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField { field: &'static str },
    InvalidYearRange { start: i32, end: i32 },
    InvalidClassifierCode { field: &'static str, value: String },
    UnsavedReference { field: &'static str },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { field } => write!(f, "field `{field}` cannot be empty"),
            Self::InvalidYearRange { start, end } => {
                write!(f, "year range start {start} is after end {end}")
            }
            Self::InvalidClassifierCode { field, value } => {
                write!(f, "classifier {field} `{value}` must match [A-Z][A-Z0-9_]*")
            }
            Self::UnsavedReference { field } => {
                write!(f, "reference `{field}` points to an entity that was never saved")
            }
        }
    }
}

impl Error for ValidationError {}

/// Rejects blank required text.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

/// Reads a `0/1` integer column into a bool.
pub(crate) fn bool_column(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    use crate::repo::error::RepoError;

    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in column {column}"
        ))),
    }
}
