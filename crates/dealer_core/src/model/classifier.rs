//! Classifier: generic database-backed enumeration entry.
//!
//! # Invariants
//! - `(classifier_type, value)` is the natural key: unique and immutable.
//! - `id` is a generated surrogate used as foreign key everywhere else.
//! - Type and value are non-blank strings; only canonical registry entries
//!   are held to the `^[A-Z][A-Z0-9_]*$` code format.

use crate::model::entity::{
    require_text, Entity, EntityId, FieldDescriptor, FieldKind, FieldValue, ValidationError,
};
use crate::repo::error::RepoResult;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

static CLASSIFIER_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid classifier code regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifier {
    pub id: Option<EntityId>,
    /// Taxonomy name, serialized as `type`.
    #[serde(rename = "type")]
    pub classifier_type: String,
    pub value: String,
    pub label: String,
    pub description: String,
}

impl Classifier {
    pub fn from_definition(definition: &ClassifierDefinition<'_>) -> Self {
        Self {
            id: None,
            classifier_type: definition.classifier_type.to_string(),
            value: definition.value.to_string(),
            label: definition.label.to_string(),
            description: definition.description.to_string(),
        }
    }

    pub fn key(&self) -> (&str, &str) {
        (self.classifier_type.as_str(), self.value.as_str())
    }
}

/// Caller-supplied definition of one `(type, value)` pair.
///
/// Canonical taxonomies declare these as `'static` tables; ad hoc callers
/// may borrow runtime strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierDefinition<'a> {
    pub classifier_type: &'a str,
    pub value: &'a str,
    pub label: &'a str,
    pub description: &'a str,
}

impl ClassifierDefinition<'_> {
    /// Checks an ad hoc `(type, value)` pair: both non-blank, label present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("type", self.classifier_type)?;
        require_text("value", self.value)?;
        require_text("label", self.label)
    }

    /// Stricter check for canonical registry entries, whose codes are
    /// upper-case ASCII identifiers.
    pub fn validate_canonical(&self) -> Result<(), ValidationError> {
        self.validate()?;
        validate_code("type", self.classifier_type)?;
        validate_code("value", self.value)
    }
}

fn validate_code(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if CLASSIFIER_CODE_RE.is_match(value) {
        return Ok(());
    }
    Err(ValidationError::InvalidClassifierCode {
        field,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierTemplate {
    pub id: Option<EntityId>,
    pub classifier_type: Option<String>,
    pub value: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl ClassifierTemplate {
    /// Matches every entry of one taxonomy.
    pub fn of_type(classifier_type: impl Into<String>) -> Self {
        Self {
            classifier_type: Some(classifier_type.into()),
            ..Self::default()
        }
    }

    /// Matches the natural key.
    pub fn key(classifier_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            classifier_type: Some(classifier_type.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

const CLASSIFIER_FIELDS: &[FieldDescriptor<ClassifierTemplate>] = &[
    FieldDescriptor::new("id", "id", FieldKind::Identity, |t: &ClassifierTemplate| {
        t.id.map(FieldValue::Integer)
    }),
    FieldDescriptor::new("type", "type", FieldKind::Text, |t: &ClassifierTemplate| {
        t.classifier_type.clone().map(FieldValue::Text)
    }),
    FieldDescriptor::new("value", "value", FieldKind::Text, |t: &ClassifierTemplate| {
        t.value.clone().map(FieldValue::Text)
    }),
    FieldDescriptor::new("label", "label", FieldKind::Text, |t: &ClassifierTemplate| {
        t.label.clone().map(FieldValue::Text)
    }),
    FieldDescriptor::new(
        "description",
        "description",
        FieldKind::Text,
        |t: &ClassifierTemplate| t.description.clone().map(FieldValue::Text),
    ),
];

impl Entity for Classifier {
    type Template = ClassifierTemplate;

    const NAME: &'static str = "classifier";
    const TABLE: &'static str = "classifiers";

    fn fields() -> &'static [FieldDescriptor<ClassifierTemplate>] {
        CLASSIFIER_FIELDS
    }

    fn id_template(id: EntityId) -> ClassifierTemplate {
        ClassifierTemplate {
            id: Some(id),
            ..ClassifierTemplate::default()
        }
    }

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            classifier_type: row.get("type")?,
            value: row.get("value")?,
            label: row.get("label")?,
            description: row.get("description")?,
        })
    }

    fn column_values(&self) -> RepoResult<Vec<(&'static str, Value)>> {
        Ok(vec![
            ("type", Value::Text(self.classifier_type.clone())),
            ("value", Value::Text(self.value.clone())),
            ("label", Value::Text(self.label.clone())),
            ("description", Value::Text(self.description.clone())),
        ])
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ClassifierDefinition {
            classifier_type: &self.classifier_type,
            value: &self.value,
            label: &self.label,
            description: &self.description,
        }
        .validate()
    }
}
