//! Bank domain model.

use crate::model::entity::{
    bool_column, require_text, Entity, EntityId, FieldDescriptor, FieldKind, FieldValue,
    ValidationError,
};
use crate::repo::error::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: Option<EntityId>,
    pub name: String,
    /// Clearing code, e.g. `0001`.
    pub code: String,
    pub active: bool,
}

impl Bank {
    pub fn new(name: impl Into<String>, code: impl Into<String>, active: bool) -> Self {
        Self {
            id: None,
            name: name.into(),
            code: code.into(),
            active,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankTemplate {
    pub id: Option<EntityId>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub active: Option<bool>,
}

const BANK_FIELDS: &[FieldDescriptor<BankTemplate>] = &[
    FieldDescriptor::new("id", "id", FieldKind::Identity, |t: &BankTemplate| {
        t.id.map(FieldValue::Integer)
    }),
    FieldDescriptor::new("name", "name", FieldKind::Text, |t: &BankTemplate| {
        t.name.clone().map(FieldValue::Text)
    }),
    FieldDescriptor::new("code", "code", FieldKind::Text, |t: &BankTemplate| {
        t.code.clone().map(FieldValue::Text)
    }),
    FieldDescriptor::new("active", "active", FieldKind::Boolean, |t: &BankTemplate| {
        t.active.map(FieldValue::Boolean)
    }),
];

impl Entity for Bank {
    type Template = BankTemplate;

    const NAME: &'static str = "bank";
    const TABLE: &'static str = "banks";

    fn fields() -> &'static [FieldDescriptor<BankTemplate>] {
        BANK_FIELDS
    }

    fn id_template(id: EntityId) -> BankTemplate {
        BankTemplate {
            id: Some(id),
            ..BankTemplate::default()
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
            name: row.get("name")?,
            code: row.get("code")?,
            active: bool_column(row, "active")?,
        })
    }

    fn column_values(&self) -> RepoResult<Vec<(&'static str, Value)>> {
        Ok(vec![
            ("name", Value::Text(self.name.clone())),
            ("code", Value::Text(self.code.clone())),
            ("active", Value::Integer(i64::from(self.active))),
        ])
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("code", &self.code)
    }
}
