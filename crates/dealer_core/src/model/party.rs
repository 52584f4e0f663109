//! People and business partners.
//!
//! # Invariants
//! - A partner always references a saved person.
//! - Classifier references are stored as foreign keys and hydrated after
//!   reads through the issuing DAO's hydrator.

use crate::model::classifier::{Classifier, ClassifierTemplate};
use crate::model::entity::{
    bool_column, require_text, Entity, EntityId, FieldDescriptor, FieldKind, FieldValue,
    Reference, ValidationError,
};
use crate::repo::dao::Hydrator;
use crate::repo::error::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Option<EntityId>,
    pub name: String,
    /// Tax or identity document number, digits only.
    pub document: String,
    pub email: Option<String>,
    /// Entry of the `PERSON_CLASSIFICATION` taxonomy.
    pub classification: Option<Reference<Classifier>>,
}

impl Person {
    pub fn new(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            document: document.into(),
            email: None,
            classification: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonTemplate {
    pub id: Option<EntityId>,
    pub name: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub classification: Option<ClassifierTemplate>,
}

const PERSON_FIELDS: &[FieldDescriptor<PersonTemplate>] = &[
    FieldDescriptor::new("id", "id", FieldKind::Identity, |t: &PersonTemplate| {
        t.id.map(FieldValue::Integer)
    }),
    FieldDescriptor::new("name", "name", FieldKind::Text, |t: &PersonTemplate| {
        t.name.clone().map(FieldValue::Text)
    }),
    FieldDescriptor::new("document", "document", FieldKind::Text, |t: &PersonTemplate| {
        t.document.clone().map(FieldValue::Text)
    }),
    FieldDescriptor::new("email", "email", FieldKind::Text, |t: &PersonTemplate| {
        t.email.clone().map(FieldValue::Text)
    }),
    FieldDescriptor::new(
        "classification",
        "classification_id",
        FieldKind::Reference,
        |t: &PersonTemplate| {
            t.classification
                .as_ref()
                .map(FieldValue::nested::<Classifier>)
        },
    ),
];

impl Entity for Person {
    type Template = PersonTemplate;

    const NAME: &'static str = "person";
    const TABLE: &'static str = "persons";

    fn fields() -> &'static [FieldDescriptor<PersonTemplate>] {
        PERSON_FIELDS
    }

    fn id_template(id: EntityId) -> PersonTemplate {
        PersonTemplate {
            id: Some(id),
            ..PersonTemplate::default()
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
            document: row.get("document")?,
            email: row.get("email")?,
            classification: row
                .get::<_, Option<EntityId>>("classification_id")?
                .map(Reference::Stub),
        })
    }

    fn column_values(&self) -> RepoResult<Vec<(&'static str, Value)>> {
        let classification_id = match &self.classification {
            Some(reference) => Value::Integer(reference.require_id("classification")?),
            None => Value::Null,
        };

        Ok(vec![
            ("name", Value::Text(self.name.clone())),
            ("document", Value::Text(self.document.clone())),
            (
                "email",
                self.email.clone().map_or(Value::Null, Value::Text),
            ),
            ("classification_id", classification_id),
        ])
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("document", &self.document)
    }

    fn hydrate(&mut self, hydrator: &Hydrator<'_>) -> RepoResult<()> {
        if let Some(Reference::Stub(id)) = self.classification {
            let classifier = hydrator.load::<Classifier>(id)?;
            self.classification = Some(Reference::loaded(classifier));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: Option<EntityId>,
    pub person: Reference<Person>,
    pub trade_name: String,
    /// Entry of the `ACCOUNT_TYPE` taxonomy used for commission payouts.
    pub account_type: Option<Reference<Classifier>>,
    pub active: bool,
}

impl Partner {
    pub fn new(person: Reference<Person>, trade_name: impl Into<String>) -> Self {
        Self {
            id: None,
            person,
            trade_name: trade_name.into(),
            account_type: None,
            active: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerTemplate {
    pub id: Option<EntityId>,
    pub person: Option<PersonTemplate>,
    pub trade_name: Option<String>,
    pub account_type: Option<ClassifierTemplate>,
    pub active: Option<bool>,
}

const PARTNER_FIELDS: &[FieldDescriptor<PartnerTemplate>] = &[
    FieldDescriptor::new("id", "id", FieldKind::Identity, |t: &PartnerTemplate| {
        t.id.map(FieldValue::Integer)
    }),
    FieldDescriptor::new(
        "person",
        "person_id",
        FieldKind::Reference,
        |t: &PartnerTemplate| t.person.as_ref().map(FieldValue::nested::<Person>),
    ),
    FieldDescriptor::new(
        "trade_name",
        "trade_name",
        FieldKind::Text,
        |t: &PartnerTemplate| t.trade_name.clone().map(FieldValue::Text),
    ),
    FieldDescriptor::new(
        "account_type",
        "account_type_id",
        FieldKind::Reference,
        |t: &PartnerTemplate| {
            t.account_type
                .as_ref()
                .map(FieldValue::nested::<Classifier>)
        },
    ),
    FieldDescriptor::new("active", "active", FieldKind::Boolean, |t: &PartnerTemplate| {
        t.active.map(FieldValue::Boolean)
    }),
];

impl Entity for Partner {
    type Template = PartnerTemplate;

    const NAME: &'static str = "partner";
    const TABLE: &'static str = "partners";

    fn fields() -> &'static [FieldDescriptor<PartnerTemplate>] {
        PARTNER_FIELDS
    }

    fn id_template(id: EntityId) -> PartnerTemplate {
        PartnerTemplate {
            id: Some(id),
            ..PartnerTemplate::default()
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
            person: Reference::Stub(row.get("person_id")?),
            trade_name: row.get("trade_name")?,
            account_type: row
                .get::<_, Option<EntityId>>("account_type_id")?
                .map(Reference::Stub),
            active: bool_column(row, "active")?,
        })
    }

    fn column_values(&self) -> RepoResult<Vec<(&'static str, Value)>> {
        let account_type_id = match &self.account_type {
            Some(reference) => Value::Integer(reference.require_id("account_type")?),
            None => Value::Null,
        };

        Ok(vec![
            ("person_id", Value::Integer(self.person.require_id("person")?)),
            ("trade_name", Value::Text(self.trade_name.clone())),
            ("account_type_id", account_type_id),
            ("active", Value::Integer(i64::from(self.active))),
        ])
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.person.require_id("person")?;
        require_text("trade_name", &self.trade_name)
    }

    fn hydrate(&mut self, hydrator: &Hydrator<'_>) -> RepoResult<()> {
        if let Reference::Stub(id) = self.person {
            let person = hydrator.load::<Person>(id)?;
            self.person = Reference::loaded(person);
        }
        if let Some(Reference::Stub(id)) = self.account_type {
            let classifier = hydrator.load::<Classifier>(id)?;
            self.account_type = Some(Reference::loaded(classifier));
        }
        Ok(())
    }
}
