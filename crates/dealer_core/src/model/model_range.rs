//! Model-year ranged associations (item-to-model, product-to-model).
//!
//! # Invariants
//! - `year_start <= year_end`; both bounds are inclusive.
//! - For a fixed owner pair no two live associations should overlap. This
//!   is checked by the duplicate-range validator and is advisory only.

use crate::model::entity::{
    Entity, EntityId, FieldDescriptor, FieldKind, FieldValue, ValidationError,
};
use crate::repo::error::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Inclusive model-year interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidYearRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Single model year.
    pub fn year(year: i32) -> Self {
        Self {
            start: year,
            end: year,
        }
    }

    pub fn start(self) -> i32 {
        self.start
    }

    pub fn end(self) -> i32 {
        self.end
    }

    /// `[s1, e1]` and `[s2, e2]` overlap iff `s1 <= e2 && s2 <= e1`.
    pub fn overlaps(self, other: YearRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn contains(self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

/// Entity holding an owner pair and a model-year range.
pub trait RangedAssociation: Entity {
    const OWNER_A_COLUMN: &'static str;
    const OWNER_B_COLUMN: &'static str;
    const YEAR_START_COLUMN: &'static str = "year_start";
    const YEAR_END_COLUMN: &'static str = "year_end";

    fn owners(&self) -> (EntityId, EntityId);
    fn years(&self) -> YearRange;
}

macro_rules! ranged_association {
    (
        $(#[$meta:meta])*
        $name:ident, $template:ident, $fields:ident {
            entity: $entity_name:literal,
            table: $table:literal,
            owner_a: $owner_a:ident,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub id: Option<EntityId>,
            pub $owner_a: EntityId,
            pub model_id: EntityId,
            pub year_start: i32,
            pub year_end: i32,
        }

        impl $name {
            pub fn new($owner_a: EntityId, model_id: EntityId, years: YearRange) -> Self {
                Self {
                    id: None,
                    $owner_a,
                    model_id,
                    year_start: years.start(),
                    year_end: years.end(),
                }
            }
        }

        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $template {
            pub id: Option<EntityId>,
            pub $owner_a: Option<EntityId>,
            pub model_id: Option<EntityId>,
            pub year_start: Option<i32>,
            pub year_end: Option<i32>,
        }

        const $fields: &[FieldDescriptor<$template>] = &[
            FieldDescriptor::new("id", "id", FieldKind::Identity, |t: &$template| {
                t.id.map(FieldValue::Integer)
            }),
            FieldDescriptor::new(
                stringify!($owner_a),
                stringify!($owner_a),
                FieldKind::Integer,
                |t: &$template| t.$owner_a.map(FieldValue::Integer),
            ),
            FieldDescriptor::new("model_id", "model_id", FieldKind::Integer, |t: &$template| {
                t.model_id.map(FieldValue::Integer)
            }),
            FieldDescriptor::new("year_start", "year_start", FieldKind::Integer, |t: &$template| {
                t.year_start.map(|year| FieldValue::Integer(i64::from(year)))
            }),
            FieldDescriptor::new("year_end", "year_end", FieldKind::Integer, |t: &$template| {
                t.year_end.map(|year| FieldValue::Integer(i64::from(year)))
            }),
        ];

        impl Entity for $name {
            type Template = $template;

            const NAME: &'static str = $entity_name;
            const TABLE: &'static str = $table;

            fn fields() -> &'static [FieldDescriptor<$template>] {
                $fields
            }

            fn id_template(id: EntityId) -> $template {
                $template {
                    id: Some(id),
                    ..$template::default()
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
                    $owner_a: row.get(stringify!($owner_a))?,
                    model_id: row.get("model_id")?,
                    year_start: row.get("year_start")?,
                    year_end: row.get("year_end")?,
                })
            }

            fn column_values(&self) -> RepoResult<Vec<(&'static str, Value)>> {
                Ok(vec![
                    (stringify!($owner_a), Value::Integer(self.$owner_a)),
                    ("model_id", Value::Integer(self.model_id)),
                    ("year_start", Value::Integer(i64::from(self.year_start))),
                    ("year_end", Value::Integer(i64::from(self.year_end))),
                ])
            }

            fn validate(&self) -> Result<(), ValidationError> {
                YearRange::new(self.year_start, self.year_end).map(|_| ())
            }
        }

        impl RangedAssociation for $name {
            const OWNER_A_COLUMN: &'static str = stringify!($owner_a);
            const OWNER_B_COLUMN: &'static str = "model_id";

            fn owners(&self) -> (EntityId, EntityId) {
                (self.$owner_a, self.model_id)
            }

            fn years(&self) -> YearRange {
                YearRange {
                    start: self.year_start,
                    end: self.year_end,
                }
            }
        }
    };
}

ranged_association! {
    /// Part or accessory item applicable to a vehicle model over a range of
    /// model years.
    ItemModel, ItemModelTemplate, ITEM_MODEL_FIELDS {
        entity: "item model",
        table: "item_models",
        owner_a: item_id,
    }
}

ranged_association! {
    /// Commercial product (warranty, insurance, service plan) offered for a
    /// vehicle model over a range of model years.
    ProductModel, ProductModelTemplate, PRODUCT_MODEL_FIELDS {
        entity: "product model",
        table: "product_models",
        owner_a: product_id,
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemModel, RangedAssociation, YearRange};
    use crate::model::entity::{Entity, ValidationError};

    #[test]
    fn touching_endpoints_overlap() {
        let existing = YearRange::new(2000, 2005).unwrap();
        assert!(existing.overlaps(YearRange::new(2005, 2010).unwrap()));
        assert!(!existing.overlaps(YearRange::new(2006, 2010).unwrap()));
    }

    #[test]
    fn overlap_is_symmetric() {
        let ranges = [
            YearRange::new(1998, 2001).unwrap(),
            YearRange::new(2000, 2005).unwrap(),
            YearRange::new(2002, 2003).unwrap(),
            YearRange::year(2006),
        ];
        for a in ranges {
            for b in ranges {
                assert_eq!(a.overlaps(b), b.overlaps(a));
            }
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = YearRange::new(2010, 2000).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidYearRange {
                start: 2010,
                end: 2000
            }
        );

        let mut association = ItemModel::new(7, 9, YearRange::year(2000));
        association.year_start = 2001;
        assert!(association.validate().is_err());
    }

    #[test]
    fn ranged_association_exposes_owner_columns() {
        let association = ItemModel::new(7, 9, YearRange::new(2000, 2005).unwrap());
        assert_eq!(ItemModel::OWNER_A_COLUMN, "item_id");
        assert_eq!(ItemModel::OWNER_B_COLUMN, "model_id");
        assert_eq!(association.owners(), (7, 9));
        assert!(association.years().contains(2005));
    }
}
