//! Query-by-example predicate compiler.
//!
//! # Responsibility
//! - Turn a Query Template into a conjunctive [`Filter`].
//! - Apply `find` (exact) or `search` (substring on text) semantics.
//!
//! # Invariants
//! - Only constrained template fields contribute predicates.
//! - Reference fields compare the foreign key when the nested identity is
//!   known; otherwise the nested template's own fields are compiled into a
//!   subquery, exactly one level deep.
//! - A field with no matching stored column is skipped, never an error.

use crate::db::SchemaCatalog;
use crate::model::entity::{bind_template, BoundField, Entity, FieldKind, FieldValue};
use crate::query::filter::{Filter, MatchMode, Predicate};
use log::debug;
use rusqlite::types::Value;

const NESTED_DEPTH: u8 = 1;

/// Compiles `template` for entity `E` against the stored schema.
pub fn compile<E: Entity>(
    template: &E::Template,
    mode: MatchMode,
    catalog: &SchemaCatalog,
) -> Filter {
    let fields = bind_template::<E>(template);
    compile_fields(E::TABLE, &fields, mode, catalog, NESTED_DEPTH)
}

fn compile_fields(
    table: &'static str,
    fields: &[BoundField],
    mode: MatchMode,
    catalog: &SchemaCatalog,
    depth_left: u8,
) -> Filter {
    let mut filter = Filter::universal();

    for field in fields {
        if !catalog.has_column(table, field.column) {
            debug!(
                "event=qbe_skip module=query reason=missing_column table={} field={}",
                table, field.name
            );
            continue;
        }

        match compile_field(field, mode, catalog, depth_left) {
            Some(predicate) => filter.push(predicate),
            None => debug!(
                "event=qbe_skip module=query reason=unsupported table={} field={}",
                table, field.name
            ),
        }
    }

    filter
}

fn compile_field(
    field: &BoundField,
    mode: MatchMode,
    catalog: &SchemaCatalog,
    depth_left: u8,
) -> Option<Predicate> {
    match (field.kind, &field.value) {
        (FieldKind::Text, FieldValue::Text(text)) if mode == MatchMode::Search => {
            Some(Predicate::Contains {
                column: field.column,
                needle: text.clone(),
            })
        }
        (FieldKind::Text, FieldValue::Text(_))
        | (FieldKind::Identity | FieldKind::Integer, FieldValue::Integer(_))
        | (FieldKind::Boolean, FieldValue::Boolean(_)) => Some(Predicate::Equals {
            column: field.column,
            value: field.value.to_sql_value()?,
        }),
        (FieldKind::Reference, FieldValue::Reference(nested)) => {
            if let Some(id) = nested.id {
                return Some(Predicate::Equals {
                    column: field.column,
                    value: Value::Integer(id),
                });
            }
            if depth_left == 0 || !catalog.has_table(nested.table) {
                return None;
            }

            let inner = compile_fields(nested.table, &nested.fields, mode, catalog, depth_left - 1);
            if inner.is_universal() {
                return None;
            }
            Some(Predicate::InSubquery {
                column: field.column,
                table: nested.table,
                filter: inner,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::compile;
    use crate::db::SchemaCatalog;
    use crate::model::bank::{Bank, BankTemplate};
    use crate::model::classifier::ClassifierTemplate;
    use crate::model::party::{Partner, PartnerTemplate, PersonTemplate};
    use crate::query::filter::{MatchMode, Predicate};
    use rusqlite::types::Value;
    use rusqlite::Connection;

    fn catalog() -> SchemaCatalog {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE classifiers (id INTEGER PRIMARY KEY, type TEXT, value TEXT, label TEXT, description TEXT);
             CREATE TABLE banks (id INTEGER PRIMARY KEY, name TEXT, code TEXT, active INTEGER);
             CREATE TABLE persons (id INTEGER PRIMARY KEY, name TEXT, document TEXT, email TEXT, classification_id INTEGER);
             CREATE TABLE partners (id INTEGER PRIMARY KEY, person_id INTEGER, trade_name TEXT, account_type_id INTEGER, active INTEGER);",
        )
        .unwrap();
        SchemaCatalog::load(&conn).unwrap()
    }

    #[test]
    fn empty_template_compiles_to_universal_filter() {
        let filter = compile::<Bank>(&BankTemplate::default(), MatchMode::Find, &catalog());
        assert!(filter.is_universal());
    }

    #[test]
    fn find_uses_equality_and_search_uses_substring_for_text() {
        let template = BankTemplate {
            name: Some("Bank".to_string()),
            active: Some(true),
            ..BankTemplate::default()
        };
        let catalog = catalog();

        let find = compile::<Bank>(&template, MatchMode::Find, &catalog);
        assert_eq!(
            find.predicates(),
            &[
                Predicate::Equals {
                    column: "name",
                    value: Value::Text("Bank".to_string()),
                },
                Predicate::Equals {
                    column: "active",
                    value: Value::Integer(1),
                },
            ]
        );

        let search = compile::<Bank>(&template, MatchMode::Search, &catalog);
        assert_eq!(
            search.predicates(),
            &[
                Predicate::Contains {
                    column: "name",
                    needle: "Bank".to_string(),
                },
                Predicate::Equals {
                    column: "active",
                    value: Value::Integer(1),
                },
            ]
        );
    }

    #[test]
    fn explicit_false_is_a_constraint() {
        let template = BankTemplate {
            active: Some(false),
            ..BankTemplate::default()
        };
        let filter = compile::<Bank>(&template, MatchMode::Find, &catalog());
        assert_eq!(filter.predicates().len(), 1);
    }

    #[test]
    fn nested_identity_compares_foreign_key() {
        let template = PartnerTemplate {
            person: Some(PersonTemplate {
                id: Some(42),
                name: Some("ignored once id is known".to_string()),
                ..PersonTemplate::default()
            }),
            ..PartnerTemplate::default()
        };

        let filter = compile::<Partner>(&template, MatchMode::Search, &catalog());
        assert_eq!(
            filter.predicates(),
            &[Predicate::Equals {
                column: "person_id",
                value: Value::Integer(42),
            }]
        );
    }

    #[test]
    fn nested_fields_recurse_one_level_only() {
        let template = PartnerTemplate {
            person: Some(PersonTemplate {
                name: Some("Ana".to_string()),
                classification: Some(ClassifierTemplate {
                    value: Some("CUSTOMER".to_string()),
                    ..ClassifierTemplate::default()
                }),
                ..PersonTemplate::default()
            }),
            ..PartnerTemplate::default()
        };

        let filter = compile::<Partner>(&template, MatchMode::Find, &catalog());
        let (sql, binds) = filter.to_sql();
        assert_eq!(
            sql,
            "person_id IN (SELECT id FROM persons WHERE name = ?)"
        );
        assert_eq!(binds, vec![Value::Text("Ana".to_string())]);
    }

    #[test]
    fn missing_columns_are_skipped_silently() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE banks (id INTEGER PRIMARY KEY, name TEXT, active INTEGER);")
            .unwrap();
        let catalog = SchemaCatalog::load(&conn).unwrap();

        let template = BankTemplate {
            code: Some("0001".to_string()),
            ..BankTemplate::default()
        };
        let filter = compile::<Bank>(&template, MatchMode::Find, &catalog);
        assert!(filter.is_universal());
    }
}
