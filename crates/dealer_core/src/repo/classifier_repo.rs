//! Classifier store and resolver.
//!
//! # Responsibility
//! - Map `(type, value)` pairs to persisted classifier ids, creating rows on
//!   first use.
//! - Map ids back to classifier rows and typed canonical enums.
//! - Seed the canonical taxonomy registry.
//!
//! # Invariants
//! - `(type, value)` uniqueness is enforced by storage, not by this module.
//! - A uniqueness violation on insert means another writer won the race;
//!   the resolver re-reads and returns that row instead of failing.
//! - No in-process cache: every call reads storage.

use crate::model::canonical::{canonical_definitions, ClassifierKind};
use crate::model::classifier::{Classifier, ClassifierDefinition, ClassifierTemplate};
use crate::model::entity::{Entity, EntityId};
use crate::repo::dao::{Dao, SqliteDao};
use crate::repo::error::{at_most_one, RepoError, RepoResult};
use log::{debug, info};
use rusqlite::Connection;
use std::time::Instant;

/// Outcome of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub id: EntityId,
    /// `true` when this call inserted the row.
    pub created: bool,
}

/// Counts produced by [`ClassifierResolver::seed_canonical`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub resolved: usize,
    pub created: usize,
}

pub struct ClassifierResolver<'conn> {
    dao: SqliteDao<'conn, Classifier>,
}

impl<'conn> ClassifierResolver<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            dao: SqliteDao::try_new(conn)?,
        })
    }

    /// Returns the id for `definition`'s `(type, value)`, inserting it when
    /// absent. Idempotent, including under concurrent first-time creation.
    pub fn resolve(&self, definition: &ClassifierDefinition<'_>) -> RepoResult<EntityId> {
        self.resolve_detailed(definition)
            .map(|resolution| resolution.id)
    }

    /// Resolves a canonical enum value.
    pub fn resolve_kind<K: ClassifierKind>(&self, kind: K) -> RepoResult<EntityId> {
        self.resolve(kind.definition())
    }

    pub fn resolve_detailed(&self, definition: &ClassifierDefinition<'_>) -> RepoResult<Resolution> {
        definition.validate()?;

        if let Some(existing) = self.lookup(definition.classifier_type, definition.value)? {
            return Ok(Resolution {
                id: required_id(&existing)?,
                created: false,
            });
        }

        self.insert_or_reread(definition)
    }

    /// Point lookup; `NotFound` when the id does not exist.
    pub fn by_id(&self, id: EntityId) -> RepoResult<Classifier> {
        self.dao.get_by_id(id)
    }

    /// Every entry of one taxonomy, in insertion order.
    pub fn by_type(&self, classifier_type: &str) -> RepoResult<Vec<Classifier>> {
        self.dao
            .find(&ClassifierTemplate::of_type(classifier_type), None)
    }

    /// Loads the typed enum instance for a persisted id.
    ///
    /// Fails with `InvalidData` when the row belongs to another taxonomy or
    /// carries a value the enum does not declare.
    pub fn kind_by_id<K: ClassifierKind>(&self, id: EntityId) -> RepoResult<K> {
        let classifier = self.by_id(id)?;
        if classifier.classifier_type != K::TYPE {
            return Err(RepoError::InvalidData(format!(
                "classifier {id} has type `{}`, expected `{}`",
                classifier.classifier_type,
                K::TYPE
            )));
        }

        K::from_value(&classifier.value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "classifier {id} value `{}` is not declared by `{}`",
                classifier.value,
                K::TYPE
            ))
        })
    }

    /// Materializes every canonical taxonomy entry.
    pub fn seed_canonical(&self) -> RepoResult<SeedReport> {
        let started_at = Instant::now();
        let mut report = SeedReport::default();

        for definition in canonical_definitions() {
            definition.validate_canonical()?;
            let resolution = self.resolve_detailed(definition)?;
            report.resolved += 1;
            if resolution.created {
                report.created += 1;
            }
        }

        info!(
            "event=classifier_seed module=classifier status=ok resolved={} created={} duration_ms={}",
            report.resolved,
            report.created,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn lookup(&self, classifier_type: &str, value: &str) -> RepoResult<Option<Classifier>> {
        let rows = self
            .dao
            .find(&ClassifierTemplate::key(classifier_type, value), None)?;
        at_most_one(rows, Classifier::NAME, || {
            format!("type = {classifier_type}, value = {value}")
        })
    }

    fn insert_or_reread(&self, definition: &ClassifierDefinition<'_>) -> RepoResult<Resolution> {
        let mut classifier = Classifier::from_definition(definition);
        match self.dao.save(&mut classifier) {
            Ok(id) => {
                debug!(
                    "event=classifier_resolve module=classifier status=created type={} value={} id={}",
                    definition.classifier_type, definition.value, id
                );
                Ok(Resolution { id, created: true })
            }
            Err(err) if err.is_constraint_violation() => {
                debug!(
                    "event=classifier_resolve module=classifier status=race_lost type={} value={}",
                    definition.classifier_type, definition.value
                );
                let existing = self
                    .lookup(definition.classifier_type, definition.value)?
                    .ok_or_else(|| RepoError::Consistency {
                        entity: Classifier::NAME,
                        detail: format!(
                            "insert of type = {}, value = {} was rejected but no row exists",
                            definition.classifier_type, definition.value
                        ),
                        rows: 0,
                    })?;
                Ok(Resolution {
                    id: required_id(&existing)?,
                    created: false,
                })
            }
            Err(err) => Err(err),
        }
    }
}

fn required_id(classifier: &Classifier) -> RepoResult<EntityId> {
    classifier
        .id
        .ok_or_else(|| RepoError::InvalidData("classifier row without id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::ClassifierResolver;
    use crate::db::open_db_in_memory;
    use crate::model::classifier::ClassifierDefinition;
    use crate::repo::error::RepoError;

    const CHECKING: ClassifierDefinition<'static> = ClassifierDefinition {
        classifier_type: "ACCOUNT_TYPE",
        value: "CORRENTE",
        label: "Checking account",
        description: "",
    };

    #[test]
    fn lost_insert_race_rereads_existing_row() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO classifiers (type, value, label, description)
             VALUES ('ACCOUNT_TYPE', 'CORRENTE', 'Checking account', '');",
            [],
        )
        .unwrap();
        let winner = conn.last_insert_rowid();

        let resolver = ClassifierResolver::try_new(&conn).unwrap();
        let resolution = resolver.insert_or_reread(&CHECKING).unwrap();
        assert_eq!(resolution.id, winner);
        assert!(!resolution.created);
    }

    #[test]
    fn duplicate_rows_without_storage_constraint_are_a_consistency_error() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE classifiers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                value TEXT NOT NULL,
                label TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            );
            INSERT INTO classifiers (type, value, label) VALUES ('ACCOUNT_TYPE', 'CORRENTE', 'a');
            INSERT INTO classifiers (type, value, label) VALUES ('ACCOUNT_TYPE', 'CORRENTE', 'b');",
        )
        .unwrap();

        let resolver = ClassifierResolver::try_new(&conn).unwrap();
        let err = resolver.resolve(&CHECKING).unwrap_err();
        assert!(matches!(err, RepoError::Consistency { rows: 2, .. }));
    }
}
