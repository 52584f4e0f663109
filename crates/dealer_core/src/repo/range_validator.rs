//! Duplicate-range validator for model-year associations.
//!
//! # Invariants
//! - Intervals are inclusive: touching endpoints overlap.
//! - Only rows of the same owner pair are ever reported.
//! - Detection is advisory; callers decide whether a conflict rejects.
//! - The check and the following write are not atomic.

use crate::model::entity::EntityId;
use crate::model::model_range::{RangedAssociation, YearRange};
use crate::query::filter::{Filter, Predicate};
use crate::repo::dao::SqliteDao;
use crate::repo::error::RepoResult;
use log::debug;
use rusqlite::types::Value;

/// Association about to be written, checked against stored rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapCandidate {
    pub owner_a: EntityId,
    pub owner_b: EntityId,
    pub years: YearRange,
    /// Row to ignore, set when re-validating an update of that row.
    pub exclude_id: Option<EntityId>,
}

impl OverlapCandidate {
    pub fn new(owner_a: EntityId, owner_b: EntityId, years: YearRange) -> Self {
        Self {
            owner_a,
            owner_b,
            years,
            exclude_id: None,
        }
    }

    /// Candidate built from an association; excludes the association itself
    /// when it already has an identity.
    pub fn of<E: RangedAssociation>(association: &E) -> Self {
        let (owner_a, owner_b) = association.owners();
        Self {
            owner_a,
            owner_b,
            years: association.years(),
            exclude_id: association.id(),
        }
    }

    pub fn excluding(mut self, id: EntityId) -> Self {
        self.exclude_id = Some(id);
        self
    }
}

/// Range filter: same owner pair, `stored.start <= cand.end` and
/// `cand.start <= stored.end`, minus the excluded row.
pub fn overlap_filter<E: RangedAssociation>(candidate: &OverlapCandidate) -> Filter {
    let mut filter = Filter::universal()
        .and(Predicate::Equals {
            column: E::OWNER_A_COLUMN,
            value: Value::Integer(candidate.owner_a),
        })
        .and(Predicate::Equals {
            column: E::OWNER_B_COLUMN,
            value: Value::Integer(candidate.owner_b),
        })
        .and(Predicate::AtMost {
            column: E::YEAR_START_COLUMN,
            value: Value::Integer(i64::from(candidate.years.end())),
        })
        .and(Predicate::AtLeast {
            column: E::YEAR_END_COLUMN,
            value: Value::Integer(i64::from(candidate.years.start())),
        });

    if let Some(id) = candidate.exclude_id {
        filter.push(Predicate::NotEquals {
            column: crate::model::entity::ID_COLUMN,
            value: Value::Integer(id),
        });
    }

    filter
}

/// Query seam for the duplicate-range check.
pub trait OverlapCheck<E: RangedAssociation> {
    /// Stored associations conflicting with `candidate`, by ascending id.
    fn find_overlaps(&self, candidate: &OverlapCandidate) -> RepoResult<Vec<E>>;
}

impl<E: RangedAssociation> OverlapCheck<E> for SqliteDao<'_, E> {
    fn find_overlaps(&self, candidate: &OverlapCandidate) -> RepoResult<Vec<E>> {
        let conflicts = self.query_filter(&overlap_filter::<E>(candidate), None)?;
        debug!(
            "event=overlap_check module=repo entity={} start={} end={} conflicts={}",
            E::NAME,
            candidate.years.start(),
            candidate.years.end(),
            conflicts.len()
        );
        Ok(conflicts)
    }
}
