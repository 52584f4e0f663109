//! Model-year association use-case service.
//!
//! # Responsibility
//! - Decide what an overlap means for a write: reject, or save and warn.
//! - Delegate persistence and overlap queries to repository seams.
//!
//! # Invariants
//! - Updates never conflict with the row being updated.
//! - Check and write are separate statements; two concurrent writers for the
//!   same owner pair can both pass the check.

use crate::model::entity::EntityId;
use crate::model::model_range::RangedAssociation;
use crate::repo::dao::Dao;
use crate::repo::error::RepoError;
use crate::repo::range_validator::{OverlapCandidate, OverlapCheck};
use log::warn;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;

#[derive(Debug)]
pub enum AssociationError<E> {
    Repo(RepoError),
    /// Stored associations of the same owner pair sharing a model year.
    Overlap(Vec<E>),
}

impl<E> Display for AssociationError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Overlap(conflicts) => write!(
                f,
                "model-year range overlaps {} existing association(s)",
                conflicts.len()
            ),
        }
    }
}

impl<E: Debug> Error for AssociationError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Overlap(_) => None,
        }
    }
}

impl<E> From<RepoError> for AssociationError<E> {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type AssociationResult<T, E> = Result<T, AssociationError<E>>;

/// Saved association plus the conflicts it was allowed to coexist with.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedWithWarnings<E> {
    pub id: EntityId,
    pub overlaps: Vec<E>,
}

pub struct AssociationService<E, R> {
    repo: R,
    _entity: PhantomData<E>,
}

impl<E, R> AssociationService<E, R>
where
    E: RangedAssociation,
    R: Dao<E> + OverlapCheck<E>,
{
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _entity: PhantomData,
        }
    }

    /// Associations of the candidate's owner pair overlapping its range.
    pub fn check(&self, candidate: &OverlapCandidate) -> AssociationResult<Vec<E>, E> {
        Ok(self.repo.find_overlaps(candidate)?)
    }

    /// Saves a new association unless it overlaps an existing one.
    pub fn add(&self, association: &mut E) -> AssociationResult<EntityId, E> {
        association.validate().map_err(RepoError::from)?;
        self.reject_overlaps(association)?;
        Ok(self.repo.save(association)?)
    }

    /// Saves a new association even when it overlaps, returning conflicts.
    pub fn add_allowing_overlap(
        &self,
        association: &mut E,
    ) -> AssociationResult<SavedWithWarnings<E>, E> {
        association.validate().map_err(RepoError::from)?;
        let overlaps = self.repo.find_overlaps(&OverlapCandidate::of(association))?;
        if !overlaps.is_empty() {
            warn!(
                "event=overlap_allowed module=service entity={} conflicts={}",
                E::NAME,
                overlaps.len()
            );
        }

        let id = self.repo.save(association)?;
        Ok(SavedWithWarnings { id, overlaps })
    }

    /// Updates an association unless its new range overlaps another row.
    pub fn change(&self, association: &E) -> AssociationResult<(), E> {
        association.validate().map_err(RepoError::from)?;
        self.reject_overlaps(association)?;
        Ok(self.repo.update(association)?)
    }

    pub fn remove(&self, id: EntityId) -> AssociationResult<(), E> {
        Ok(self.repo.delete(id)?)
    }

    fn reject_overlaps(&self, association: &E) -> AssociationResult<(), E> {
        let overlaps = self.repo.find_overlaps(&OverlapCandidate::of(association))?;
        if overlaps.is_empty() {
            return Ok(());
        }

        warn!(
            "event=overlap_rejected module=service entity={} conflicts={}",
            E::NAME,
            overlaps.len()
        );
        Err(AssociationError::Overlap(overlaps))
    }
}
