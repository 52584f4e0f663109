//! Repository layer: generic DAO, classifier resolver and range validator.
//!
//! # Responsibility
//! - Offer one query-by-example DAO for every entity shape.
//! - Keep SQLite statement details inside the executor.
//!
//! # Invariants
//! - Repository writes call `Entity::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Consistency`) in
//!   addition to DB transport errors.

pub mod classifier_repo;
pub mod dao;
pub mod error;
pub mod executor;
pub mod range_validator;
