//! Domain entities of the dealership back office.
//!
//! # Responsibility
//! - Declare each entity's table, Query Template and field descriptors.
//! - Declare the canonical classifier taxonomies.
//!
//! # Invariants
//! - Every entity is identified by a storage-generated `EntityId`.
//! - Deletion is a hard delete; no tombstones or versions.

pub mod bank;
pub mod canonical;
pub mod classifier;
pub mod entity;
pub mod model_range;
pub mod party;
