//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own business decisions the repository layer leaves open, such as
//!   whether an overlapping model-year range is rejected.

pub mod association_service;
