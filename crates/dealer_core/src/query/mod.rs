//! Query-by-example: templates compiled into conjunctive filters.
//!
//! # Responsibility
//! - Compile Query Templates for `find` (exact) and `search` (substring).
//! - Carry caller sort/paging requests to the executor unchanged.

pub mod compiler;
pub mod filter;
pub mod page;
