//! Database module: stored entity model and SQL repository.
//!
//! - `model`: the row shape persisted for each recipe.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! Callers normally go through `crate::store::SqliteStore`; the repository
//! API is re-exported here for tests and tooling.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::StoredRecord;
