//! Database module: entity models and SQL repositories.
//!
//! This module is split into two submodules:
//! - `model`: row-level views that should not leave the storage layer.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! External modules should import from `fitlog::db`; the repository API and
//! its view models are re-exported here.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::UserCredentials;
