//! Workout logging backend: account sign-up/sign-in, free-text workout
//! ingestion with calorie estimates, and daily statistics.

pub mod auth;
pub mod calories;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod model;
pub mod parser;
pub mod routes;
pub mod stats;
pub mod store;
