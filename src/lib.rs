//! Read-only HTTP API over a historical weather-observation dataset.
//!
//! The dataset is a pre-populated SQLite file with two tables, `measurements`
//! (dated precipitation and temperature readings keyed by station) and
//! `stations`. Five GET routes each run one fixed aggregate query and return
//! JSON; nothing here writes, caches, or retries.

pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod routes;
