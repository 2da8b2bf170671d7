//! incident-reports - analytical reports over an incident-report database.
//!
//! This library exposes the core modules for the binary and for integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;
pub mod reports;
