//! Integration tests for incident reports.

pub mod common;
pub mod executor_test;
pub mod reports_test;
