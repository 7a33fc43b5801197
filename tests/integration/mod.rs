//! Integration tests for db-drill.

pub mod catalog_test;
pub mod runner_test;
