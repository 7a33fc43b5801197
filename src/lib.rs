//! db-drill - checks the result sets of SQL exercises.
//!
//! Expectations are plain data ([`verify::ExerciseExpectation`]), checked by a
//! pure function ([`verify::verify`]) against the row sets a learner's query
//! produced. The rest of the crate fetches those row sets from a live
//! database and reports the outcome.

pub mod config;
pub mod db;
pub mod error;
pub mod exercise;
pub mod fetch;
pub mod guard;
pub mod logging;
pub mod report;
pub mod runner;
pub mod verify;
