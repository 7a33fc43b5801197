//! Error types for db-drill.
//!
//! `DrillError` covers everything that stops the tool itself. Problems with a
//! learner's exercise are not errors of the tool: they are carried as
//! [`FetchError`] or [`crate::verify::VerificationFailure`] inside a report.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for db-drill operations.
#[derive(Error, Debug)]
pub enum DrillError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Loading or executing an exercise failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration errors (invalid config file, unknown exercise, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DrillError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a fetch error for a statement the database rejected.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Fetch(FetchError::Execution(msg.into()))
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Fetch(_) => "Fetch Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Why an exercise's query could not be loaded or executed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No query file exists for the exercise.
    #[error("no query file for exercise '{exercise}' at {}", path.display())]
    SourceMissing { exercise: String, path: PathBuf },

    /// The query file exists but could not be read.
    #[error("could not read {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    /// The query file holds no statements.
    #[error("exercise '{0}' has not been started")]
    NotStarted(String),

    /// The query text could not be parsed.
    #[error("could not parse SQL: {0}")]
    Parse(String),

    /// A statement would modify the dataset.
    #[error("statement {index} is not read-only ({kind}); exercises may only read data")]
    NotReadOnly { index: usize, kind: String },

    /// No session could be opened for the exercise.
    #[error("could not open a database session: {0}")]
    Session(String),

    /// The database rejected the query or the session failed.
    #[error("query failed: {0}")]
    Execution(String),
}

/// Result type alias using DrillError.
pub type Result<T> = std::result::Result<T, DrillError>;
