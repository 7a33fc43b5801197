//! Run outcomes and their rendering.
//!
//! Each exercise ends in an [`ExerciseOutcome`]; a [`RunReport`] collects them
//! with a summary and renders as plain text or JSON.

use serde::{Serialize, Serializer};
use std::fmt::{self, Write as _};
use std::time::Duration;

use crate::error::{DrillError, FetchError, Result};
use crate::verify::{VerificationFailure, Verified};

/// How one exercise ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    /// Every expectation held.
    Passed { row_sets: usize, rows: usize },

    /// The query could not be loaded or run.
    FetchFailed {
        #[serde(serialize_with = "as_display")]
        error: FetchError,
    },

    /// The query ran but its results did not meet expectations.
    Failed {
        message: String,
        failure: VerificationFailure,
    },
}

impl Verdict {
    /// Verdict for a finished verification.
    pub fn from_verification(result: std::result::Result<Verified, VerificationFailure>) -> Self {
        match result {
            Ok(Verified { row_sets, rows }) => Self::Passed { row_sets, rows },
            Err(failure) => Self::Failed {
                message: failure.to_string(),
                failure,
            },
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    /// The failure message, if the exercise failed.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Passed { .. } => None,
            Self::FetchFailed { error } => Some(error.to_string()),
            Self::Failed { message, .. } => Some(message.clone()),
        }
    }
}

fn as_display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Outcome of one exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseOutcome {
    pub exercise: String,

    #[serde(flatten)]
    pub verdict: Verdict,

    /// Wall time from opening the session to the verdict.
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

impl ExerciseOutcome {
    pub fn new(exercise: impl Into<String>, verdict: Verdict, elapsed: Duration) -> Self {
        Self {
            exercise: exercise.into(),
            verdict,
            elapsed,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict.is_pass()
    }
}

/// Pass/fail counts over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Output format for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Every outcome of a run, in exercise order, plus a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<ExerciseOutcome>,
    pub summary: Summary,
}

impl RunReport {
    /// Builds a report, ordering outcomes by exercise id.
    pub fn new(mut outcomes: Vec<ExerciseOutcome>) -> Self {
        outcomes.sort_by(|a, b| a.exercise.cmp(&b.exercise));
        let passed = outcomes.iter().filter(|o| o.passed()).count();
        let summary = Summary {
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
        };
        Self { outcomes, summary }
    }

    /// True when every exercise passed.
    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }

    /// Renders in the requested format.
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => self.to_json(),
        }
    }

    /// One line per exercise with failure messages indented below, then a summary.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let tag = if outcome.passed() { "PASS" } else { "FAIL" };
            let _ = writeln!(
                out,
                "{tag}  {} ({}ms)",
                outcome.exercise,
                outcome.elapsed.as_millis()
            );
            if let Some(message) = outcome.verdict.message() {
                let _ = writeln!(out, "      {message}");
            }
        }
        let _ = write!(
            out,
            "\n{} exercise(s): {} passed, {} failed",
            self.summary.total, self.summary.passed, self.summary.failed
        );
        out
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DrillError::internal(format!("Failed to serialize report: {e}")))
    }
}
