//! Exercise catalog.
//!
//! Maps exercise ids to the expectations their query results must meet.

mod catalog;

pub use catalog::sakila_dml;

use crate::error::{DrillError, Result};
use crate::verify::ExerciseExpectation;

/// An ordered, id-addressable set of exercise expectations.
#[derive(Debug, Clone)]
pub struct Catalog {
    exercises: Vec<ExerciseExpectation>,
}

impl Catalog {
    /// Builds a catalog, ordering exercises by id.
    pub fn new(mut exercises: Vec<ExerciseExpectation>) -> Self {
        exercises.sort_by(|a, b| a.exercise.cmp(&b.exercise));
        Self { exercises }
    }

    /// The twelve Sakila DML exercises.
    pub fn sakila() -> Self {
        Self::new(sakila_dml())
    }

    /// Looks an exercise up by id.
    pub fn get(&self, id: &str) -> Option<&ExerciseExpectation> {
        self.exercises.iter().find(|e| e.exercise == id)
    }

    /// Exercise ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.exercises.iter().map(|e| e.exercise.as_str())
    }

    /// All exercises in id order.
    pub fn exercises(&self) -> &[ExerciseExpectation] {
        &self.exercises
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Picks the exercises named in `ids`, or all of them when `ids` is empty.
    ///
    /// Ids may omit the `.sql` suffix or carry it. Unknown ids are an error.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<ExerciseExpectation>> {
        if ids.is_empty() {
            return Ok(self.exercises.clone());
        }

        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            let id = id.strip_suffix(".sql").unwrap_or(id);
            let exercise = self.get(id).ok_or_else(|| {
                DrillError::config(format!(
                    "Unknown exercise '{}'. Use --list to see available exercises.",
                    id
                ))
            })?;
            if !selected
                .iter()
                .any(|e: &ExerciseExpectation| e.exercise == exercise.exercise)
            {
                selected.push(exercise.clone());
            }
        }
        selected.sort_by(|a, b| a.exercise.cmp(&b.exercise));
        Ok(selected)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::sakila()
    }
}
