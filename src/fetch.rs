//! Loading and executing exercise queries.
//!
//! `ResultFetcher` turns an exercise id into row sets: it reads the query
//! text from a [`QuerySource`], vets it with the [`ReadOnlyGuard`], and runs it
//! over a session the caller passes in.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::db::{DatabaseBackend, DatabaseClient, RowSet};
use crate::error::{DrillError, FetchError};
use crate::guard::ReadOnlyGuard;

/// What running an exercise file produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// The file held one statement.
    Single(RowSet),
    /// The file held several statements: one row set each, in order.
    Multiple(Vec<RowSet>),
}

impl Fetched {
    /// All produced row sets, in statement order.
    pub fn row_sets(&self) -> &[RowSet] {
        match self {
            Self::Single(set) => std::slice::from_ref(set),
            Self::Multiple(sets) => sets,
        }
    }
}

/// Resolves an exercise id to its query text.
pub trait QuerySource: Send + Sync {
    /// Loads the query text for `exercise`.
    fn load(&self, exercise: &str) -> Result<String, FetchError>;
}

/// Reads `<dir>/<exercise-id>.sql`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    /// Creates a source rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the query file for `exercise`.
    pub fn path_for(&self, exercise: &str) -> PathBuf {
        self.dir.join(format!("{exercise}.sql"))
    }

    /// The directory exercises are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl QuerySource for DirectorySource {
    fn load(&self, exercise: &str) -> Result<String, FetchError> {
        let path = self.path_for(exercise);
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::SourceMissing {
                exercise: exercise.to_string(),
                path,
            },
            _ => FetchError::SourceUnreadable {
                path,
                reason: e.to_string(),
            },
        })
    }
}

/// Loads and runs exercise queries.
#[derive(Debug)]
pub struct ResultFetcher<S> {
    source: S,
    guard: ReadOnlyGuard,
}

impl<S: QuerySource> ResultFetcher<S> {
    /// Creates a fetcher that parses queries in the dialect of `backend`.
    pub fn new(source: S, backend: DatabaseBackend) -> Self {
        Self {
            source,
            guard: ReadOnlyGuard::for_backend(backend),
        }
    }

    /// Runs the query for `exercise` over `session`.
    ///
    /// The session is borrowed: opening and closing it is the caller's job.
    pub async fn fetch(
        &self,
        session: &dyn DatabaseClient,
        exercise: &str,
    ) -> Result<Fetched, FetchError> {
        let sql = self.source.load(exercise)?;

        let statements = self.guard.check(&sql)?;
        if statements == 0 {
            return Err(FetchError::NotStarted(exercise.to_string()));
        }
        debug!("Exercise {} holds {} statement(s)", exercise, statements);

        let mut sets = session.execute_script(&sql).await.map_err(|e| match e {
            DrillError::Fetch(fetch) => fetch,
            other => FetchError::Execution(other.to_string()),
        })?;

        if statements == 1 && sets.len() <= 1 {
            return Ok(Fetched::Single(sets.pop().unwrap_or_default()));
        }
        Ok(Fetched::Multiple(sets))
    }
}
