//! Runs exercises end to end.
//!
//! Each exercise gets its own session: opened just before the fetch and
//! closed before verification, whatever the fetch returned. Exercises share
//! nothing else, so many can run at once.

use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::db::Connector;
use crate::error::FetchError;
use crate::fetch::{QuerySource, ResultFetcher};
use crate::report::{ExerciseOutcome, RunReport, Verdict};
use crate::verify::{verify, ExerciseExpectation};

/// Runs one exercise: open a session, fetch, close the session, verify.
///
/// Never fails: a connection or fetch problem becomes the exercise's verdict.
pub async fn run_exercise<S: QuerySource>(
    connector: &dyn Connector,
    fetcher: &ResultFetcher<S>,
    expectation: &ExerciseExpectation,
) -> ExerciseOutcome {
    let id = expectation.exercise.as_str();
    let start = Instant::now();

    let session = match connector.open().await {
        Ok(session) => session,
        Err(e) => {
            warn!("Could not open a session for {}: {}", id, e);
            let verdict = Verdict::FetchFailed {
                error: FetchError::Session(e.to_string()),
            };
            return ExerciseOutcome::new(id, verdict, start.elapsed());
        }
    };
    debug!("Opened session for {}", id);

    let fetched = fetcher.fetch(session.as_ref(), id).await;

    if let Err(e) = session.close().await {
        warn!("Failed to close session for {}: {}", id, e);
    }
    debug!("Closed session for {}", id);

    let verdict = match fetched {
        Ok(produced) => Verdict::from_verification(verify(expectation, &produced)),
        Err(error) => Verdict::FetchFailed { error },
    };

    let outcome = ExerciseOutcome::new(id, verdict, start.elapsed());
    match outcome.verdict.message() {
        None => info!("{} passed in {:?}", id, outcome.elapsed),
        Some(message) => info!("{} failed: {}", id, message),
    }
    outcome
}

/// Runs `exercises` with at most `jobs` in flight and reports them in id order.
pub async fn run_all<S: QuerySource>(
    connector: &dyn Connector,
    fetcher: &ResultFetcher<S>,
    exercises: &[ExerciseExpectation],
    jobs: usize,
) -> RunReport {
    let jobs = jobs.max(1);
    debug!("Running {} exercise(s) with {} job(s)", exercises.len(), jobs);

    let outcomes = stream::iter(exercises)
        .map(|expectation| run_exercise(connector, fetcher, expectation))
        .buffer_unordered(jobs)
        .collect::<Vec<_>>()
        .await;

    RunReport::new(outcomes)
}
