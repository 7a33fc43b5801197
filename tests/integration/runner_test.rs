//! End-to-end runs over exercise files on disk and scripted sessions.

use db_drill::db::{DatabaseBackend, MockConnector, MockDatabaseClient, RowSet, Value};
use db_drill::error::FetchError;
use db_drill::exercise::Catalog;
use db_drill::fetch::{DirectorySource, ResultFetcher};
use db_drill::report::{OutputFormat, Verdict};
use db_drill::runner::{run_all, run_exercise};
use std::path::Path;
use tempfile::TempDir;

const DISTINCT_SQL: &str = "SELECT DISTINCT last_name FROM actor;\n";
const JOIN_SQL: &str = "SELECT r.rental_date, c.first_name, c.last_name, f.title\n\
                        FROM rental r\n\
                        JOIN customer c ON c.customer_id = r.customer_id\n\
                        JOIN inventory i ON i.inventory_id = r.inventory_id\n\
                        JOIN film f ON f.film_id = i.film_id\n\
                        WHERE c.last_name = 'SMITH';\n";

fn write_exercise(dir: &Path, id: &str, sql: &str) {
    std::fs::write(dir.join(format!("{id}.sql")), sql).unwrap();
}

fn last_names(n: usize) -> RowSet {
    RowSet::from_names(
        ["last_name"],
        (0..n).map(|i| vec![Value::from(format!("NAME{i}"))]).collect(),
    )
}

fn rentals(n: usize) -> RowSet {
    RowSet::from_names(
        ["rental_date", "first_name", "last_name", "title"],
        (0..n)
            .map(|_| {
                vec![
                    Value::from_text("TIMESTAMP", "2005-05-25 11:30:37".to_string()),
                    Value::from("MARY"),
                    Value::from("SMITH"),
                    Value::from("PATIENT SISTER"),
                ]
            })
            .collect(),
    )
}

fn workspace() -> (TempDir, ResultFetcher<DirectorySource>) {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ResultFetcher::new(DirectorySource::new(dir.path()), DatabaseBackend::Postgres);
    (dir, fetcher)
}

#[tokio::test]
async fn test_single_exercise_from_disk() {
    let (dir, fetcher) = workspace();
    write_exercise(dir.path(), "02-distinct", DISTINCT_SQL);

    let connector = MockConnector::new(
        MockDatabaseClient::new().with_result(DISTINCT_SQL, vec![last_names(121)]),
    );
    let catalog = Catalog::sakila();
    let expectation = catalog.get("02-distinct").unwrap();

    let outcome = run_exercise(&connector, &fetcher, expectation).await;
    assert!(outcome.passed());
    assert_eq!(
        outcome.verdict,
        Verdict::Passed {
            row_sets: 1,
            rows: 121
        }
    );
    assert_eq!(connector.client().closed_count(), 1);
}

#[tokio::test]
async fn test_whole_catalog_with_mixed_progress() {
    let (dir, fetcher) = workspace();
    write_exercise(dir.path(), "02-distinct", DISTINCT_SQL);
    write_exercise(dir.path(), "03-where", "-- write your query here\n");
    write_exercise(dir.path(), "04-and", "DELETE FROM payment;\n");
    write_exercise(dir.path(), "12-inner-join", JOIN_SQL);

    let client = MockDatabaseClient::new()
        .with_result(DISTINCT_SQL, vec![last_names(120)])
        .with_result(JOIN_SQL, vec![rentals(8)]);
    let connector = MockConnector::new(client);
    let catalog = Catalog::sakila();

    let report = run_all(&connector, &fetcher, catalog.exercises(), 3).await;

    assert_eq!(report.summary.total, 12);
    assert_eq!(report.summary.passed, 1);
    assert_eq!(report.summary.failed, 11);

    let verdict = |id: &str| {
        report
            .outcomes
            .iter()
            .find(|o| o.exercise == id)
            .map(|o| o.verdict.clone())
            .unwrap()
    };

    assert!(verdict("12-inner-join").is_pass());
    assert!(verdict("02-distinct")
        .message()
        .is_some_and(|m| m.contains("expected 121, got 120")));
    assert_eq!(
        verdict("03-where"),
        Verdict::FetchFailed {
            error: FetchError::NotStarted("03-where".to_string())
        }
    );
    assert!(matches!(
        verdict("04-and"),
        Verdict::FetchFailed {
            error: FetchError::NotReadOnly { index: 1, .. }
        }
    ));
    assert!(matches!(
        verdict("01-select-statement"),
        Verdict::FetchFailed {
            error: FetchError::SourceMissing { .. }
        }
    ));

    // Only the two runnable files reached the database; every session was closed.
    assert_eq!(connector.client().executed_count(), 2);
    assert_eq!(connector.opened_count(), 12);
    assert_eq!(connector.client().closed_count(), 12);
}

#[tokio::test]
async fn test_report_renders_for_a_run() {
    let (dir, fetcher) = workspace();
    write_exercise(dir.path(), "02-distinct", DISTINCT_SQL);

    let connector = MockConnector::new(
        MockDatabaseClient::new().with_result(DISTINCT_SQL, vec![last_names(121)]),
    );
    let selected = Catalog::sakila().select(&["02-distinct", "03-where"]).unwrap();

    let report = run_all(&connector, &fetcher, &selected, 4).await;
    let text = report.render(OutputFormat::Text).unwrap();
    assert!(text.starts_with("PASS  02-distinct"));
    assert!(text.contains("FAIL  03-where"));
    assert!(text.ends_with("2 exercise(s): 1 passed, 1 failed"));

    let json: serde_json::Value =
        serde_json::from_str(&report.render(OutputFormat::Json).unwrap()).unwrap();
    assert_eq!(json["outcomes"][1]["status"], "fetch_failed");
}

#[tokio::test]
async fn test_unreachable_database_fails_every_exercise() {
    let (dir, fetcher) = workspace();
    write_exercise(dir.path(), "02-distinct", DISTINCT_SQL);

    let connector = MockConnector::refusing("Cannot connect to localhost:5432");
    let catalog = Catalog::sakila();

    let report = run_all(&connector, &fetcher, catalog.exercises(), 4).await;
    assert_eq!(report.summary.failed, 12);
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.verdict.message().is_some_and(|m| m.contains("localhost:5432"))));
}
