//! Catalog expectations checked against synthetic row sets.

use db_drill::db::{RowSet, Value};
use db_drill::exercise::Catalog;
use db_drill::fetch::Fetched;
use db_drill::verify::{verify, ExerciseExpectation, RowCount, VerificationFailure};
use pretty_assertions::assert_eq;

fn exercise(id: &str) -> ExerciseExpectation {
    Catalog::sakila().get(id).cloned().unwrap()
}

fn timestamp(text: &str) -> Value {
    Value::from_text("DATETIME", text.to_string())
}

fn payments(n: usize, date: &str) -> RowSet {
    RowSet::from_names(
        ["payment_id", "amount", "payment_date"],
        (0..n)
            .map(|i| vec![Value::Int(i as i64 + 1), Value::Float(2.99), timestamp(date)])
            .collect(),
    )
}

fn long_films(lengths: &[i64]) -> RowSet {
    RowSet::from_names(
        ["title", "description", "rating", "length"],
        lengths
            .iter()
            .map(|l| {
                vec![
                    Value::from("CHICAGO NORTH"),
                    Value::from("A Fateful Yarn"),
                    Value::from("PG-13"),
                    Value::Int(*l),
                ]
            })
            .collect(),
    )
}

#[test]
fn test_distinct_renamed_column() {
    let produced = Fetched::Single(RowSet::from_names(
        ["surname"],
        vec![vec![Value::from("AKROYD")]],
    ));

    let failure = verify(&exercise("02-distinct"), &produced).unwrap_err();
    assert_eq!(
        failure,
        VerificationFailure::ColumnMismatch {
            result_set: 0,
            row: 0,
            position: 0,
            expected: Some("last_name".to_string()),
            actual: Some("surname".to_string()),
        }
    );
}

#[test]
fn test_where_passes_and_finds_short_film() {
    let mut lengths = vec![185; 46];
    let produced = Fetched::Multiple(vec![
        long_films(&lengths),
        payments(15730, "2005-05-28 10:00:00"),
    ]);
    assert!(verify(&exercise("03-where"), &produced).is_ok());

    lengths[10] = 179;
    let produced = Fetched::Multiple(vec![
        long_films(&lengths),
        payments(15730, "2005-05-28 10:00:00"),
    ]);
    let failure = verify(&exercise("03-where"), &produced).unwrap_err();
    assert_eq!(
        failure,
        VerificationFailure::PredicateViolation {
            result_set: 0,
            row: 10,
            predicate: "length >= 180".to_string(),
            value: "length = 179".to_string(),
        }
    );
}

#[test]
fn test_where_second_statement_too_early() {
    let produced = Fetched::Multiple(vec![
        long_films(&[185; 46]),
        payments(15730, "2005-05-26 10:00:00"),
    ]);
    let failure = verify(&exercise("03-where"), &produced).unwrap_err();
    assert!(matches!(
        failure,
        VerificationFailure::PredicateViolation { result_set: 1, row: 0, .. }
    ));
}

#[test]
fn test_and_counts_each_statement() {
    let customers = |n: usize, last_name: &str| {
        RowSet::from_names(
            [
                "customer_id",
                "store_id",
                "first_name",
                "last_name",
                "email",
                "address_id",
                "active",
                "create_date",
                "last_update",
            ],
            (0..n)
                .map(|i| {
                    vec![
                        Value::Int(i as i64),
                        Value::Int(1),
                        Value::from("MARY"),
                        Value::from(last_name),
                        Value::from("mary@example.org"),
                        Value::Int(5),
                        Value::Int(1),
                        timestamp("2006-02-14 22:04:36"),
                        timestamp("2006-02-15 04:57:20"),
                    ]
                })
                .collect(),
        )
    };

    let good = Fetched::Multiple(vec![
        payments(167, "2005-05-27 12:00:00"),
        customers(54, "SMITH"),
    ]);
    assert!(verify(&exercise("04-and"), &good).is_ok());

    let short = Fetched::Multiple(vec![
        payments(167, "2005-05-27 12:00:00"),
        customers(53, "SMITH"),
    ]);
    let failure = verify(&exercise("04-and"), &short).unwrap_err();
    assert_eq!(
        failure,
        VerificationFailure::CardinalityMismatch {
            result_set: 1,
            expected: RowCount::Exactly(54),
            actual: 53,
        }
    );

    let wrong_letter = Fetched::Multiple(vec![
        payments(167, "2005-05-27 12:00:00"),
        customers(54, "JONES"),
    ]);
    assert!(matches!(
        verify(&exercise("04-and"), &wrong_letter),
        Err(VerificationFailure::PredicateViolation { result_set: 1, .. })
    ));
}

#[test]
fn test_or_category_rule() {
    let categories = |rows: &[(i64, &str)]| {
        RowSet::from_names(
            ["category_id", "name", "last_update"],
            rows.iter()
                .map(|(id, name)| {
                    vec![
                        Value::Int(*id),
                        Value::from(*name),
                        timestamp("2006-02-15 04:46:27"),
                    ]
                })
                .collect(),
        )
    };
    let customers = RowSet::from_names(
        [
            "customer_id",
            "store_id",
            "first_name",
            "last_name",
            "email",
            "address_id",
            "active",
            "create_date",
            "last_update",
        ],
        (0..336)
            .map(|i| {
                vec![
                    Value::Int(i),
                    Value::Int(if i % 2 == 0 { 1 } else { 2 }),
                    Value::from("ANN"),
                    Value::from("DAVIS"),
                    Value::Null,
                    Value::Int(1),
                    Value::Int(1),
                    Value::Null,
                    Value::Null,
                ]
            })
            .collect(),
    );

    let good = Fetched::Multiple(vec![
        customers.clone(),
        categories(&[(5, "Comedy"), (14, "Sci-Fi"), (15, "Sports"), (16, "Travel")]),
    ]);
    assert!(verify(&exercise("05-or"), &good).is_ok());

    let bad = Fetched::Multiple(vec![
        customers,
        categories(&[(5, "Comedy"), (3, "Children"), (15, "Sports"), (16, "Travel")]),
    ]);
    let failure = verify(&exercise("05-or"), &bad).unwrap_err();
    match failure {
        VerificationFailure::PredicateViolation { result_set, row, value, .. } => {
            assert_eq!((result_set, row), (1, 1));
            assert!(value.contains("\"Children\""));
        }
        other => panic!("expected a predicate violation, got {other:?}"),
    }
}

#[test]
fn test_order_by_amount_descending() {
    let expectation = exercise("11-order-by");
    let amounts = |values: &[f64]| {
        RowSet::from_names(
            ["payment_date", "amount"],
            values
                .iter()
                .map(|a| vec![timestamp("2005-07-29 10:00:00"), Value::Float(*a)])
                .collect(),
        )
    };
    let set = &expectation.row_sets()[2];

    let sorted: Vec<f64> = (0..20).map(|i| 11.99 - i as f64 * 0.5).collect();
    assert!(db_drill::verify::verify_row_set(2, set, &amounts(&sorted)).is_ok());

    let mut unsorted = sorted.clone();
    unsorted.swap(4, 5);
    match db_drill::verify::verify_row_set(2, set, &amounts(&unsorted)) {
        Err(VerificationFailure::OrderViolation { row, column, .. }) => {
            assert_eq!(row, 5);
            assert_eq!(column, "amount");
        }
        other => panic!("expected an order violation, got {other:?}"),
    }
}

#[test]
fn test_wrong_number_of_statements() {
    let produced = Fetched::Single(long_films(&[185; 46]));
    assert_eq!(
        verify(&exercise("03-where"), &produced),
        Err(VerificationFailure::ResultSetCountMismatch {
            expected: 2,
            actual: 1
        })
    );
}

/// Builds `n` rows over `columns`, filling each cell with `cell(row, column)`.
fn table(columns: &[&str], n: usize, cell: impl Fn(usize, &str) -> Value) -> RowSet {
    RowSet::from_names(
        columns.iter().copied(),
        (0..n)
            .map(|row| columns.iter().map(|column| cell(row, *column)).collect())
            .collect(),
    )
}

const PAYMENT: &[&str] = &[
    "payment_id",
    "customer_id",
    "staff_id",
    "rental_id",
    "amount",
    "payment_date",
    "last_update",
];

fn payments_on(dates: &[&str]) -> RowSet {
    table(PAYMENT, dates.len(), |row, column| match column {
        "payment_date" => timestamp(dates[row]),
        "last_update" => timestamp("2006-02-15 22:12:30"),
        "amount" => Value::Float(2.99),
        _ => Value::Int(row as i64 + 1),
    })
}

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

#[test]
fn test_in_districts_and_payment_days() {
    let districts = ["California", "England", "Taipei", "West Java"];
    let phones = table(&["phone", "district"], 24, |row, column| match column {
        "phone" => Value::from(format!("55501{row:04}")),
        _ => Value::from(districts[row % districts.len()]),
    });
    let days = ["2005-05-25 11:30:37", "2005-05-27 00:00:00", "2005-05-29 23:59:59"];
    let on_days = |odd_one: Option<usize>| {
        table(&["payment_id", "amount", "payment_date"], 458, |row, column| match column {
            "payment_date" if Some(row) == odd_one => timestamp("2005-05-26 23:59:59"),
            "payment_date" => timestamp(days[row % days.len()]),
            "amount" => Value::Float(0.99),
            _ => Value::Int(row as i64 + 1),
        })
    };

    let good = Fetched::Multiple(vec![phones.clone(), on_days(None)]);
    assert!(verify(&exercise("06-in"), &good).is_ok());

    let bad = Fetched::Multiple(vec![phones, on_days(Some(100))]);
    match verify(&exercise("06-in"), &bad).unwrap_err() {
        VerificationFailure::PredicateViolation {
            result_set,
            row,
            predicate,
            ..
        } => {
            assert_eq!((result_set, row), (1, 100));
            assert_eq!(
                predicate,
                "payment_date on one of [2005-05-25, 2005-05-27, 2005-05-29]"
            );
        }
        other => panic!("expected a predicate violation, got {other:?}"),
    }
}

#[test]
fn test_between_excludes_start_of_range() {
    let films = |word_counts: &[usize]| {
        table(
            &["title", "description", "release_year", "total_rental_cost"],
            word_counts.len(),
            |row, column| match column {
                "description" => Value::from(words(word_counts[row])),
                "title" => Value::from("ACADEMY DINOSAUR"),
                "release_year" => Value::Int(2006),
                _ => Value::Float(5.94),
            },
        )
    };

    let good = Fetched::Multiple(vec![
        payments_on(&["2005-05-25 00:00:01", "2005-05-26 23:59:58"]),
        films(&[18, 19, 20]),
    ]);
    assert!(verify(&exercise("07-between"), &good).is_ok());

    let midnight = Fetched::Multiple(vec![
        payments_on(&["2005-05-25 11:30:37", "2005-05-25 00:00:00"]),
        films(&[18]),
    ]);
    assert_eq!(
        verify(&exercise("07-between"), &midnight),
        Err(VerificationFailure::PredicateViolation {
            result_set: 0,
            row: 1,
            predicate: "payment_date between 2005-05-25 00:00:00 and 2005-05-26 23:59:59"
                .to_string(),
            value: format!(
                "payment_date = {}",
                timestamp("2005-05-25 00:00:00").to_literal()
            ),
        })
    );

    let wordy = Fetched::Multiple(vec![
        payments_on(&["2005-05-25 11:30:37"]),
        films(&[19, 21]),
    ]);
    assert!(matches!(
        verify(&exercise("07-between"), &wordy),
        Err(VerificationFailure::PredicateViolation { result_set: 1, row: 1, .. })
    ));
}

#[test]
fn test_like_description_patterns() {
    let described = |columns: &[&str], descriptions: &[&str]| {
        table(columns, descriptions.len(), |row, column| match column {
            "description" => Value::from(descriptions[row]),
            "title" => Value::from("BOAT MAZE"),
            "length" => Value::Int(181),
            "rental_rate" => Value::Float(4.99),
            _ => Value::Int(6),
        })
    };
    let thoughtful = described(
        &["title", "description", "release_year"],
        &["A Thoughtful Drama of a Dentist And a Womanizer who must Meet a Husband in The Sahara Desert"],
    );
    let long = described(
        &["title", "length", "description", "rental_rate"],
        &["A Epic Story of a Pastry Chef And a Robot who must Chase a Mad Scientist in Ancient India"],
    );
    let boats = |last: &str| {
        described(
            &["title", "description", "rental_duration"],
            &[
                "A Fateful Display of a Man And a Cat who must Sink a Crocodile in A Jet Boat",
                last,
            ],
        )
    };

    let good = Fetched::Multiple(vec![
        thoughtful.clone(),
        boats("A Boring Epistle of a Butler And a Cat who must Fight a Pastry Chef in A MySQL Convention Boat"),
        long.clone(),
    ]);
    assert!(verify(&exercise("08-like"), &good).is_ok());

    let bad = Fetched::Multiple(vec![
        thoughtful,
        boats("A Boat Story of a Sumo Wrestler who must Outrace a Car in The Outback"),
        long,
    ]);
    match verify(&exercise("08-like"), &bad).unwrap_err() {
        VerificationFailure::PredicateViolation {
            result_set,
            row,
            predicate,
            ..
        } => {
            assert_eq!((result_set, row), (1, 1));
            assert_eq!(predicate, "description ends with \"Boat\"");
        }
        other => panic!("expected a predicate violation, got {other:?}"),
    }
}

#[test]
fn test_limit_pins_first_payment() {
    let big_payments = table(&["payment_date", "amount"], 1000, |_, column| match column {
        "amount" => Value::Float(5.99),
        _ => timestamp("2005-07-29 10:00:00"),
    });
    let first_twenty = |first_id: i64| {
        table(PAYMENT, 20, |row, column| match column {
            "payment_id" => Value::Int(first_id + row as i64),
            "payment_date" | "last_update" => timestamp("2005-05-25 11:30:37"),
            "amount" => Value::Float(2.99),
            _ => Value::Int(1),
        })
    };

    let good = Fetched::Multiple(vec![first_twenty(1), big_payments.clone()]);
    assert!(verify(&exercise("09-limit"), &good).is_ok());

    let offset = Fetched::Multiple(vec![first_twenty(2), big_payments]);
    assert_eq!(
        verify(&exercise("09-limit"), &offset),
        Err(VerificationFailure::PredicateViolation {
            result_set: 0,
            row: 0,
            predicate: "payment_id = 1 at row 1".to_string(),
            value: "payment_id = 2".to_string(),
        })
    );
}

#[test]
fn test_is_null_pins_missing_password() {
    let staff_columns = [
        "staff_id",
        "first_name",
        "last_name",
        "address_id",
        "picture",
        "email",
        "store_id",
        "active",
        "username",
        "password",
        "last_update",
    ];
    let staff = |columns: &[&str], password: Value| {
        table(columns, 1, |_, column| match column {
            "password" => password.clone(),
            "picture" => Value::Null,
            "first_name" | "last_name" | "email" | "username" => Value::from("Jon"),
            "last_update" => timestamp("2006-02-15 04:57:16"),
            _ => Value::Int(1),
        })
    };
    let without_password: Vec<&str> = staff_columns
        .iter()
        .copied()
        .filter(|c| *c != "password")
        .collect();

    let good = Fetched::Multiple(vec![
        staff(&staff_columns, Value::Null),
        staff(&without_password, Value::Null),
    ]);
    assert!(verify(&exercise("10-is-it-null"), &good).is_ok());

    let hashed = Fetched::Multiple(vec![
        staff(&staff_columns, Value::from("8cb2237d0679ca88db6464eac60da96345513964")),
        staff(&without_password, Value::Null),
    ]);
    match verify(&exercise("10-is-it-null"), &hashed).unwrap_err() {
        VerificationFailure::PredicateViolation {
            result_set,
            row,
            predicate,
            value,
        } => {
            assert_eq!((result_set, row), (0, 0));
            assert!(predicate.starts_with("password = "));
            assert!(predicate.ends_with(" at row 1"));
            assert!(value.contains("8cb2237d"));
        }
        other => panic!("expected a predicate violation, got {other:?}"),
    }
}
