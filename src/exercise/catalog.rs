//! Expectations for the Sakila DML exercises.

use chrono::{NaiveDate, NaiveDateTime};

use crate::db::Value;
use crate::verify::predicate::{
    all_of, any_of, at_least, between, contains, date_after, date_before, date_between,
    date_in, ends_with, equals, greater_than, is_true, less_than, on_date, one_of,
    starts_with, word_count_between,
};
use crate::verify::{ExerciseExpectation, RowSetExpectation, SortDirection};

const ACTOR: &[&str] = &["actor_id", "first_name", "last_name", "last_update"];

const CATEGORY: &[&str] = &["category_id", "name", "last_update"];

const CUSTOMER: &[&str] = &[
    "customer_id",
    "store_id",
    "first_name",
    "last_name",
    "email",
    "address_id",
    "active",
    "create_date",
    "last_update",
];

const FILM: &[&str] = &[
    "film_id",
    "title",
    "description",
    "release_year",
    "language_id",
    "original_language_id",
    "rental_duration",
    "rental_rate",
    "length",
    "replacement_cost",
    "rating",
    "special_features",
    "last_update",
];

const PAYMENT: &[&str] = &[
    "payment_id",
    "customer_id",
    "staff_id",
    "rental_id",
    "amount",
    "payment_date",
    "last_update",
];

const STAFF: &[&str] = &[
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

const PAYMENT_BRIEF: &[&str] = &["payment_id", "amount", "payment_date"];

fn day(year: i32, month: u32, date: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, date).expect("catalog dates are valid")
}

fn at(year: i32, month: u32, date: u32, hour: u32, min: u32, sec: u32) -> NaiveDateTime {
    day(year, month, date)
        .and_hms_opt(hour, min, sec)
        .expect("catalog times are valid")
}

/// Every Sakila DML exercise, in id order.
pub fn sakila_dml() -> Vec<ExerciseExpectation> {
    vec![
        select_statement(),
        distinct(),
        where_clause(),
        and(),
        or(),
        in_list(),
        between_range(),
        like(),
        limit(),
        is_it_null(),
        order_by(),
        inner_join(),
    ]
}

fn select_statement() -> ExerciseExpectation {
    ExerciseExpectation::multiple(
        "01-select-statement",
        vec![
            RowSetExpectation::new(ACTOR.iter().copied()).exactly(200),
            RowSetExpectation::new(["last_name"]).exactly(200),
            RowSetExpectation::new([
                "title",
                "description",
                "rental_duration",
                "rental_rate",
                "total_rental_cost",
            ])
            .exactly(1000),
        ],
    )
}

fn distinct() -> ExerciseExpectation {
    ExerciseExpectation::single(
        "02-distinct",
        RowSetExpectation::new(["last_name"]).exactly(121),
    )
}

fn where_clause() -> ExerciseExpectation {
    ExerciseExpectation::multiple(
        "03-where",
        vec![
            RowSetExpectation::new(["title", "description", "rating", "length"])
                .exactly(46)
                .expect(at_least("length", 180.0)),
            RowSetExpectation::new(PAYMENT_BRIEF.iter().copied())
                .exactly(15730)
                .expect(date_after("payment_date", at(2005, 5, 27, 0, 0, 0))),
        ],
    )
}

fn and() -> ExerciseExpectation {
    ExerciseExpectation::multiple(
        "04-and",
        vec![
            RowSetExpectation::new(PAYMENT_BRIEF.iter().copied())
                .exactly(167)
                .expect(date_after("payment_date", at(2005, 5, 27, 0, 0, 0)))
                .expect(date_before("payment_date", at(2005, 5, 27, 23, 59, 59))),
            RowSetExpectation::new(CUSTOMER.iter().copied())
                .exactly(54)
                .expect(is_true("active"))
                .expect(starts_with("last_name", "S")),
        ],
    )
}

fn or() -> ExerciseExpectation {
    ExerciseExpectation::multiple(
        "05-or",
        vec![
            RowSetExpectation::new(CUSTOMER.iter().copied())
                .exactly(336)
                .expect(any_of(vec![
                    equals("store_id", 1),
                    starts_with("last_name", "D"),
                ])),
            RowSetExpectation::new(CATEGORY.iter().copied())
                .exactly(4)
                .expect(any_of(vec![
                    all_of(vec![
                        greater_than("category_id", 4.0),
                        starts_with("name", "C"),
                    ]),
                    starts_with("name", "S"),
                    starts_with("name", "T"),
                ])),
        ],
    )
}

fn in_list() -> ExerciseExpectation {
    ExerciseExpectation::multiple(
        "06-in",
        vec![
            RowSetExpectation::new(["phone", "district"])
                .exactly(24)
                .expect(one_of(
                    "district",
                    ["California", "England", "Taipei", "West Java"],
                )),
            RowSetExpectation::new(PAYMENT_BRIEF.iter().copied())
                .exactly(458)
                .expect(date_in(
                    "payment_date",
                    &[day(2005, 5, 25), day(2005, 5, 27), day(2005, 5, 29)],
                )),
        ],
    )
}

fn between_range() -> ExerciseExpectation {
    ExerciseExpectation::multiple(
        "07-between",
        vec![
            RowSetExpectation::new(PAYMENT.iter().copied()).expect(date_between(
                "payment_date",
                at(2005, 5, 25, 0, 0, 0),
                at(2005, 5, 26, 23, 59, 59),
            )),
            RowSetExpectation::new(["title", "description", "release_year", "total_rental_cost"])
                .expect(word_count_between("description", 18, 20)),
        ],
    )
}

fn like() -> ExerciseExpectation {
    ExerciseExpectation::multiple(
        "08-like",
        vec![
            RowSetExpectation::new(["title", "description", "release_year"])
                .expect(starts_with("description", "A Thoughtful")),
            RowSetExpectation::new(["title", "description", "rental_duration"])
                .expect(ends_with("description", "Boat")),
            RowSetExpectation::new(["title", "length", "description", "rental_rate"])
                .expect(greater_than("length", 180.0)),
        ],
    )
}

fn limit() -> ExerciseExpectation {
    ExerciseExpectation::multiple(
        "09-limit",
        vec![
            RowSetExpectation::new(PAYMENT.iter().copied())
                .exactly(20)
                .pin(0, "payment_id", 1),
            RowSetExpectation::new(["payment_date", "amount"])
                .exactly(1000)
                .expect(greater_than("amount", 5.0)),
        ],
    )
}

fn is_it_null() -> ExerciseExpectation {
    let staff_without_password: Vec<&str> = STAFF
        .iter()
        .copied()
        .filter(|c| *c != "password")
        .collect();

    ExerciseExpectation::multiple(
        "10-is-it-null",
        vec![
            RowSetExpectation::new(STAFF.iter().copied()).pin(0, "password", Value::Null),
            RowSetExpectation::new(staff_without_password).pin(0, "staff_id", 1),
        ],
    )
}

fn order_by() -> ExerciseExpectation {
    let ratings = ["NC-17", "R", "PG-13", "PG", "G"]
        .iter()
        .enumerate()
        .fold(RowSetExpectation::new(["rating"]).exactly(5), |set, (row, rating)| {
            set.pin(row, "rating", *rating)
        });

    ExerciseExpectation::multiple(
        "11-order-by",
        vec![
            RowSetExpectation::new(FILM.iter().copied())
                .exactly(1000)
                .sorted_by("length", SortDirection::Ascending),
            ratings,
            RowSetExpectation::new(["payment_date", "amount"])
                .exactly(20)
                .sorted_by("amount", SortDirection::Descending),
            RowSetExpectation::new([
                "title",
                "description",
                "special_features",
                "length",
                "rental_duration",
            ])
            .exactly(10)
            .expect(contains("special_features", "Behind the Scenes"))
            .expect(less_than("length", 120.0))
            .expect(between("rental_duration", 5.0, 7.0))
            .sorted_by("length", SortDirection::Descending),
        ],
    )
}

fn inner_join() -> ExerciseExpectation {
    ExerciseExpectation::single(
        "12-inner-join",
        RowSetExpectation::new(["rental_date", "first_name", "last_name", "title"])
            .exactly(8)
            .expect(on_date("rental_date", day(2005, 5, 25))),
    )
}
