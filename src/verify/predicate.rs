//! Per-row predicates.
//!
//! A predicate is a named boolean test of one row. When it inspects a single
//! column it remembers which one, so a violation can show the offending value.
//! Values of the wrong type, and missing columns, fail the test.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::db::{RowRef, Value};

type RowTest = dyn Fn(&RowRef<'_>) -> bool + Send + Sync;

/// A named boolean function of a single row.
#[derive(Clone)]
pub struct RowPredicate {
    description: String,
    column: Option<String>,
    test: Arc<RowTest>,
}

impl RowPredicate {
    /// Creates a predicate over whole rows.
    pub fn custom<F>(description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&RowRef<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            column: None,
            test: Arc::new(test),
        }
    }

    /// Creates a predicate over the value of one column.
    pub fn on_column<F>(column: impl Into<String>, description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let column = column.into();
        let lookup = column.clone();
        Self {
            description: description.into(),
            column: Some(column),
            test: Arc::new(move |row: &RowRef<'_>| row.get(&lookup).is_some_and(&test)),
        }
    }

    /// Human-readable description, e.g. `length >= 180`.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The column this predicate inspects, if it inspects exactly one.
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Evaluates the predicate against a row.
    pub fn test(&self, row: &RowRef<'_>) -> bool {
        (self.test)(row)
    }

    /// Renders what a violation should point at: the inspected value, or the whole row.
    pub fn offending_value(&self, row: &RowRef<'_>) -> String {
        match self.column() {
            Some(column) => match row.get(column) {
                Some(value) => format!("{column} = {}", value.to_literal()),
                None => format!("no column `{column}`"),
            },
            None => row.to_string(),
        }
    }
}

impl fmt::Debug for RowPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowPredicate")
            .field("description", &self.description)
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}

fn numeric(
    column: &str,
    op: &'static str,
    bound: f64,
    accept: fn(f64, f64) -> bool,
) -> RowPredicate {
    RowPredicate::on_column(column, format!("{column} {op} {bound}"), move |v| {
        v.as_f64().is_some_and(|x| accept(x, bound))
    })
}

/// `column >= bound`.
pub fn at_least(column: &str, bound: f64) -> RowPredicate {
    numeric(column, ">=", bound, |x, b| x >= b)
}

/// `column <= bound`.
pub fn at_most(column: &str, bound: f64) -> RowPredicate {
    numeric(column, "<=", bound, |x, b| x <= b)
}

/// `column > bound`.
pub fn greater_than(column: &str, bound: f64) -> RowPredicate {
    numeric(column, ">", bound, |x, b| x > b)
}

/// `column < bound`.
pub fn less_than(column: &str, bound: f64) -> RowPredicate {
    numeric(column, "<", bound, |x, b| x < b)
}

/// `low <= column <= high`.
pub fn between(column: &str, low: f64, high: f64) -> RowPredicate {
    RowPredicate::on_column(
        column,
        format!("{column} between {low} and {high}"),
        move |v| v.as_f64().is_some_and(|x| low <= x && x <= high),
    )
}

/// `column = expected`. Integers and floats compare numerically.
pub fn equals(column: &str, expected: impl Into<Value>) -> RowPredicate {
    let expected = expected.into();
    RowPredicate::on_column(
        column,
        format!("{column} = {}", expected.to_literal()),
        move |v| match (v, &expected) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            _ => v.sort_cmp(&expected) == Some(Ordering::Equal),
        },
    )
}

/// `column` is one of `allowed`.
pub fn one_of<I, V>(column: &str, allowed: I) -> RowPredicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
    let listed = allowed
        .iter()
        .map(Value::to_literal)
        .collect::<Vec<_>>()
        .join(", ");
    RowPredicate::on_column(column, format!("{column} in [{listed}]"), move |v| {
        allowed
            .iter()
            .any(|a| !a.is_null() && v.sort_cmp(a) == Some(Ordering::Equal))
    })
}

/// `column` is true (or a non-zero flag).
pub fn is_true(column: &str) -> RowPredicate {
    RowPredicate::on_column(column, format!("{column} is true"), |v| {
        v.as_bool() == Some(true)
    })
}

/// `column IS NULL`.
pub fn is_null(column: &str) -> RowPredicate {
    RowPredicate::on_column(column, format!("{column} is null"), Value::is_null)
}

fn text(
    column: &str,
    description: String,
    accept: impl Fn(&str) -> bool + Send + Sync + 'static,
) -> RowPredicate {
    RowPredicate::on_column(column, description, move |v| v.as_str().is_some_and(&accept))
}

/// `column` starts with `prefix`.
pub fn starts_with(column: &str, prefix: &str) -> RowPredicate {
    let prefix = prefix.to_string();
    text(column, format!("{column} starts with {prefix:?}"), move |s| {
        s.starts_with(prefix.as_str())
    })
}

/// `column` ends with `suffix`.
pub fn ends_with(column: &str, suffix: &str) -> RowPredicate {
    let suffix = suffix.to_string();
    text(column, format!("{column} ends with {suffix:?}"), move |s| {
        s.ends_with(suffix.as_str())
    })
}

/// `column` contains `needle`.
pub fn contains(column: &str, needle: &str) -> RowPredicate {
    let needle = needle.to_string();
    text(column, format!("{column} contains {needle:?}"), move |s| {
        s.contains(needle.as_str())
    })
}

/// `column` matches the regular expression `pattern`.
pub fn matches(column: &str, pattern: &str) -> Result<RowPredicate, regex::Error> {
    let re = Regex::new(pattern)?;
    Ok(text(column, format!("{column} matches /{pattern}/"), move |s| {
        re.is_match(s)
    }))
}

/// Splitting `column` on single spaces yields between `low` and `high` words, inclusive.
pub fn word_count_between(column: &str, low: usize, high: usize) -> RowPredicate {
    text(
        column,
        format!("{column} has {low} to {high} words"),
        move |s| {
            let words = s.split(' ').count();
            low <= words && words <= high
        },
    )
}

fn temporal(
    column: &str,
    description: String,
    accept: impl Fn(NaiveDateTime) -> bool + Send + Sync + 'static,
) -> RowPredicate {
    RowPredicate::on_column(column, description, move |v| {
        v.as_datetime().is_some_and(&accept)
    })
}

/// `column` is strictly after `instant`.
pub fn date_after(column: &str, instant: NaiveDateTime) -> RowPredicate {
    temporal(column, format!("{column} after {instant}"), move |t| t > instant)
}

/// `column` is strictly before `instant`.
pub fn date_before(column: &str, instant: NaiveDateTime) -> RowPredicate {
    temporal(column, format!("{column} before {instant}"), move |t| t < instant)
}

/// `column` is strictly between `start` and `end`.
pub fn date_between(column: &str, start: NaiveDateTime, end: NaiveDateTime) -> RowPredicate {
    temporal(
        column,
        format!("{column} between {start} and {end}"),
        move |t| start < t && t < end,
    )
}

/// `column` falls on calendar day `day`.
pub fn on_date(column: &str, day: NaiveDate) -> RowPredicate {
    temporal(column, format!("{column} on {day}"), move |t| t.date() == day)
}

/// `column` falls on one of the calendar days in `days`.
pub fn date_in(column: &str, days: &[NaiveDate]) -> RowPredicate {
    let days = days.to_vec();
    let listed = days
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    temporal(column, format!("{column} on one of [{listed}]"), move |t| {
        days.contains(&t.date())
    })
}

/// Shared column of `predicates`, if they all inspect the same one.
fn common_column(predicates: &[RowPredicate]) -> Option<String> {
    let first = predicates.first()?.column.as_deref()?;
    predicates
        .iter()
        .all(|p| p.column.as_deref() == Some(first))
        .then(|| first.to_string())
}

fn combine(predicates: Vec<RowPredicate>, joiner: &str, all: bool) -> RowPredicate {
    let description = predicates
        .iter()
        .map(|p| {
            let compound = p.description.contains(" and ") || p.description.contains(" or ");
            if predicates.len() > 1 && compound {
                format!("({})", p.description)
            } else {
                p.description.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(joiner);
    let column = common_column(&predicates);

    RowPredicate {
        description,
        column,
        test: Arc::new(move |row: &RowRef<'_>| {
            if all {
                predicates.iter().all(|p| p.test(row))
            } else {
                predicates.iter().any(|p| p.test(row))
            }
        }),
    }
}

/// Every predicate holds.
pub fn all_of(predicates: Vec<RowPredicate>) -> RowPredicate {
    combine(predicates, " and ", true)
}

/// At least one predicate holds.
pub fn any_of(predicates: Vec<RowPredicate>) -> RowPredicate {
    combine(predicates, " or ", false)
}
