//! Declarative result-set verification.
//!
//! An [`ExerciseExpectation`] is plain data: per row set, the expected
//! columns, a row-count constraint, per-row predicates, pinned values and an
//! optional sort order. [`verify`] checks produced row sets against it. It is
//! a pure function and stops at the first failure.

pub mod predicate;

pub use predicate::RowPredicate;

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use crate::db::{RowSet, Value};
use crate::fetch::Fetched;

/// Constraint on the number of rows in a row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum RowCount {
    /// Exactly this many rows.
    Exactly(usize),
    /// At least this many rows.
    AtLeast(usize),
    /// No constraint.
    Any,
}

impl RowCount {
    /// Returns true if `actual` rows satisfy the constraint.
    pub fn accepts(&self, actual: usize) -> bool {
        match self {
            Self::Exactly(n) => actual == *n,
            Self::AtLeast(n) => actual >= *n,
            Self::Any => true,
        }
    }
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::Any => write!(f, "any number of"),
        }
    }
}

/// Direction of a sort-order expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Non-decreasing.
    Ascending,
    /// Non-increasing.
    Descending,
}

impl SortDirection {
    fn allows(&self, ordering: Ordering) -> bool {
        match self {
            Self::Ascending => ordering != Ordering::Greater,
            Self::Descending => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "ascending"),
            Self::Descending => write!(f, "descending"),
        }
    }
}

/// Rows must be sorted by `column` in `direction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderExpectation {
    pub column: String,
    pub direction: SortDirection,
}

/// A specific value expected at a specific row.
#[derive(Debug, Clone, PartialEq)]
pub struct PinnedValue {
    /// Zero-based row index.
    pub row: usize,
    pub column: String,
    pub value: Value,
}

/// Expectations for one row set.
#[derive(Debug, Clone)]
pub struct RowSetExpectation {
    /// Expected column names, position for position.
    pub columns: Vec<String>,
    pub count: RowCount,
    pub predicates: Vec<RowPredicate>,
    pub pinned: Vec<PinnedValue>,
    pub order: Option<OrderExpectation>,
}

impl RowSetExpectation {
    /// Expects exactly `columns`, any number of rows, and nothing else yet.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            count: RowCount::Any,
            predicates: Vec::new(),
            pinned: Vec::new(),
            order: None,
        }
    }

    /// Requires exactly `n` rows.
    pub fn exactly(mut self, n: usize) -> Self {
        self.count = RowCount::Exactly(n);
        self
    }

    /// Requires at least `n` rows.
    pub fn at_least(mut self, n: usize) -> Self {
        self.count = RowCount::AtLeast(n);
        self
    }

    /// Requires every row to satisfy `predicate`.
    pub fn expect(mut self, predicate: RowPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Requires `column` of row `row` (zero-based) to equal `value`.
    pub fn pin(mut self, row: usize, column: &str, value: impl Into<Value>) -> Self {
        self.pinned.push(PinnedValue {
            row,
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Requires rows to be sorted by `column`.
    pub fn sorted_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order = Some(OrderExpectation {
            column: column.to_string(),
            direction,
        });
        self
    }
}

/// Whether an exercise's query produces one row set or several.
#[derive(Debug, Clone)]
pub enum Shape {
    Single(RowSetExpectation),
    Multiple(Vec<RowSetExpectation>),
}

/// Everything expected of one exercise.
#[derive(Debug, Clone)]
pub struct ExerciseExpectation {
    pub exercise: String,
    pub shape: Shape,
}

impl ExerciseExpectation {
    /// The exercise's query produces one row set.
    pub fn single(exercise: &str, expectation: RowSetExpectation) -> Self {
        Self {
            exercise: exercise.to_string(),
            shape: Shape::Single(expectation),
        }
    }

    /// The exercise's query produces one row set per statement.
    pub fn multiple(exercise: &str, expectations: Vec<RowSetExpectation>) -> Self {
        Self {
            exercise: exercise.to_string(),
            shape: Shape::Multiple(expectations),
        }
    }

    /// Row-set expectations in statement order.
    pub fn row_sets(&self) -> &[RowSetExpectation] {
        match &self.shape {
            Shape::Single(expectation) => std::slice::from_ref(expectation),
            Shape::Multiple(expectations) => expectations,
        }
    }
}

/// Why produced row sets do not meet an expectation.
///
/// Result-set numbers and row numbers are stored zero-based and displayed
/// one-based.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationFailure {
    #[error("expected {expected} result set(s), got {actual}")]
    ResultSetCountMismatch { expected: usize, actual: usize },

    #[error(
        "result set #{}: {}",
        one_based(.result_set),
        describe_column_mismatch(.position, .expected, .actual, .row)
    )]
    ColumnMismatch {
        result_set: usize,
        row: usize,
        position: usize,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("result set #{}: expected {expected}, got {actual} rows", one_based(.result_set))]
    CardinalityMismatch {
        result_set: usize,
        expected: RowCount,
        actual: usize,
    },

    #[error(
        "result set #{}: row {} violates `{predicate}`: {value}",
        one_based(.result_set),
        one_based(.row)
    )]
    PredicateViolation {
        result_set: usize,
        row: usize,
        predicate: String,
        value: String,
    },

    #[error(
        "result set #{}: not in {direction} order of `{column}` at row {}: {} follows {}",
        one_based(.result_set),
        one_based(.row),
        describe_key(.current),
        describe_key(.previous)
    )]
    OrderViolation {
        result_set: usize,
        row: usize,
        column: String,
        direction: SortDirection,
        /// `None` when the row has no such column.
        previous: Option<Value>,
        current: Option<Value>,
    },
}

fn describe_key(key: &Option<Value>) -> String {
    match key {
        Some(value) => value.to_literal(),
        None => "no column".to_string(),
    }
}

fn one_based(index: &usize) -> usize {
    index + 1
}

fn describe_column_mismatch(
    position: &usize,
    expected: &Option<String>,
    actual: &Option<String>,
    row: &usize,
) -> String {
    let at = format!("column #{}", position + 1);
    match (expected.as_deref(), actual.as_deref()) {
        (Some(e), Some(a)) => format!("expected `{e}` to be {at}, found `{a}` (row {})", row + 1),
        (Some(e), None) => format!("expected `{e}` to be {at}, found no column (row {})", row + 1),
        (None, Some(a)) => format!("unexpected extra column `{a}` at {at} (row {})", row + 1),
        (None, None) => format!("{at} mismatch (row {})", row + 1),
    }
}

/// Summary of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verified {
    pub row_sets: usize,
    pub rows: usize,
}

/// Outcome of [`verify`].
pub type VerificationResult = std::result::Result<Verified, VerificationFailure>;

/// Checks produced row sets against an exercise's expectation.
///
/// Row sets are checked in statement order; within one, columns, then
/// cardinality, then predicates, then pinned values, then sort order.
pub fn verify(expectation: &ExerciseExpectation, produced: &Fetched) -> VerificationResult {
    let expected = expectation.row_sets();
    let actual = produced.row_sets();

    if expected.len() != actual.len() {
        return Err(VerificationFailure::ResultSetCountMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    for (index, (expectation, set)) in expected.iter().zip(actual).enumerate() {
        verify_row_set(index, expectation, set)?;
    }

    Ok(Verified {
        row_sets: actual.len(),
        rows: actual.iter().map(RowSet::len).sum(),
    })
}

/// Checks one row set. `index` is its zero-based position among the results.
pub fn verify_row_set(
    index: usize,
    expectation: &RowSetExpectation,
    set: &RowSet,
) -> Result<(), VerificationFailure> {
    check_columns(index, &expectation.columns, set)?;
    check_cardinality(index, expectation.count, set)?;
    check_predicates(index, &expectation.predicates, set)?;
    check_pinned(index, &expectation.pinned, set)?;
    if let Some(order) = &expectation.order {
        check_order(index, order, set)?;
    }
    Ok(())
}

fn compare_keys<'a>(
    result_set: usize,
    row: usize,
    expected: &[String],
    keys: impl Iterator<Item = &'a str>,
) -> Result<(), VerificationFailure> {
    let keys: Vec<&str> = keys.collect();
    let width = expected.len().max(keys.len());

    for position in 0..width {
        let want = expected.get(position).map(String::as_str);
        let got = keys.get(position).copied();
        if want != got {
            return Err(VerificationFailure::ColumnMismatch {
                result_set,
                row,
                position,
                expected: want.map(String::from),
                actual: got.map(String::from),
            });
        }
    }
    Ok(())
}

fn check_columns(
    result_set: usize,
    expected: &[String],
    set: &RowSet,
) -> Result<(), VerificationFailure> {
    // An empty row set only has a header to check when the driver reported one.
    if set.is_empty() && !set.columns.is_empty() {
        let header = set.columns.iter().map(|c| c.name.as_str());
        return compare_keys(result_set, 0, expected, header);
    }

    for (row_index, row) in set.iter().enumerate() {
        compare_keys(result_set, row_index, expected, row.keys())?;
    }
    Ok(())
}

fn check_cardinality(
    result_set: usize,
    expected: RowCount,
    set: &RowSet,
) -> Result<(), VerificationFailure> {
    if expected.accepts(set.len()) {
        Ok(())
    } else {
        Err(VerificationFailure::CardinalityMismatch {
            result_set,
            expected,
            actual: set.len(),
        })
    }
}

fn check_predicates(
    result_set: usize,
    predicates: &[RowPredicate],
    set: &RowSet,
) -> Result<(), VerificationFailure> {
    for (row_index, row) in set.iter().enumerate() {
        if let Some(failed) = predicates.iter().find(|p| !p.test(&row)) {
            return Err(VerificationFailure::PredicateViolation {
                result_set,
                row: row_index,
                predicate: failed.description().to_string(),
                value: failed.offending_value(&row),
            });
        }
    }
    Ok(())
}

fn check_pinned(
    result_set: usize,
    pinned: &[PinnedValue],
    set: &RowSet,
) -> Result<(), VerificationFailure> {
    for pin in pinned {
        let Some(row) = set.row(pin.row) else {
            return Err(VerificationFailure::CardinalityMismatch {
                result_set,
                expected: RowCount::AtLeast(pin.row + 1),
                actual: set.len(),
            });
        };

        let predicate = predicate::equals(&pin.column, pin.value.clone());
        if !predicate.test(&row) {
            return Err(VerificationFailure::PredicateViolation {
                result_set,
                row: pin.row,
                predicate: format!("{} at row {}", predicate.description(), pin.row + 1),
                value: predicate.offending_value(&row),
            });
        }
    }
    Ok(())
}

fn check_order(
    result_set: usize,
    order: &OrderExpectation,
    set: &RowSet,
) -> Result<(), VerificationFailure> {
    let key = |row: usize| set.row(row).and_then(|r| r.get(&order.column).cloned());

    for row in 1..set.len() {
        let previous = key(row - 1);
        let current = key(row);
        let in_order = match (&previous, &current) {
            (Some(previous), Some(current)) => previous
                .sort_cmp(current)
                .is_some_and(|ordering| order.direction.allows(ordering)),
            _ => false,
        };

        if !in_order {
            return Err(VerificationFailure::OrderViolation {
                result_set,
                row,
                column: order.column.clone(),
                direction: order.direction,
                previous,
                current,
            });
        }
    }
    Ok(())
}
