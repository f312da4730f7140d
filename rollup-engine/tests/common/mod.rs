//! FILENAME: tests/common/mod.rs
//! Fixtures and lookup helpers for rollup-engine integration tests.

#![allow(dead_code)]

use rollup_engine::{AggregationConfig, DimensionList, Operation, TAG_NAMES};
use table_engine::{Table, Value};

/// Student grades: three students, two years, a few subjects each.
pub struct GradesFixture;

impl GradesFixture {
    pub const ROWS: [(&'static str, &'static str, &'static str, i64, i64); 12] = [
        ("John", "2019", "ECON", 90, 5),
        ("John", "2020", "ECON", 94, 5),
        ("John", "2019", "STAT", 96, 5),
        ("John", "2020", "STAT", 98, 5),
        ("Andy", "2019", "MUSIC", 70, 3),
        ("Andy", "2020", "MUSIC", 72, 3),
        ("Andy", "2019", "PHIL", 74, 3),
        ("Andy", "2020", "PHIL", 76, 3),
        ("Beth", "2019", "PHIL", 85, 3),
        ("Beth", "2020", "PHIL", 83, 3),
        ("Beth", "2019", "COMPSCI", 87, 4),
        ("Beth", "2020", "COMPSCI", 89, 4),
    ];

    /// Columns: name, year, subject, grade, credits.
    pub fn table() -> Table {
        let rows = Self::ROWS
            .iter()
            .map(|&(name, year, subject, grade, credits)| {
                vec![
                    Value::from(name),
                    Value::from(year),
                    Value::from(subject),
                    Value::Int(grade),
                    Value::Int(credits),
                ]
            })
            .collect();
        Table::from_rows(&["name", "year", "subject", "grade", "credits"], rows)
            .expect("fixture table")
    }

    /// The fixture table serialized to JSON.
    pub fn json() -> String {
        serde_json::to_string(&Self::table()).expect("fixture json")
    }
}

pub fn lists(raw: &[&[&str]]) -> Vec<DimensionList> {
    raw.iter()
        .map(|l| l.iter().map(|s| s.to_string()).collect())
        .collect()
}

/// Builds a configuration; an empty `change` means no change dimensions.
pub fn config(
    operations: Vec<Operation>,
    constant: &[&[&str]],
    change: &[&[&str]],
) -> AggregationConfig {
    let change = (!change.is_empty()).then(|| lists(change));
    AggregationConfig::new(operations, lists(constant), change)
}

/// Index of the single row whose columns hold the given values.
/// Panics when no row or more than one row matches.
pub fn find_row(table: &Table, criteria: &[(&str, Value)]) -> usize {
    let matches = find_rows(table, criteria);
    assert_eq!(
        matches.len(),
        1,
        "expected exactly one row matching {:?}, found {:?}",
        criteria,
        matches
    );
    matches[0]
}

/// Indices of every row whose columns hold the given values.
pub fn find_rows(table: &Table, criteria: &[(&str, Value)]) -> Vec<usize> {
    (0..table.height())
        .filter(|&row| {
            criteria
                .iter()
                .all(|(column, expected)| table.value(row, column).expect("column") == *expected)
        })
        .collect()
}

/// Rows produced by the grouping set tagged with `names`.
pub fn rows_tagged(table: &Table, names: &str) -> Vec<usize> {
    find_rows(table, &[(TAG_NAMES, Value::from(names))])
}

pub fn float_at(table: &Table, row: usize, column: &str) -> f64 {
    table
        .value(row, column)
        .expect("column")
        .as_f64()
        .unwrap_or_else(|| panic!("{} at row {} is not numeric", column, row))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
