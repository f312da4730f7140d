//! FILENAME: table-engine/src/join.rs
//! PURPOSE: Equi-joins and diagonal concatenation of tables.
//! CONTEXT: Keys compare by value, and a missing key matches another missing
//! key. Output rows follow the left table, then unmatched right rows.

use rustc_hash::FxHashMap;

use crate::column::{Column, DataType};
use crate::error::TableError;
use crate::table::Table;
use crate::value::{KeyValue, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Only rows whose key appears on both sides.
    Inner,
    /// Every row of both sides; the missing side is null-filled.
    Outer,
}

fn row_key(columns: &[&Column], row: usize) -> Vec<KeyValue> {
    columns.iter().map(|c| KeyValue::from(&c.get(row))).collect()
}

/// Joins `left` and `right` on the `on` columns.
/// The result holds the left columns in order followed by the right
/// non-key columns. A non-key name present on both sides is an error.
pub fn join(
    left: &Table,
    right: &Table,
    on: &[String],
    how: JoinType,
) -> Result<Table, TableError> {
    let left_keys: Vec<&Column> = on.iter().map(|n| left.column(n)).collect::<Result<_, _>>()?;
    let right_keys: Vec<&Column> = on.iter().map(|n| right.column(n)).collect::<Result<_, _>>()?;

    let right_payload: Vec<&Column> = right
        .columns()
        .iter()
        .filter(|c| !on.contains(&c.name))
        .collect();
    for column in &right_payload {
        if left.has_column(&column.name) {
            return Err(TableError::DuplicateColumn(column.name.clone()));
        }
    }

    let mut right_index: FxHashMap<Vec<KeyValue>, Vec<usize>> = FxHashMap::default();
    for row in 0..right.height() {
        right_index
            .entry(row_key(&right_keys, row))
            .or_default()
            .push(row);
    }

    // (left row, right row) pairs; None marks the null-filled side
    let mut pairs: Vec<(Option<usize>, Option<usize>)> = Vec::new();
    let mut right_matched = vec![false; right.height()];

    for row in 0..left.height() {
        match right_index.get(&row_key(&left_keys, row)) {
            Some(matches) => {
                for &r in matches {
                    right_matched[r] = true;
                    pairs.push((Some(row), Some(r)));
                }
            }
            None if how == JoinType::Outer => pairs.push((Some(row), None)),
            None => {}
        }
    }

    if how == JoinType::Outer {
        for (r, matched) in right_matched.iter().enumerate() {
            if !matched {
                pairs.push((None, Some(r)));
            }
        }
    }

    let mut columns = Vec::with_capacity(left.width() + right_payload.len());
    for column in left.columns() {
        let key_position = on.iter().position(|n| n == &column.name);
        let values: Vec<Value> = pairs
            .iter()
            .map(|&(l, r)| match (l, r, key_position) {
                (Some(l), _, _) => column.get(l),
                // right-only row: key columns come from the right side
                (None, Some(r), Some(k)) => right_keys[k].get(r),
                _ => Value::Null,
            })
            .collect();
        let data_type = match key_position {
            Some(k) => column
                .data_type()
                .unify(right_keys[k].data_type())
                .unwrap_or(column.data_type()),
            None => column.data_type(),
        };
        columns.push(Column::with_type(column.name.clone(), data_type, values)?);
    }
    for column in right_payload {
        let values: Vec<Value> = pairs
            .iter()
            .map(|&(_, r)| r.map_or(Value::Null, |r| column.get(r)))
            .collect();
        columns.push(Column::with_type(column.name.clone(), column.data_type(), values)?);
    }

    Table::new(columns)
}

/// Stacks tables vertically, matching columns by name.
/// Columns missing from a table are null-filled for its rows; the column
/// order is the order in which names are first seen. Int and Float columns
/// of the same name unify to Float, other type clashes are errors.
pub fn concat_diagonal(tables: &[Table]) -> Result<Table, TableError> {
    let mut layout: Vec<(String, DataType)> = Vec::new();
    for table in tables {
        for column in table.columns() {
            match layout.iter_mut().find(|(name, _)| name == &column.name) {
                Some((name, data_type)) => {
                    *data_type = data_type.unify(column.data_type()).ok_or_else(|| {
                        TableError::TypeMismatch {
                            column: name.clone(),
                            expected: *data_type,
                            found: column.data_type(),
                        }
                    })?;
                }
                None => layout.push((column.name.clone(), column.data_type())),
            }
        }
    }

    let total_rows: usize = tables.iter().map(Table::height).sum();
    let mut columns = Vec::with_capacity(layout.len());
    for (name, data_type) in layout {
        let mut values = Vec::with_capacity(total_rows);
        for table in tables {
            match table.column(&name) {
                Ok(column) => values.extend(column.values()),
                Err(_) => values.extend(std::iter::repeat(Value::Null).take(table.height())),
            }
        }
        columns.push(Column::with_type(name, data_type, values)?);
    }

    Table::new(columns)
}
