//! FILENAME: table-engine/src/table.rs
//! PURPOSE: The tabular dataset: ordered, uniquely named columns of equal length.
//! CONTEXT: Tables are values. Operations that reshape data return a new
//! table; the only in-place edits are whole-column replacements on a table
//! the caller owns.

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::TableError;
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Column>", into = "Vec<Column>")]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Creates a table, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let expected = columns.first().map_or(0, Column::len);
        for (i, column) in columns.iter().enumerate() {
            if column.len() != expected {
                return Err(TableError::LengthMismatch {
                    name: column.name.clone(),
                    expected,
                    actual: column.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Table { columns })
    }

    /// Creates a table with no columns and no rows.
    pub fn empty() -> Self {
        Table::default()
    }

    /// Builds a table from row-major data, inferring each column's type.
    pub fn from_rows(names: &[&str], rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        let mut buffers: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(TableError::RowWidthMismatch {
                    row: row_idx,
                    expected: names.len(),
                    actual: row.len(),
                });
            }
            for (buffer, value) in buffers.iter_mut().zip(row) {
                buffer.push(value);
            }
        }

        let columns = names
            .iter()
            .zip(buffers)
            .map(|(name, values)| Column::from_values(*name, values))
            .collect::<Result<Vec<_>, _>>()?;
        Table::new(columns)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<&Column, TableError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    /// Returns the value of `name` at `row`.
    pub fn value(&self, row: usize, name: &str) -> Result<Value, TableError> {
        Ok(self.column(name)?.get(row))
    }

    /// Returns one row as values in column order.
    pub fn row(&self, row: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.get(row)).collect()
    }

    /// Appends a column. Fails if the name is taken or the length differs.
    pub fn with_column(mut self, column: Column) -> Result<Self, TableError> {
        if self.has_column(&column.name) {
            return Err(TableError::DuplicateColumn(column.name));
        }
        let actual = column.len();
        if !self.columns.is_empty() && actual != self.height() {
            return Err(TableError::LengthMismatch {
                name: column.name,
                expected: self.height(),
                actual,
            });
        }
        self.columns.push(column);
        Ok(self)
    }

    /// Swaps in a new version of an existing column, keeping its position.
    pub fn replace_column(&mut self, column: Column) -> Result<(), TableError> {
        let height = self.height();
        let idx = self
            .column_index(&column.name)
            .ok_or_else(|| TableError::ColumnNotFound(column.name.clone()))?;
        let actual = column.len();
        if actual != height {
            return Err(TableError::LengthMismatch {
                name: column.name,
                expected: height,
                actual,
            });
        }
        self.columns[idx] = column;
        Ok(())
    }
}

impl TryFrom<Vec<Column>> for Table {
    type Error = TableError;

    fn try_from(columns: Vec<Column>) -> Result<Self, Self::Error> {
        Table::new(columns)
    }
}

impl From<Table> for Vec<Column> {
    fn from(table: Table) -> Self {
        table.columns
    }
}
