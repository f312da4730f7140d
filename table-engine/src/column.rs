//! FILENAME: table-engine/src/column.rs
//! PURPOSE: Typed, nullable column storage.
//! CONTEXT: Every column is either integer, float or text. Each slot is an
//! `Option`, so a missing integer stays an integer column with a hole in it
//! instead of being promoted to float.

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int,
    Float,
    Text,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }

    /// The type two columns unify to when they are stacked on top of each other.
    pub fn unify(self, other: DataType) -> Option<DataType> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (DataType::Int, DataType::Float) | (DataType::Float, DataType::Int) => {
                Some(DataType::Float)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

/// A named column of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new_int(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Int(values),
        }
    }

    pub fn new_float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Float(values),
        }
    }

    pub fn new_text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    /// Builds a column of a known type from loose values.
    /// Integers are widened when the target is float; anything else that
    /// does not fit the target type is an error.
    pub fn with_type(
        name: impl Into<String>,
        data_type: DataType,
        values: Vec<Value>,
    ) -> Result<Self, TableError> {
        let name = name.into();
        let mismatch = |found: DataType, name: &str| TableError::TypeMismatch {
            column: name.to_string(),
            expected: data_type,
            found,
        };

        let data = match data_type {
            DataType::Int => {
                let mut out = Vec::with_capacity(values.len());
                for value in values {
                    match value {
                        Value::Null => out.push(None),
                        Value::Int(n) => out.push(Some(n)),
                        Value::Float(_) => return Err(mismatch(DataType::Float, &name)),
                        Value::Text(_) => return Err(mismatch(DataType::Text, &name)),
                    }
                }
                ColumnData::Int(out)
            }
            DataType::Float => {
                let mut out = Vec::with_capacity(values.len());
                for value in values {
                    match value {
                        Value::Null => out.push(None),
                        Value::Int(n) => out.push(Some(n as f64)),
                        Value::Float(n) => out.push(Some(n)),
                        Value::Text(_) => return Err(mismatch(DataType::Text, &name)),
                    }
                }
                ColumnData::Float(out)
            }
            DataType::Text => {
                let mut out = Vec::with_capacity(values.len());
                for value in values {
                    match value {
                        Value::Null => out.push(None),
                        Value::Text(s) => out.push(Some(s)),
                        Value::Int(_) => return Err(mismatch(DataType::Int, &name)),
                        Value::Float(_) => return Err(mismatch(DataType::Float, &name)),
                    }
                }
                ColumnData::Text(out)
            }
        };

        Ok(Column { name, data })
    }

    /// Builds a column by inferring its type from the values.
    /// Mixed integers and floats become float; an all-missing column is text.
    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> Result<Self, TableError> {
        let name = name.into();
        let mut inferred: Option<DataType> = None;

        for value in &values {
            if let Some(found) = value.data_type() {
                inferred = match inferred {
                    None => Some(found),
                    Some(current) => Some(current.unify(found).ok_or_else(|| {
                        TableError::TypeMismatch {
                            column: name.clone(),
                            expected: current,
                            found,
                        }
                    })?),
                };
            }
        }

        Column::with_type(name, inferred.unwrap_or(DataType::Text), values)
    }

    pub fn data_type(&self) -> DataType {
        match &self.data {
            ColumnData::Int(_) => DataType::Int,
            ColumnData::Float(_) => DataType::Float,
            ColumnData::Text(_) => DataType::Text,
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value at `row`, or `Null` past the end.
    pub fn get(&self, row: usize) -> Value {
        match &self.data {
            ColumnData::Int(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Int),
            ColumnData::Float(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Float),
            ColumnData::Text(v) => v
                .get(row)
                .and_then(|s| s.as_ref())
                .map_or(Value::Null, |s| Value::Text(s.clone())),
        }
    }

    pub fn null_count(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Float(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Returns all values in row order.
    pub fn values(&self) -> Vec<Value> {
        (0..self.len()).map(|row| self.get(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_widens_ints_to_float() {
        let values = vec![Value::Int(1), Value::Null, Value::Float(2.5)];
        let col = Column::from_values("v", values).unwrap();
        assert_eq!(col.data_type(), DataType::Float);
        assert_eq!(col.values(), vec![Value::Float(1.0), Value::Null, Value::Float(2.5)]);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn from_values_rejects_text_mixed_with_numbers() {
        let err = Column::from_values("v", vec![Value::Int(1), Value::from("a")]).unwrap_err();
        assert!(matches!(err, TableError::TypeMismatch { .. }));
    }

    #[test]
    fn all_null_column_defaults_to_text() {
        let col = Column::from_values("v", vec![Value::Null, Value::Null]).unwrap();
        assert_eq!(col.data_type(), DataType::Text);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn int_and_text_do_not_unify() {
        assert_eq!(DataType::Int.unify(DataType::Float), Some(DataType::Float));
        assert_eq!(DataType::Text.unify(DataType::Int), None);
    }
}
