//! FILENAME: table-engine/src/aggregate.rs
//! PURPOSE: Column reducers applied to a set of rows.
//! CONTEXT: Counts cover every row, missing values included; `CountDistinct`
//! treats missing as one more distinct value. The other reducers skip
//! missing values. Numeric reducers run through `AggregateAccumulator`;
//! min/max also work on text.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::column::{Column, ColumnData, DataType};
use crate::error::TableError;
use crate::value::{KeyValue, Value};

/// Supported reductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    Count,
    CountDistinct,
    Max,
    Mean,
    Median,
    Min,
    /// Sample standard deviation (n - 1).
    StdDev,
    /// Population standard deviation (n).
    StdDevP,
    Sum,
}

impl AggregationType {
    pub fn requires_numeric(self) -> bool {
        matches!(
            self,
            AggregationType::Mean
                | AggregationType::Median
                | AggregationType::StdDev
                | AggregationType::StdDevP
                | AggregationType::Sum
        )
    }

    /// Type of the reduced value for an input column of `input` type.
    pub fn output_type(self, input: DataType) -> DataType {
        match self {
            AggregationType::Count | AggregationType::CountDistinct => DataType::Int,
            AggregationType::Max | AggregationType::Min | AggregationType::Sum => input,
            AggregationType::Mean
            | AggregationType::Median
            | AggregationType::StdDev
            | AggregationType::StdDevP => DataType::Float,
        }
    }
}

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Accumulator for the numeric reductions.
#[derive(Debug, Clone, Default)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Sum of squared differences from the mean (Welford's algorithm).
    pub m2: f64,
    pub mean: f64,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator::default()
    }

    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));

        let delta = value - self.mean;
        self.mean += delta / (self.count as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Standard deviation with `ddof` delta degrees of freedom.
    /// `None` when there are not more values than `ddof`.
    pub fn std_dev(&self, ddof: u64) -> Option<f64> {
        if self.count <= ddof {
            return None;
        }
        Some((self.m2 / (self.count - ddof) as f64).sqrt())
    }

    /// Computes a float reduction. Count-like reductions are handled by the caller.
    pub fn compute(&self, aggregation: AggregationType) -> Value {
        let result = match aggregation {
            AggregationType::Sum => Some(self.sum),
            AggregationType::Count | AggregationType::CountDistinct => Some(self.count as f64),
            AggregationType::Mean => (self.count > 0).then(|| self.sum / self.count as f64),
            AggregationType::Min => self.min,
            AggregationType::Max => self.max,
            AggregationType::StdDev => self.std_dev(1),
            AggregationType::StdDevP => self.std_dev(0),
            // needs the full sample
            AggregationType::Median => None,
        };
        result.map_or(Value::Null, Value::Float)
    }
}

// ============================================================================
// REDUCTION
// ============================================================================

/// Reduces `column` over `rows`.
pub fn aggregate(
    column: &Column,
    rows: &[usize],
    aggregation: AggregationType,
) -> Result<Value, TableError> {
    if aggregation.requires_numeric() && !column.data_type().is_numeric() {
        return Err(TableError::NonNumeric {
            column: column.name.clone(),
            aggregation: format!("{:?}", aggregation),
        });
    }

    match aggregation {
        AggregationType::Count => Ok(Value::Int(rows.len() as i64)),
        AggregationType::CountDistinct => {
            let distinct: FxHashSet<KeyValue> =
                rows.iter().map(|&r| KeyValue::from(&column.get(r))).collect();
            Ok(Value::Int(distinct.len() as i64))
        }
        AggregationType::Median => Ok(median(column, rows)),
        _ => match &column.data {
            ColumnData::Int(values) => reduce_int(&column.name, values, rows, aggregation),
            ColumnData::Float(values) => {
                let mut acc = AggregateAccumulator::new();
                for n in rows.iter().filter_map(|&r| values.get(r).copied().flatten()) {
                    acc.add_number(n);
                }
                Ok(acc.compute(aggregation))
            }
            ColumnData::Text(values) => Ok(reduce_text(values, rows, aggregation)),
        },
    }
}

/// Integer columns keep integer results for sum/min/max.
fn reduce_int(
    name: &str,
    values: &[Option<i64>],
    rows: &[usize],
    aggregation: AggregationType,
) -> Result<Value, TableError> {
    let mut present = rows.iter().filter_map(|&r| values.get(r).copied().flatten());
    let value = match aggregation {
        AggregationType::Sum => {
            let sum = present.try_fold(0i64, i64::checked_add).ok_or_else(|| {
                TableError::Overflow {
                    column: name.to_string(),
                }
            })?;
            Value::Int(sum)
        }
        AggregationType::Min => present.min().map_or(Value::Null, Value::Int),
        AggregationType::Max => present.max().map_or(Value::Null, Value::Int),
        _ => {
            let mut acc = AggregateAccumulator::new();
            for n in present {
                acc.add_number(n as f64);
            }
            acc.compute(aggregation)
        }
    };
    Ok(value)
}

fn reduce_text(values: &[Option<String>], rows: &[usize], aggregation: AggregationType) -> Value {
    let present = rows.iter().filter_map(|&r| values.get(r).and_then(|s| s.as_deref()));
    let picked = match aggregation {
        AggregationType::Min => present.min(),
        AggregationType::Max => present.max(),
        _ => None,
    };
    picked.map_or(Value::Null, |s| Value::Text(s.to_string()))
}

fn median(column: &Column, rows: &[usize]) -> Value {
    let mut sample: Vec<f64> = rows.iter().filter_map(|&r| column.get(r).as_f64()).collect();
    if sample.is_empty() {
        return Value::Null;
    }
    sample.sort_by(f64::total_cmp);
    let mid = sample.len() / 2;
    let median = if sample.len() % 2 == 0 {
        (sample[mid - 1] + sample[mid]) / 2.0
    } else {
        sample[mid]
    };
    Value::Float(median)
}
