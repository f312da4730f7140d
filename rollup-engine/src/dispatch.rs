//! FILENAME: rollup-engine/src/dispatch.rs
//! PURPOSE: Routes one operation on one grouping set to its reducer.
//! CONTEXT: Every reducer reads the same normalized table and key cache and
//! returns a per-group table (key columns + one metric column), or `None`
//! when the operation does not apply to the grouping set.

use std::ops::Range;

use table_engine::{aggregate, Column, DataType, Table, TableCache, Value};

use crate::complement::of_complement;
use crate::definition::{AggregationOptions, Operation, Reduction};
use crate::error::Result;
use crate::percent::{percent_of_total_categorical, percent_of_total_numeric};

/// Read-only state shared by every reducer during one run.
pub struct DispatchContext<'a> {
    pub table: &'a Table,
    pub cache: &'a TableCache,
    pub options: &'a AggregationOptions,
}

impl<'a> DispatchContext<'a> {
    pub fn new(table: &'a Table, cache: &'a TableCache, options: &'a AggregationOptions) -> Self {
        DispatchContext { table, cache, options }
    }

    /// Cache field indices of the named columns.
    pub fn fields(&self, columns: &[String]) -> Result<Vec<usize>> {
        Ok(self.cache.field_indices(columns)?)
    }

    pub fn all_rows(&self) -> Range<usize> {
        0..self.cache.row_count()
    }

    pub fn row_count(&self) -> usize {
        self.cache.row_count()
    }
}

/// Runs `op` over the grouping set `set`.
pub fn dispatch(
    ctx: &DispatchContext<'_>,
    set: &[String],
    op: &Operation,
) -> Result<Option<Table>> {
    let alias = op.alias();
    match op {
        Operation::Standard { column, reduction } => {
            standard(ctx, set, column, *reduction, &alias).map(Some)
        }
        Operation::OfComplement {
            column,
            reduction,
            of_complement: identity,
        } => of_complement(ctx, set, column, *reduction, identity, &alias),
        Operation::PercentOfTotalCategorical { column } => {
            percent_of_total_categorical(ctx, set, column, &alias)
        }
        Operation::PercentOfTotalNumeric { column, of_total } => {
            percent_of_total_numeric(ctx, set, column, of_total, &alias)
        }
    }
}

/// Groups the whole table by `set` and reduces `column` in every group.
fn standard(
    ctx: &DispatchContext<'_>,
    set: &[String],
    column: &str,
    reduction: Reduction,
    alias: &str,
) -> Result<Table> {
    let fields = ctx.fields(set)?;
    let target = ctx.table.column(column)?;
    let aggregation = reduction.aggregation_type(ctx.options.std);

    let mut out = ResultBuilder::new(
        ctx.table,
        set,
        alias,
        aggregation.output_type(target.data_type()),
    )?;
    for group in ctx.cache.group_rows(&fields, ctx.all_rows()) {
        let value = aggregate(target, &group.rows, aggregation)?;
        out.push(ctx.cache.key_values(&fields, &group.key), value);
    }
    out.finish()
}

// ============================================================================
// RESULT BUILDER
// ============================================================================

/// Collects result rows column-wise: the grouping key values, typed like
/// their source columns, followed by one metric column.
pub struct ResultBuilder {
    keys: Vec<(String, DataType, Vec<Value>)>,
    metric: (String, DataType, Vec<Value>),
}

impl ResultBuilder {
    pub fn new(
        table: &Table,
        key_columns: &[String],
        alias: &str,
        metric_type: DataType,
    ) -> Result<Self> {
        let keys = key_columns
            .iter()
            .map(|name| Ok((name.clone(), table.column(name)?.data_type(), Vec::new())))
            .collect::<Result<Vec<_>>>()?;
        Ok(ResultBuilder {
            keys,
            metric: (alias.to_string(), metric_type, Vec::new()),
        })
    }

    /// Appends a row. `key` holds one value per key column, in order.
    pub fn push(&mut self, key: Vec<Value>, metric: Value) {
        for ((_, _, values), value) in self.keys.iter_mut().zip(key) {
            values.push(value);
        }
        self.metric.2.push(metric);
    }

    pub fn len(&self) -> usize {
        self.metric.2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metric.2.is_empty()
    }

    pub fn finish(self) -> Result<Table> {
        let mut columns = Vec::with_capacity(self.keys.len() + 1);
        for (name, data_type, values) in self.keys {
            columns.push(Column::with_type(name, data_type, values)?);
        }
        let (alias, data_type, values) = self.metric;
        columns.push(Column::with_type(alias, data_type, values)?);
        Ok(Table::new(columns)?)
    }
}
