//! FILENAME: rollup-engine/src/validation.rs
//! PURPOSE: Eager checks of a configuration against the table it will run on.
//! CONTEXT: Everything that can be known before the first grouping pass is
//! checked here, so a run either fails up front or produces a full result.

use table_engine::{DataType, Table};

use crate::assemble::{TAG_NAMES, TAG_VALUES};
use crate::definition::{AggregationConfig, DimensionList, Operation, TotalScope};
use crate::error::{Result, RollupError};

impl AggregationConfig {
    /// Validates the configuration against `table`.
    pub fn validate(&self, table: &Table) -> Result<()> {
        if self.operations.is_empty() {
            return Err(RollupError::InvalidConfig("no operations configured".to_string()));
        }
        if self.dimensions_constant.is_empty() {
            return Err(RollupError::InvalidConfig(
                "dimensions_constant must contain at least one dimension list".to_string(),
            ));
        }

        check_lists("dimensions_constant", &self.dimensions_constant)?;
        if let Some(change) = &self.dimensions_change {
            check_lists("dimensions_change", change)?;
        }

        let constant = self.constant_columns();
        let overlap: Vec<String> = self
            .change_columns()
            .into_iter()
            .filter(|c| constant.contains(c))
            .collect();
        if !overlap.is_empty() {
            return Err(RollupError::OverlappingDimensions(overlap));
        }

        let dimensions = self.dimension_columns();
        for column in &dimensions {
            require_column(table, column, "a dimension list")?;
        }

        let mut aliases: Vec<String> = Vec::with_capacity(self.operations.len());
        for op in &self.operations {
            self.check_operation(table, op)?;

            let alias = op.alias();
            if dimensions.contains(&alias) || aliases.contains(&alias) {
                return Err(RollupError::DuplicateResultColumn(alias));
            }
            aliases.push(alias);
        }

        if self.dimensions_change.is_some() {
            for name in dimensions.iter().chain(aliases.iter()) {
                if name == TAG_NAMES || name == TAG_VALUES {
                    return Err(RollupError::ReservedColumn(name.clone()));
                }
            }
        }

        Ok(())
    }

    fn check_operation(&self, table: &Table, op: &Operation) -> Result<()> {
        let context = format!("operation {}", op.kind_name());
        let target = require_column(table, op.column(), &context)?;

        let numeric_required = match op {
            Operation::Standard { reduction, .. } | Operation::OfComplement { reduction, .. } => {
                reduction.aggregation_type(self.options.std).requires_numeric()
            }
            Operation::PercentOfTotalCategorical { .. } => false,
            Operation::PercentOfTotalNumeric { .. } => true,
        };
        if numeric_required && !target.is_numeric() {
            return Err(RollupError::NonNumericColumn {
                operation: op.kind_name(),
                column: op.column().to_string(),
            });
        }

        match op {
            Operation::OfComplement { of_complement, .. } => {
                check_list("of_complement", of_complement)?;
                for column in of_complement {
                    require_column(table, column, &format!("of_complement of {}", op.kind_name()))?;
                }
            }
            Operation::PercentOfTotalNumeric {
                column,
                of_total: TotalScope::Columns(of_total),
            } => {
                check_list("of_total", of_total)?;
                if of_total.contains(column) {
                    return Err(RollupError::TargetInOfTotal {
                        column: column.clone(),
                        of_total: of_total.clone(),
                    });
                }
                for c in of_total {
                    require_column(table, c, &format!("of_total of {}", op.kind_name()))?;
                }
            }
            _ => {}
        }

        Ok(())
    }
}

fn require_column(table: &Table, column: &str, context: &str) -> Result<DataType> {
    table
        .column(column)
        .map(|c| c.data_type())
        .map_err(|_| RollupError::UnknownColumn {
            column: column.to_string(),
            context: context.to_string(),
        })
}

fn check_lists(parameter: &str, lists: &[DimensionList]) -> Result<()> {
    for list in lists {
        check_list(parameter, list)?;
    }
    Ok(())
}

fn check_list(parameter: &str, list: &[String]) -> Result<()> {
    if list.is_empty() {
        return Err(RollupError::InvalidConfig(format!(
            "{} lists must name at least one column",
            parameter
        )));
    }
    for (i, column) in list.iter().enumerate() {
        if list[..i].contains(column) {
            return Err(RollupError::InvalidConfig(format!(
                "{} lists must not repeat a column (found '{}' twice in {:?})",
                parameter, column, list
            )));
        }
    }
    Ok(())
}
