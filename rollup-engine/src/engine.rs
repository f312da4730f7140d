//! FILENAME: rollup-engine/src/engine.rs
//! Rollup Engine - runs an AggregationConfig against a Table.
//!
//! Algorithm:
//! 1. Validate the configuration against the input table
//! 2. Clone the table and fill missing dimension values with the placeholder
//! 3. Build the key cache once; every reducer groups through it
//! 4. For each grouping set, dispatch every operation and merge the results
//! 5. Tag each grouping set's rows, then stack all grouping sets

use std::time::Instant;

use log::{debug, info, trace};
use table_engine::{Table, TableCache};

use crate::assemble::{change_tag_names, concat_results, GroupingSetAssembler};
use crate::definition::{AggregationConfig, DimensionList};
use crate::dispatch::{dispatch, DispatchContext};
use crate::error::Result;
use crate::normalize::normalize_dimensions;
use crate::parallel::{parallel_available, try_map_ordered};

// ============================================================================
// ROLLUP CALCULATOR
// ============================================================================

/// Executes one configuration over one normalized table.
pub struct RollupCalculator<'a> {
    config: &'a AggregationConfig,

    /// Private, normalized copy of the input.
    table: Table,

    /// Interned keys of `table`.
    cache: TableCache,

    /// Grouping sets in execution (and output) order.
    grouping_sets: Vec<DimensionList>,
}

impl<'a> RollupCalculator<'a> {
    /// Validates `config` and prepares the working copy of `table`.
    pub fn new(config: &'a AggregationConfig, table: &Table) -> Result<Self> {
        config.validate(table)?;

        let mut working = table.clone();
        normalize_dimensions(&mut working, &config.dimension_columns())?;
        let cache = TableCache::build(&working);

        Ok(RollupCalculator {
            config,
            table: working,
            cache,
            grouping_sets: config.grouping_sets(),
        })
    }

    pub fn grouping_sets(&self) -> &[DimensionList] {
        &self.grouping_sets
    }

    /// Runs every grouping set and returns the stacked result.
    pub fn calculate(&self) -> Result<Table> {
        let ctx = DispatchContext::new(&self.table, &self.cache, &self.config.options);

        let per_set = try_map_ordered(self.config.options.parallel, &self.grouping_sets, |set| {
            self.calculate_set(&ctx, set)
        })?;
        let tables: Vec<Table> = per_set.into_iter().flatten().collect();

        concat_results(&tables)
    }

    /// Dispatches every operation on one grouping set and merges the results.
    fn calculate_set(&self, ctx: &DispatchContext<'_>, set: &[String]) -> Result<Option<Table>> {
        let mut assembler = GroupingSetAssembler::new();
        for op in &self.config.operations {
            match dispatch(ctx, set, op)? {
                Some(result) => assembler.add(result)?,
                None => trace!("ROLLUP skip op={} set={:?}", op.alias(), set),
            }
        }

        let merged = assembler.merged_results();
        let tags = self
            .config
            .dimensions_change
            .as_deref()
            .map(|change| change_tag_names(set, change));
        let table = assembler.finish(tags.as_deref())?;

        debug!(
            "ROLLUP set={:?} merged={} rows={}",
            set,
            merged,
            table.as_ref().map_or(0, Table::height)
        );
        Ok(table)
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Computes every configured aggregate view of `table` and returns them as
/// one stacked table. This is the main entry point of the crate.
///
/// The caller's table is never modified. Fatal errors abort the whole run;
/// operations that do not apply to a grouping set just contribute no rows.
pub fn execute(config: &AggregationConfig, table: &Table) -> Result<Table> {
    let started = Instant::now();
    debug!(
        "ROLLUP config operations={} constant={:?} change={:?} std={:?} parallel={}",
        config.operations.len(),
        config.dimensions_constant,
        config.dimensions_change,
        config.options.std,
        config.options.parallel && parallel_available()
    );

    let calculator = RollupCalculator::new(config, table)?;
    let result = calculator.calculate()?;

    info!(
        "ROLLUP done input_rows={} grouping_sets={} output_rows={} output_columns={} elapsed={:?}",
        table.height(),
        calculator.grouping_sets().len(),
        result.height(),
        result.width(),
        started.elapsed()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Operation, Reduction};
    use crate::normalize::PLACEHOLDER;
    use table_engine::Value;

    fn grades() -> Table {
        Table::from_rows(
            &["name", "subject", "grade"],
            vec![
                vec!["John".into(), "ECON".into(), Value::Int(90)],
                vec!["John".into(), Value::Null, Value::Int(94)],
            ],
        )
        .unwrap()
    }

    fn lists(raw: &[&[&str]]) -> Vec<DimensionList> {
        raw.iter()
            .map(|l| l.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn input_table_is_not_modified() {
        let table = grades();
        let config = AggregationConfig::new(
            vec![Operation::standard("grade", Reduction::Mean)],
            lists(&[&["subject"]]),
            None,
        );
        let result = execute(&config, &table).unwrap();

        assert_eq!(table, grades());
        assert_eq!(result.value(1, "subject").unwrap(), Value::from(PLACEHOLDER));
    }

    #[test]
    fn no_change_dimensions_means_no_tags() {
        let config = AggregationConfig::new(
            vec![Operation::standard("grade", Reduction::Max)],
            lists(&[&["name"]]),
            None,
        );
        let result = execute(&config, &grades()).unwrap();
        assert_eq!(result.column_names(), vec!["name", "grade_max"]);
        assert_eq!(result.row(0), vec!["John".into(), Value::Int(94)]);
    }

    #[test]
    fn all_skipped_gives_an_empty_table() {
        let config = AggregationConfig::new(
            vec![Operation::of_complement("grade", Reduction::Mean, &["subject"])],
            lists(&[&["name"]]),
            None,
        );
        let result = execute(&config, &grades()).unwrap();
        assert_eq!(result.width(), 0);
        assert_eq!(result.height(), 0);
    }

    #[test]
    fn invalid_configuration_fails_before_running() {
        let config = AggregationConfig::new(
            vec![Operation::standard("grade", Reduction::Mean)],
            lists(&[&["term"]]),
            None,
        );
        assert!(RollupCalculator::new(&config, &grades()).is_err());
    }
}
