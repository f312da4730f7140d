//! FILENAME: rollup-engine/src/percent.rs
//! PURPOSE: Percent-of-total reducers.
//! CONTEXT: Both reducers divide a per-group quantity by a coarser total and
//! return a fraction (0.25, not 25). A zero total yields a missing share.

use log::trace;
use rustc_hash::FxHashMap;
use table_engine::{aggregate, AggregationType, Column, DataType, GroupKey, Table};

use crate::definition::TotalScope;
use crate::dispatch::{DispatchContext, ResultBuilder};
use crate::error::Result;

/// Positions of `columns` within `set`, or `None` if one is missing.
fn positions_in(set: &[String], columns: &[String]) -> Option<Vec<usize>> {
    columns.iter().map(|c| set.iter().position(|s| s == c)).collect()
}

fn project(key: &GroupKey, positions: &[usize]) -> GroupKey {
    positions.iter().map(|&p| key[p]).collect()
}

fn share(part: f64, total: f64) -> Option<f64> {
    (total != 0.0).then(|| part / total)
}

fn sum_of(column: &Column, rows: &[usize]) -> Result<f64> {
    Ok(aggregate(column, rows, AggregationType::Sum)?
        .as_f64()
        .unwrap_or(0.0))
}

// ============================================================================
// CATEGORICAL
// ============================================================================

/// Share of each group's row count within its parent group, where the parent
/// is the grouping set without `column`.
///
/// Skipped unless `column` is part of `set`.
pub fn percent_of_total_categorical(
    ctx: &DispatchContext<'_>,
    set: &[String],
    column: &str,
    alias: &str,
) -> Result<Option<Table>> {
    if !set.iter().any(|c| c == column) {
        trace!("{}: {} is not in grouping set {:?}, skipped", alias, column, set);
        return Ok(None);
    }

    let parent: Vec<String> = set.iter().filter(|c| *c != column).cloned().collect();
    let set_fields = ctx.fields(set)?;
    let parent_fields = ctx.fields(&parent)?;
    let parent_positions = positions_in(set, &parent).unwrap_or_default();

    let parent_counts: FxHashMap<GroupKey, usize> = ctx
        .cache
        .group_rows(&parent_fields, ctx.all_rows())
        .into_iter()
        .map(|g| (g.key, g.rows.len()))
        .collect();

    let mut out = ResultBuilder::new(ctx.table, set, alias, DataType::Float)?;
    for group in ctx.cache.group_rows(&set_fields, ctx.all_rows()) {
        let total = parent_counts
            .get(&project(&group.key, &parent_positions))
            .copied()
            .unwrap_or(0);
        let value = share(group.rows.len() as f64, total as f64);
        out.push(ctx.cache.key_values(&set_fields, &group.key), value.into());
    }
    Ok(Some(out.finish()?))
}

// ============================================================================
// NUMERIC
// ============================================================================

/// Share of each group's sum of `column` within the table total
/// ([`TotalScope::All`]) or within the sum of its `of_total` scope.
///
/// A scoped total is skipped unless every scope column is part of `set`.
pub fn percent_of_total_numeric(
    ctx: &DispatchContext<'_>,
    set: &[String],
    column: &str,
    of_total: &TotalScope,
    alias: &str,
) -> Result<Option<Table>> {
    let target = ctx.table.column(column)?;
    let set_fields = ctx.fields(set)?;
    let groups = ctx.cache.group_rows(&set_fields, ctx.all_rows());
    let mut out = ResultBuilder::new(ctx.table, set, alias, DataType::Float)?;

    match of_total {
        TotalScope::All => {
            let all: Vec<usize> = ctx.all_rows().collect();
            let total = sum_of(target, &all)?;
            for group in groups {
                let value = share(sum_of(target, &group.rows)?, total);
                out.push(ctx.cache.key_values(&set_fields, &group.key), value.into());
            }
        }
        TotalScope::Columns(scope) => {
            let Some(scope_positions) = positions_in(set, scope) else {
                trace!(
                    "{}: of_total {:?} is not within grouping set {:?}, skipped",
                    alias,
                    scope,
                    set
                );
                return Ok(None);
            };

            let scope_fields = ctx.fields(scope)?;
            let mut totals: FxHashMap<GroupKey, f64> = FxHashMap::default();
            for group in ctx.cache.group_rows(&scope_fields, ctx.all_rows()) {
                totals.insert(group.key, sum_of(target, &group.rows)?);
            }

            for group in groups {
                let total = totals
                    .get(&project(&group.key, &scope_positions))
                    .copied()
                    .unwrap_or(0.0);
                let value = share(sum_of(target, &group.rows)?, total);
                out.push(ctx.cache.key_values(&set_fields, &group.key), value.into());
            }
        }
    }

    Ok(Some(out.finish()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AggregationOptions;
    use table_engine::{TableCache, Value};

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn credits() -> Table {
        Table::from_rows(
            &["year", "term", "credits"],
            vec![
                vec!["2019".into(), "fall".into(), Value::Int(10)],
                vec!["2019".into(), "spring".into(), Value::Int(30)],
                vec!["2020".into(), "fall".into(), Value::Int(20)],
                vec!["2020".into(), "spring".into(), Value::Int(20)],
                vec!["2021".into(), "fall".into(), Value::Int(0)],
            ],
        )
        .unwrap()
    }

    fn with_ctx<R>(table: &Table, f: impl FnOnce(&DispatchContext<'_>) -> R) -> R {
        let cache = TableCache::build(table);
        let options = AggregationOptions::default();
        f(&DispatchContext::new(table, &cache, &options))
    }

    fn floats(table: &Table, column: &str) -> Vec<Option<f64>> {
        table.column(column).unwrap().values().iter().map(Value::as_f64).collect()
    }

    #[test]
    fn categorical_shares_of_the_whole_table() {
        let mut rows = Vec::new();
        for (subject, n) in [("ECON", 2), ("STAT", 3), ("PHIL", 5)] {
            for _ in 0..n {
                rows.push(vec![Value::from(subject)]);
            }
        }
        let table = Table::from_rows(&["subject"], rows).unwrap();
        let result = with_ctx(&table, |ctx| {
            percent_of_total_categorical(
                ctx,
                &strings(&["subject"]),
                "subject",
                "subject_percent_of_total_categorical",
            )
        })
        .unwrap()
        .unwrap();

        assert_eq!(
            floats(&result, "subject_percent_of_total_categorical"),
            vec![Some(0.2), Some(0.3), Some(0.5)]
        );
    }

    #[test]
    fn categorical_shares_within_the_parent() {
        let table = credits();
        let result = with_ctx(&table, |ctx| {
            percent_of_total_categorical(ctx, &strings(&["year", "term"]), "term", "term_pct")
        })
        .unwrap()
        .unwrap();
        assert_eq!(
            floats(&result, "term_pct"),
            vec![Some(0.5), Some(0.5), Some(0.5), Some(0.5), Some(1.0)]
        );
    }

    #[test]
    fn categorical_needs_the_target_in_the_set() {
        let table = credits();
        let result = with_ctx(&table, |ctx| {
            percent_of_total_categorical(ctx, &strings(&["year"]), "term", "term_pct")
        })
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn numeric_wildcard_sums_to_one() {
        let table = credits();
        let result = with_ctx(&table, |ctx| {
            percent_of_total_numeric(ctx, &strings(&["year"]), "credits", &TotalScope::All, "pct")
        })
        .unwrap()
        .unwrap();
        let shares = floats(&result, "pct");
        assert_eq!(shares, vec![Some(0.5), Some(0.5), Some(0.0)]);
        let total: f64 = shares.iter().flatten().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn numeric_scoped_by_year() {
        let table = credits();
        let scope = TotalScope::Columns(strings(&["year"]));
        let result = with_ctx(&table, |ctx| {
            percent_of_total_numeric(ctx, &strings(&["year", "term"]), "credits", &scope, "pct")
        })
        .unwrap()
        .unwrap();
        // 2021 has a zero total, so its share is missing.
        assert_eq!(
            floats(&result, "pct"),
            vec![Some(0.25), Some(0.75), Some(0.5), Some(0.5), None]
        );
    }

    #[test]
    fn numeric_scope_outside_the_set_is_skipped() {
        let table = credits();
        let scope = TotalScope::Columns(strings(&["term"]));
        let result = with_ctx(&table, |ctx| {
            percent_of_total_numeric(ctx, &strings(&["year"]), "credits", &scope, "pct")
        })
        .unwrap();
        assert!(result.is_none());
    }
}
