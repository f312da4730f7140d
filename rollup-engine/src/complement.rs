//! FILENAME: rollup-engine/src/complement.rs
//! PURPOSE: `<reduction>_of_complement` - reductions over everyone else.
//! CONTEXT: An identity is one distinct combination of the `of_complement`
//! columns. For each identity the reducer sees every row that does NOT
//! belong to it, optionally broken down further by the remaining grouping
//! columns. Rows are selected by index; no marker column is added to the
//! table.

use log::trace;
use table_engine::{aggregate, GroupKey, Table};

use crate::definition::Reduction;
use crate::dispatch::{DispatchContext, ResultBuilder};
use crate::error::Result;
use crate::parallel::try_map_ordered;

/// Where a grouping-set column takes its key value from.
#[derive(Debug, Clone, Copy)]
enum KeySource {
    /// Position within the identity key.
    Identity(usize),
    /// Position within the breakdown key.
    Rest(usize),
}

/// Computes `reduction` of `column` over each identity's complement.
///
/// Returns `None` when some `of_complement` column is not part of `set`,
/// or when nothing survives the existence filter.
pub fn of_complement(
    ctx: &DispatchContext<'_>,
    set: &[String],
    column: &str,
    reduction: Reduction,
    identity_columns: &[String],
    alias: &str,
) -> Result<Option<Table>> {
    if !identity_columns.iter().all(|c| set.contains(c)) {
        trace!(
            "{}: of_complement {:?} is not within grouping set {:?}, skipped",
            alias,
            identity_columns,
            set
        );
        return Ok(None);
    }

    let set_fields = ctx.fields(set)?;
    let identity_fields = ctx.fields(identity_columns)?;
    let rest_columns: Vec<String> = set
        .iter()
        .filter(|c| !identity_columns.contains(c))
        .cloned()
        .collect();
    let rest_fields = ctx.fields(&rest_columns)?;
    let simple = rest_columns.is_empty();

    let layout: Vec<KeySource> = set
        .iter()
        .map(|c| match identity_columns.iter().position(|i| i == c) {
            Some(p) => KeySource::Identity(p),
            None => KeySource::Rest(rest_columns.iter().position(|r| r == c).unwrap_or(0)),
        })
        .collect();

    let identities = ctx.cache.group_rows(&identity_fields, ctx.all_rows());
    let mut identity_of_row = vec![0usize; ctx.row_count()];
    for (i, identity) in identities.iter().enumerate() {
        for &row in &identity.rows {
            identity_of_row[row] = i;
        }
    }

    let target = ctx.table.column(column)?;
    let aggregation = reduction.aggregation_type(ctx.options.std);
    let indexed: Vec<(usize, &GroupKey)> = identities.iter().map(|g| &g.key).enumerate().collect();

    let per_identity = try_map_ordered(ctx.options.parallel, &indexed, |&(i, identity_key)| {
        let complement: Vec<usize> = ctx.all_rows().filter(|&r| identity_of_row[r] != i).collect();

        if simple {
            let value = aggregate(target, &complement, aggregation)?;
            return Ok(vec![(assemble_key(&layout, identity_key, &GroupKey::new()), value)]);
        }

        let mut rows = Vec::new();
        for group in ctx.cache.group_rows(&rest_fields, complement) {
            let value = aggregate(target, &group.rows, aggregation)?;
            rows.push((assemble_key(&layout, identity_key, &group.key), value));
        }
        Ok(rows)
    })?;

    // Breakdown rows are synthesized by pairing an identity with another
    // identity's values; only combinations present in the table are kept.
    let existing = if simple {
        None
    } else {
        Some(ctx.cache.distinct_keys(&set_fields))
    };

    let metric_type = aggregation.output_type(target.data_type());
    let mut out = ResultBuilder::new(ctx.table, set, alias, metric_type)?;
    for (key, value) in per_identity.into_iter().flatten() {
        if existing.as_ref().is_some_and(|keys| !keys.contains(&key)) {
            continue;
        }
        out.push(ctx.cache.key_values(&set_fields, &key), value);
    }

    if out.is_empty() {
        trace!("{}: no rows for grouping set {:?}, skipped", alias, set);
        return Ok(None);
    }
    Ok(Some(out.finish()?))
}

/// Builds a full grouping-set key from identity and breakdown ids.
fn assemble_key(layout: &[KeySource], identity: &GroupKey, rest: &GroupKey) -> GroupKey {
    layout
        .iter()
        .map(|source| match *source {
            KeySource::Identity(p) => identity[p],
            KeySource::Rest(p) => rest[p],
        })
        .collect()
}
