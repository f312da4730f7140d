//! FILENAME: rollup-engine/src/assemble.rs
//! PURPOSE: Merges operation results into one table per grouping set, tags
//! the rows and stacks all grouping sets.
//! CONTEXT: Results of one grouping set share its key columns, so they are
//! outer-joined on the columns they have in common. The tag columns record
//! which change dimensions produced each row.

use table_engine::{concat_diagonal, join, Column, JoinType, Table};

use crate::definition::DimensionList;
use crate::error::Result;

/// Comma-joined names of the change columns covered by a row's grouping set.
pub const TAG_NAMES: &str = "agg_dim$names";

/// Comma-joined values of the columns named in [`TAG_NAMES`].
pub const TAG_VALUES: &str = "agg_dim$values";

const TAG_SEPARATOR: &str = ",";

// ============================================================================
// PER GROUPING SET
// ============================================================================

/// Accumulates the operation results of one grouping set.
#[derive(Debug, Default)]
pub struct GroupingSetAssembler {
    merged: Option<Table>,
    merged_results: usize,
}

impl GroupingSetAssembler {
    pub fn new() -> Self {
        GroupingSetAssembler::default()
    }

    /// Merges one operation result. Rows missing on either side are kept
    /// and null-filled.
    pub fn add(&mut self, result: Table) -> Result<()> {
        self.merged = Some(match self.merged.take() {
            None => result,
            Some(accumulated) => {
                let on: Vec<String> = accumulated
                    .column_names()
                    .into_iter()
                    .filter(|c| result.has_column(c))
                    .map(String::from)
                    .collect();
                join(&accumulated, &result, &on, JoinType::Outer)?
            }
        });
        self.merged_results += 1;
        Ok(())
    }

    /// Number of results merged so far.
    pub fn merged_results(&self) -> usize {
        self.merged_results
    }

    /// The merged table, with tag columns when `tags` is given.
    /// `None` when every operation was skipped.
    pub fn finish(self, tags: Option<&[String]>) -> Result<Option<Table>> {
        let Some(merged) = self.merged else {
            return Ok(None);
        };
        match tags {
            Some(names) => Ok(Some(attach_tags(merged, names)?)),
            None => Ok(Some(merged)),
        }
    }
}

// ============================================================================
// TAGS
// ============================================================================

/// Sorted union of every change list wholly contained in `set`.
pub fn change_tag_names(set: &[String], change: &[DimensionList]) -> Vec<String> {
    let mut names: Vec<String> = change
        .iter()
        .filter(|list| list.iter().all(|c| set.contains(c)))
        .flatten()
        .cloned()
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Appends [`TAG_NAMES`] and [`TAG_VALUES`] to `table`.
/// With no names both tags are empty strings.
pub fn attach_tags(table: Table, names: &[String]) -> Result<Table> {
    let height = table.height();
    let joined_names = names.join(TAG_SEPARATOR);

    let columns = names
        .iter()
        .map(|n| table.column(n))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let values: Vec<Option<String>> = (0..height)
        .map(|row| {
            Some(
                columns
                    .iter()
                    .map(|c| c.get(row).display_value())
                    .collect::<Vec<_>>()
                    .join(TAG_SEPARATOR),
            )
        })
        .collect();

    let table = table
        .with_column(Column::new_text(TAG_NAMES, vec![Some(joined_names); height]))?
        .with_column(Column::new_text(TAG_VALUES, values))?;
    Ok(table)
}

// ============================================================================
// FINAL TABLE
// ============================================================================

/// Stacks grouping-set tables in order; absent columns are null-filled.
pub fn concat_results(tables: &[Table]) -> Result<Table> {
    if tables.is_empty() {
        return Ok(Table::empty());
    }
    Ok(concat_diagonal(tables)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_engine::Value;

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn means() -> Table {
        Table::from_rows(
            &["subject", "grade_mean"],
            vec![
                vec!["ECON".into(), Value::Float(92.0)],
                vec!["STAT".into(), Value::Float(97.0)],
            ],
        )
        .unwrap()
    }

    fn complements() -> Table {
        Table::from_rows(
            &["subject", "grade_mean_of_complement"],
            vec![
                vec!["STAT".into(), Value::Float(70.0)],
                vec!["PHIL".into(), Value::Float(80.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn results_merge_on_shared_keys() {
        let mut assembler = GroupingSetAssembler::new();
        assembler.add(means()).unwrap();
        assembler.add(complements()).unwrap();
        assert_eq!(assembler.merged_results(), 2);

        let merged = assembler.finish(None).unwrap().unwrap();
        assert_eq!(
            merged.column_names(),
            vec!["subject", "grade_mean", "grade_mean_of_complement"]
        );
        assert_eq!(merged.height(), 3);
        assert_eq!(merged.row(2), vec!["PHIL".into(), Value::Null, Value::Float(80.0)]);
    }

    #[test]
    fn rows_from_later_results_are_tagged() {
        let mut assembler = GroupingSetAssembler::new();
        assembler.add(means()).unwrap();
        assembler.add(complements()).unwrap();
        let names = strings(&["subject"]);
        let merged = assembler.finish(Some(&names)).unwrap().unwrap();

        assert_eq!(merged.value(2, TAG_NAMES).unwrap(), Value::from("subject"));
        assert_eq!(merged.value(2, TAG_VALUES).unwrap(), Value::from("PHIL"));
    }

    #[test]
    fn nothing_merged_contributes_nothing() {
        assert!(GroupingSetAssembler::new().finish(None).unwrap().is_none());
    }

    #[test]
    fn tag_names_cover_contained_change_lists() {
        let change = vec![strings(&["year"]), strings(&["subject"]), strings(&["subject", "year"])];
        assert_eq!(
            change_tag_names(&strings(&["name", "year", "subject"]), &change),
            vec!["subject", "year"]
        );
        assert_eq!(change_tag_names(&strings(&["name", "year"]), &change), vec!["year"]);
        assert!(change_tag_names(&strings(&["name"]), &change).is_empty());
    }

    #[test]
    fn tag_values_follow_sorted_names() {
        let table = Table::from_rows(
            &["year", "subject", "grade_mean"],
            vec![vec![Value::Int(2019), "ECON".into(), Value::Float(90.0)]],
        )
        .unwrap();
        let tagged = attach_tags(table, &strings(&["subject", "year"])).unwrap();
        assert_eq!(tagged.value(0, TAG_NAMES).unwrap(), Value::from("subject,year"));
        assert_eq!(tagged.value(0, TAG_VALUES).unwrap(), Value::from("ECON,2019"));

        let untagged = attach_tags(means(), &[]).unwrap();
        assert_eq!(untagged.value(0, TAG_NAMES).unwrap(), Value::from(""));
        assert_eq!(untagged.value(1, TAG_VALUES).unwrap(), Value::from(""));
    }

    #[test]
    fn concat_of_nothing_is_empty() {
        let table = concat_results(&[]).unwrap();
        assert_eq!(table.width(), 0);
        assert_eq!(table.height(), 0);
    }
}
