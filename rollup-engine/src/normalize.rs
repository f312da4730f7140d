//! FILENAME: rollup-engine/src/normalize.rs
//! PURPOSE: Rewrites missing dimension values to a visible placeholder.
//! CONTEXT: Grouping keeps missing keys, but reports need a label for them.
//! A column with holes becomes text; numbers are rendered through
//! `Value::display_value`, so an integral float id reads `332674`, never
//! `332674.0`.

use table_engine::{Column, Table, Value};

use crate::error::Result;

/// Label written in place of a missing dimension value.
pub const PLACEHOLDER: &str = "(no value)";

/// Replaces every missing value of `column` in `table` with [`PLACEHOLDER`].
/// Columns without missing values are left untouched.
pub fn normalize_dimension(table: &mut Table, column: &str) -> Result<()> {
    let source = table.column(column)?;
    if source.null_count() == 0 {
        return Ok(());
    }

    let rendered: Vec<Option<String>> = source
        .values()
        .into_iter()
        .map(|value| match value {
            Value::Null => Some(PLACEHOLDER.to_string()),
            other => Some(other.display_value()),
        })
        .collect();

    table.replace_column(Column::new_text(column, rendered))?;
    Ok(())
}

/// Normalizes every listed column.
pub fn normalize_dimensions(table: &mut Table, columns: &[String]) -> Result<()> {
    for column in columns {
        normalize_dimension(table, column)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_engine::DataType;

    #[test]
    fn float_ids_lose_the_fraction() {
        let id = Column::new_float("id", vec![Some(1.0), None, Some(3.0)]);
        let mut table = Table::new(vec![id]).unwrap();
        normalize_dimension(&mut table, "id").unwrap();

        let column = table.column("id").unwrap();
        assert_eq!(column.data_type(), DataType::Text);
        assert_eq!(
            column.values(),
            vec![Value::from("1"), Value::from(PLACEHOLDER), Value::from("3")]
        );
    }

    #[test]
    fn only_the_trailing_zero_fraction_is_dropped() {
        let id = Column::new_float("id", vec![Some(10.0), Some(2.5), None]);
        let mut table = Table::new(vec![id]).unwrap();
        normalize_dimension(&mut table, "id").unwrap();
        assert_eq!(table.value(0, "id").unwrap(), Value::from("10"));
        assert_eq!(table.value(1, "id").unwrap(), Value::from("2.5"));
    }

    #[test]
    fn text_and_int_columns() {
        let mut table = Table::new(vec![
            Column::new_text("subject", vec![Some("ECON".into()), None]),
            Column::new_int("year", vec![Some(2019), None]),
        ])
        .unwrap();
        normalize_dimensions(&mut table, &["subject".to_string(), "year".to_string()]).unwrap();
        assert_eq!(table.row(1), vec![Value::from(PLACEHOLDER), Value::from(PLACEHOLDER)]);
        assert_eq!(table.value(0, "year").unwrap(), Value::from("2019"));
    }

    #[test]
    fn complete_columns_keep_their_type() {
        let year = Column::new_int("year", vec![Some(2019), Some(2020)]);
        let mut table = Table::new(vec![year]).unwrap();
        normalize_dimension(&mut table, "year").unwrap();
        assert_eq!(table.column("year").unwrap().data_type(), DataType::Int);
    }

    #[test]
    fn unknown_column_fails() {
        let mut table = Table::new(vec![Column::new_int("year", vec![Some(2019)])]).unwrap();
        assert!(normalize_dimension(&mut table, "term").is_err());
    }
}
