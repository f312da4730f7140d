//! FILENAME: table-engine/src/lib.rs
//! In-memory tabular data for Rollup.
//!
//! This crate provides the columnar primitives the aggregation engine
//! delegates to: typed nullable columns, tables, an interned key cache for
//! grouping, reducers, equi-joins and diagonal concatenation.
//!
//! Layers:
//! - `value` / `column` / `table`: the data model (WHAT is stored)
//! - `cache`: interned keys and grouping (HOW rows are bucketed)
//! - `aggregate`: reducers over a set of rows
//! - `join`: combining tables by key or by stacking

pub mod aggregate;
pub mod cache;
pub mod column;
pub mod error;
pub mod join;
pub mod table;
pub mod value;

pub use aggregate::{aggregate, AggregateAccumulator, AggregationType};
pub use cache::{FieldCache, Group, GroupKey, TableCache, ValueId, VALUE_ID_NULL};
pub use column::{Column, ColumnData, DataType};
pub use error::TableError;
pub use join::{concat_diagonal, join, JoinType};
pub use table::Table;
pub use value::{KeyValue, OrderedFloat, Value};
