//! FILENAME: rollup-engine/src/lib.rs
//! Rollup Engine - many grouped aggregate views of one table, in one result.
//!
//! A configuration names operations (reductions, complement reductions and
//! percent-of-total shares) and the dimension lists to group by. The engine
//! expands the lists into grouping sets, runs every operation on every
//! grouping set and stacks the per-set results into a single wide table.
//!
//! Layers:
//! - `definition` / `validation`: the serializable configuration (WHAT to compute)
//! - `grouping` / `normalize`: grouping sets and dimension clean-up
//! - `dispatch` / `complement` / `percent`: the reducers (HOW a set is computed)
//! - `assemble` / `engine`: merging, tagging and the `execute` entry point

pub mod assemble;
pub mod complement;
pub mod definition;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod normalize;
pub mod parallel;
pub mod percent;
pub mod validation;

pub use assemble::{TAG_NAMES, TAG_VALUES};
pub use definition::{
    AggregationConfig, AggregationOptions, DimensionList, OfTotalSpec, Operation, OperationSpec,
    Reduction, StdConvention, TotalScope,
};
pub use engine::{execute, RollupCalculator};
pub use error::{Result, RollupError};
pub use grouping::grouping_sets;
pub use normalize::{normalize_dimension, normalize_dimensions, PLACEHOLDER};
