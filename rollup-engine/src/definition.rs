//! FILENAME: rollup-engine/src/definition.rs
//! Rollup Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE an aggregation run.
//! These structures are designed to be:
//! - Serializable (loaded from JSON by callers)
//! - Resolved once: operation names become enum variants at parse time
//! - Immutable snapshots, executed exactly once by `execute`

use serde::{Deserialize, Serialize};
use table_engine::AggregationType;

use crate::error::{Result, RollupError};
use crate::grouping::grouping_sets;

/// One grouping key: an ordered list of column names.
pub type DimensionList = Vec<String>;

// ============================================================================
// REDUCTIONS
// ============================================================================

/// The standard reductions, also usable relative to a complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    Count,
    CountDistinct,
    Max,
    Mean,
    Median,
    Min,
    Std,
    Sum,
}

impl Reduction {
    pub const ALL: [Reduction; 8] = [
        Reduction::Count,
        Reduction::CountDistinct,
        Reduction::Max,
        Reduction::Mean,
        Reduction::Median,
        Reduction::Min,
        Reduction::Std,
        Reduction::Sum,
    ];

    /// The operation name used on the wire and in result column aliases.
    pub fn name(self) -> &'static str {
        match self {
            Reduction::Count => "count",
            Reduction::CountDistinct => "count_distinct",
            Reduction::Max => "max",
            Reduction::Mean => "mean",
            Reduction::Median => "median",
            Reduction::Min => "min",
            Reduction::Std => "std",
            Reduction::Sum => "sum",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Reduction::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Maps to the table-engine reducer, resolving the std convention.
    pub fn aggregation_type(self, std: StdConvention) -> AggregationType {
        match self {
            Reduction::Count => AggregationType::Count,
            Reduction::CountDistinct => AggregationType::CountDistinct,
            Reduction::Max => AggregationType::Max,
            Reduction::Mean => AggregationType::Mean,
            Reduction::Median => AggregationType::Median,
            Reduction::Min => AggregationType::Min,
            Reduction::Std => match std {
                StdConvention::Sample => AggregationType::StdDev,
                StdConvention::Population => AggregationType::StdDevP,
            },
            Reduction::Sum => AggregationType::Sum,
        }
    }
}

/// Degrees of freedom used by the `std` reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StdConvention {
    /// Divide by n - 1.
    #[default]
    Sample,
    /// Divide by n.
    Population,
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Denominator of a numeric percent-of-total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotalScope {
    /// The whole table (`"*"`).
    All,
    /// Sums grouped by these columns.
    Columns(Vec<String>),
}

/// `of_total` as written in a configuration: `"*"`, `["*"]` or a column list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OfTotalSpec {
    Single(String),
    List(Vec<String>),
}

/// The wire form of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub operation: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of_complement: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of_total: Option<OfTotalSpec>,
}

const OF_COMPLEMENT_SUFFIX: &str = "_of_complement";
const PERCENT_OF_TOTAL_CATEGORICAL: &str = "percent_of_total_categorical";
const PERCENT_OF_TOTAL_NUMERIC: &str = "percent_of_total_numeric";

/// A resolved operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OperationSpec", into = "OperationSpec")]
pub enum Operation {
    /// One of the standard reductions over each group.
    Standard { column: String, reduction: Reduction },

    /// A reduction over every row that does NOT belong to the group's identity.
    OfComplement {
        column: String,
        reduction: Reduction,
        of_complement: Vec<String>,
    },

    /// Share of the group's row count within its parent group.
    PercentOfTotalCategorical { column: String },

    /// Share of the group's sum of `column` within a total.
    PercentOfTotalNumeric { column: String, of_total: TotalScope },
}

impl Operation {
    pub fn standard(column: impl Into<String>, reduction: Reduction) -> Self {
        Operation::Standard {
            column: column.into(),
            reduction,
        }
    }

    pub fn of_complement(
        column: impl Into<String>,
        reduction: Reduction,
        of_complement: &[&str],
    ) -> Self {
        Operation::OfComplement {
            column: column.into(),
            reduction,
            of_complement: of_complement.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn percent_of_total_categorical(column: impl Into<String>) -> Self {
        Operation::PercentOfTotalCategorical { column: column.into() }
    }

    pub fn percent_of_total_numeric(column: impl Into<String>, of_total: TotalScope) -> Self {
        Operation::PercentOfTotalNumeric {
            column: column.into(),
            of_total,
        }
    }

    /// The column the operation measures.
    pub fn column(&self) -> &str {
        match self {
            Operation::Standard { column, .. }
            | Operation::OfComplement { column, .. }
            | Operation::PercentOfTotalCategorical { column }
            | Operation::PercentOfTotalNumeric { column, .. } => column,
        }
    }

    /// The operation name, e.g. `mean` or `mean_of_complement`.
    pub fn kind_name(&self) -> String {
        match self {
            Operation::Standard { reduction, .. } => reduction.name().to_string(),
            Operation::OfComplement { reduction, .. } => {
                format!("{}{}", reduction.name(), OF_COMPLEMENT_SUFFIX)
            }
            Operation::PercentOfTotalCategorical { .. } => PERCENT_OF_TOTAL_CATEGORICAL.to_string(),
            Operation::PercentOfTotalNumeric { .. } => PERCENT_OF_TOTAL_NUMERIC.to_string(),
        }
    }

    /// Name of the result column: `<column>_<operation>`, with each scoped
    /// `of_total` column appended for numeric percent-of-total.
    pub fn alias(&self) -> String {
        let mut alias = format!("{}_{}", self.column(), self.kind_name());
        if let Operation::PercentOfTotalNumeric {
            of_total: TotalScope::Columns(columns),
            ..
        } = self
        {
            for column in columns {
                alias.push('_');
                alias.push_str(column);
            }
        }
        alias
    }
}

impl TryFrom<OperationSpec> for Operation {
    type Error = RollupError;

    fn try_from(spec: OperationSpec) -> Result<Self> {
        let OperationSpec {
            operation,
            column,
            of_complement,
            of_total,
        } = spec;

        if let Some(prefix) = operation.strip_suffix(OF_COMPLEMENT_SUFFIX) {
            let reduction = Reduction::parse(prefix)
                .ok_or_else(|| RollupError::UnsupportedOperation(operation.clone()))?;
            let of_complement = of_complement.ok_or_else(|| RollupError::MissingParameter {
                operation: operation.clone(),
                parameter: "of_complement",
            })?;
            if of_complement.is_empty() {
                return Err(RollupError::InvalidConfig(format!(
                    "of_complement for {} must name at least one column",
                    operation
                )));
            }
            return Ok(Operation::OfComplement {
                column,
                reduction,
                of_complement,
            });
        }

        match operation.as_str() {
            PERCENT_OF_TOTAL_CATEGORICAL => Ok(Operation::PercentOfTotalCategorical { column }),
            PERCENT_OF_TOTAL_NUMERIC => {
                let of_total = of_total.ok_or_else(|| RollupError::MissingParameter {
                    operation: operation.clone(),
                    parameter: "of_total",
                })?;
                let of_total = match of_total {
                    OfTotalSpec::Single(s) if s == "*" => TotalScope::All,
                    OfTotalSpec::List(list) if list.len() == 1 && list[0] == "*" => TotalScope::All,
                    OfTotalSpec::List(list) if !list.is_empty() => TotalScope::Columns(list),
                    other => {
                        return Err(RollupError::InvalidConfig(format!(
                            "of_total for {} must be \"*\" or a non-empty list of columns, \
                             received {:?}",
                            operation, other
                        )))
                    }
                };
                Ok(Operation::PercentOfTotalNumeric { column, of_total })
            }
            name => match Reduction::parse(name) {
                Some(reduction) => Ok(Operation::Standard { column, reduction }),
                None => Err(RollupError::UnsupportedOperation(operation)),
            },
        }
    }
}

impl From<Operation> for OperationSpec {
    fn from(op: Operation) -> Self {
        let operation = op.kind_name();
        match op {
            Operation::Standard { column, .. }
            | Operation::PercentOfTotalCategorical { column } => OperationSpec {
                operation,
                column,
                of_complement: None,
                of_total: None,
            },
            Operation::OfComplement {
                column, of_complement, ..
            } => OperationSpec {
                operation,
                column,
                of_complement: Some(of_complement),
                of_total: None,
            },
            Operation::PercentOfTotalNumeric { column, of_total } => OperationSpec {
                operation,
                column,
                of_complement: None,
                of_total: Some(match of_total {
                    TotalScope::All => OfTotalSpec::Single("*".to_string()),
                    TotalScope::Columns(columns) => OfTotalSpec::List(columns),
                }),
            },
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Execution options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationOptions {
    /// Convention for the `std` reduction.
    #[serde(default)]
    pub std: StdConvention,

    /// Fan work out over threads when the `parallel` feature is built.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AggregationOptions {
    fn default() -> Self {
        AggregationOptions {
            std: StdConvention::Sample,
            parallel: true,
        }
    }
}

/// The complete, immutable description of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Operations, in result-column order.
    pub operations: Vec<Operation>,

    /// Dimension lists present in every grouping set.
    pub dimensions_constant: Vec<DimensionList>,

    /// Dimension lists crossed with the constant ones.
    #[serde(default)]
    pub dimensions_change: Option<Vec<DimensionList>>,

    #[serde(default)]
    pub options: AggregationOptions,
}

impl AggregationConfig {
    pub fn new(
        operations: Vec<Operation>,
        dimensions_constant: Vec<DimensionList>,
        dimensions_change: Option<Vec<DimensionList>>,
    ) -> Self {
        AggregationConfig {
            operations,
            dimensions_constant,
            dimensions_change,
            options: AggregationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AggregationOptions) -> Self {
        self.options = options;
        self
    }

    /// Parses a configuration from JSON. Operation names are resolved here,
    /// so unknown operations and malformed dimension lists fail before any
    /// data is touched.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The grouping sets this configuration expands to, in execution order.
    pub fn grouping_sets(&self) -> Vec<DimensionList> {
        grouping_sets(&self.dimensions_constant, self.dimensions_change.as_deref())
    }

    /// Every column named by a constant dimension list, first-seen order.
    pub fn constant_columns(&self) -> Vec<String> {
        unique_columns(&self.dimensions_constant)
    }

    /// Every column named by a change dimension list, first-seen order.
    pub fn change_columns(&self) -> Vec<String> {
        self.dimensions_change.as_deref().map(unique_columns).unwrap_or_default()
    }

    /// Every dimension column, constant first.
    pub fn dimension_columns(&self) -> Vec<String> {
        let mut columns = self.constant_columns();
        for column in self.change_columns() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }
}

fn unique_columns(lists: &[DimensionList]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for column in lists.iter().flatten() {
        if !out.contains(column) {
            out.push(column.clone());
        }
    }
    out
}
