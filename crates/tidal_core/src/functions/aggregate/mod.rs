//! Aggregate functions and their per-group accumulators.

pub mod avg;
pub mod count;
pub mod minmax;
pub mod sum;

use std::fmt::{self, Debug};

use avg::AvgAccumulator;
use count::CountAccumulator;
use minmax::{MaxAccumulator, MinAccumulator};
use serde::{Deserialize, Serialize};
use sum::SumAccumulator;
use tidal_error::{DbError, ErrorKind, Result};

use crate::arrays::datatype::DataType;
use crate::arrays::scalar::{OwnedScalarValue, ScalarValue};

/// Incremental reduction over the values of a single group.
pub trait Accumulator: Debug + Send {
    /// Fold one value into the state.
    fn accumulate(&mut self, value: &ScalarValue) -> Result<()>;

    /// Produce the final value from the current state.
    ///
    /// May be called more than once.
    fn final_value(&self) -> Result<OwnedScalarValue>;
}

/// Aggregate functions usable in a hash aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunction {
    Min,
    Max,
    Sum,
    Count,
    Avg,
}

impl AggregateFunction {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Count => "COUNT",
            Self::Avg => "AVG",
        }
    }

    /// Parse a function name, ignoring case.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name.to_ascii_uppercase().as_str() {
            "MIN" => Self::Min,
            "MAX" => Self::Max,
            "SUM" => Self::Sum,
            "COUNT" => Self::Count,
            "AVG" | "MEAN" => Self::Avg,
            _ => {
                return Err(DbError::with_kind(
                    ErrorKind::Parse,
                    format!("Unknown aggregate function: {name}"),
                ));
            }
        })
    }

    /// Output type when aggregating values of `input`.
    ///
    /// Errors with `UnsupportedType` if the function has no rule for the
    /// input type.
    pub fn return_type(&self, input: DataType) -> Result<DataType> {
        match self {
            Self::Min | Self::Max if input != DataType::Boolean => Ok(input),
            Self::Sum if input.is_numeric() || input == DataType::Utf8 => Ok(input),
            Self::Avg if input.is_numeric() => Ok(DataType::Float64),
            Self::Count => Ok(DataType::Int64),
            _ => Err(unsupported_input(*self, input)),
        }
    }

    /// Create a fresh accumulator for values of type `input`.
    pub fn create_accumulator(&self, input: DataType) -> Result<Box<dyn Accumulator>> {
        // Validates the input type.
        self.return_type(input)?;

        Ok(match self {
            Self::Min => Box::new(MinAccumulator::new(input)),
            Self::Max => Box::new(MaxAccumulator::new(input)),
            Self::Sum => Box::new(SumAccumulator::new(input)),
            Self::Count => Box::new(CountAccumulator::new(input)),
            Self::Avg => Box::new(AvgAccumulator::new(input)),
        })
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn unsupported_input(function: AggregateFunction, input: DataType) -> DbError {
    DbError::with_kind(
        ErrorKind::UnsupportedType,
        format!("{function} does not support input type {input}"),
    )
}
