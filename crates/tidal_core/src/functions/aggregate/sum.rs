use std::borrow::Cow;

use tidal_error::Result;

use super::{Accumulator, AggregateFunction, unsupported_input};
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::{OwnedScalarValue, ScalarValue};

/// Sum of non-null values.
///
/// Integers wrap on overflow. Strings are concatenated.
#[derive(Debug)]
pub struct SumAccumulator {
    datatype: DataType,
    sum: Option<OwnedScalarValue>,
}

impl SumAccumulator {
    pub fn new(datatype: DataType) -> Self {
        SumAccumulator {
            datatype,
            sum: None,
        }
    }
}

impl Accumulator for SumAccumulator {
    fn accumulate(&mut self, value: &ScalarValue) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        value.check_type(self.datatype)?;

        let sum = match self.sum.take() {
            None => value.clone().into_owned(),
            Some(current) => match (current, value) {
                (ScalarValue::Int8(a), ScalarValue::Int8(b)) => ScalarValue::Int8(a.wrapping_add(*b)),
                (ScalarValue::Int16(a), ScalarValue::Int16(b)) => {
                    ScalarValue::Int16(a.wrapping_add(*b))
                }
                (ScalarValue::Int32(a), ScalarValue::Int32(b)) => {
                    ScalarValue::Int32(a.wrapping_add(*b))
                }
                (ScalarValue::Int64(a), ScalarValue::Int64(b)) => {
                    ScalarValue::Int64(a.wrapping_add(*b))
                }
                (ScalarValue::UInt8(a), ScalarValue::UInt8(b)) => {
                    ScalarValue::UInt8(a.wrapping_add(*b))
                }
                (ScalarValue::UInt16(a), ScalarValue::UInt16(b)) => {
                    ScalarValue::UInt16(a.wrapping_add(*b))
                }
                (ScalarValue::UInt32(a), ScalarValue::UInt32(b)) => {
                    ScalarValue::UInt32(a.wrapping_add(*b))
                }
                (ScalarValue::UInt64(a), ScalarValue::UInt64(b)) => {
                    ScalarValue::UInt64(a.wrapping_add(*b))
                }
                (ScalarValue::Float32(a), ScalarValue::Float32(b)) => ScalarValue::Float32(a + b),
                (ScalarValue::Float64(a), ScalarValue::Float64(b)) => ScalarValue::Float64(a + b),
                (ScalarValue::Utf8(a), ScalarValue::Utf8(b)) => {
                    let mut s = a.into_owned();
                    s.push_str(b);
                    ScalarValue::Utf8(Cow::Owned(s))
                }
                _ => return Err(unsupported_input(AggregateFunction::Sum, self.datatype)),
            },
        };

        self.sum = Some(sum);
        Ok(())
    }

    fn final_value(&self) -> Result<OwnedScalarValue> {
        Ok(self.sum.clone().unwrap_or(ScalarValue::Null))
    }
}
