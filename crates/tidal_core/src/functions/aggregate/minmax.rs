use std::cmp::Ordering;

use tidal_error::{DbError, ErrorKind, Result};

use super::Accumulator;
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::{OwnedScalarValue, ScalarValue};

#[derive(Debug)]
pub struct MinAccumulator {
    inner: ExtremeState,
}

impl MinAccumulator {
    pub fn new(datatype: DataType) -> Self {
        MinAccumulator {
            inner: ExtremeState::new(datatype, Ordering::Less),
        }
    }
}

impl Accumulator for MinAccumulator {
    fn accumulate(&mut self, value: &ScalarValue) -> Result<()> {
        self.inner.update(value)
    }

    fn final_value(&self) -> Result<OwnedScalarValue> {
        Ok(self.inner.value())
    }
}

#[derive(Debug)]
pub struct MaxAccumulator {
    inner: ExtremeState,
}

impl MaxAccumulator {
    pub fn new(datatype: DataType) -> Self {
        MaxAccumulator {
            inner: ExtremeState::new(datatype, Ordering::Greater),
        }
    }
}

impl Accumulator for MaxAccumulator {
    fn accumulate(&mut self, value: &ScalarValue) -> Result<()> {
        self.inner.update(value)
    }

    fn final_value(&self) -> Result<OwnedScalarValue> {
        Ok(self.inner.value())
    }
}

/// Tracks the most extreme value seen in one direction.
#[derive(Debug)]
struct ExtremeState {
    datatype: DataType,
    /// Replace the current value when `new.cmp(current) == replace_on`.
    replace_on: Ordering,
    current: Option<OwnedScalarValue>,
}

impl ExtremeState {
    fn new(datatype: DataType, replace_on: Ordering) -> Self {
        ExtremeState {
            datatype,
            replace_on,
            current: None,
        }
    }

    fn update(&mut self, value: &ScalarValue) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        value.check_type(self.datatype)?;

        match &self.current {
            None => self.current = Some(value.clone().into_owned()),
            Some(current) => {
                if compare_scalars(value, current)? == self.replace_on {
                    self.current = Some(value.clone().into_owned());
                }
            }
        }

        Ok(())
    }

    fn value(&self) -> OwnedScalarValue {
        self.current.clone().unwrap_or(ScalarValue::Null)
    }
}

/// Compare two non-null values of the same type.
///
/// Floats use IEEE total ordering, positive NaN sorts above every number and
/// negative NaN below.
fn compare_scalars(a: &ScalarValue, b: &ScalarValue) -> Result<Ordering> {
    Ok(match (a, b) {
        (ScalarValue::Int8(a), ScalarValue::Int8(b)) => a.cmp(b),
        (ScalarValue::Int16(a), ScalarValue::Int16(b)) => a.cmp(b),
        (ScalarValue::Int32(a), ScalarValue::Int32(b)) => a.cmp(b),
        (ScalarValue::Int64(a), ScalarValue::Int64(b)) => a.cmp(b),
        (ScalarValue::UInt8(a), ScalarValue::UInt8(b)) => a.cmp(b),
        (ScalarValue::UInt16(a), ScalarValue::UInt16(b)) => a.cmp(b),
        (ScalarValue::UInt32(a), ScalarValue::UInt32(b)) => a.cmp(b),
        (ScalarValue::UInt64(a), ScalarValue::UInt64(b)) => a.cmp(b),
        (ScalarValue::Float32(a), ScalarValue::Float32(b)) => a.total_cmp(b),
        (ScalarValue::Float64(a), ScalarValue::Float64(b)) => a.total_cmp(b),
        (ScalarValue::Utf8(a), ScalarValue::Utf8(b)) => a.as_bytes().cmp(b.as_bytes()),
        (a, b) => {
            return Err(DbError::with_kind(
                ErrorKind::UnsupportedType,
                "Cannot order values",
            )
            .with_field("left", a)
            .with_field("right", b));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(acc: &mut dyn Accumulator, vals: &[ScalarValue]) -> OwnedScalarValue {
        for val in vals {
            acc.accumulate(val).unwrap();
        }
        acc.final_value().unwrap()
    }

    #[test]
    fn max_skips_nulls() {
        let vals = [
            ScalarValue::Null,
            ScalarValue::Int32(5),
            ScalarValue::Int32(3),
            ScalarValue::Int32(9),
            ScalarValue::Null,
        ];
        let mut acc = MaxAccumulator::new(DataType::Int32);
        assert_eq!(ScalarValue::Int32(9), run(&mut acc, &vals));
    }

    #[test]
    fn min_skips_nulls() {
        let vals = [
            ScalarValue::Null,
            ScalarValue::Int32(5),
            ScalarValue::Int32(3),
            ScalarValue::Int32(9),
        ];
        let mut acc = MinAccumulator::new(DataType::Int32);
        assert_eq!(ScalarValue::Int32(3), run(&mut acc, &vals));
    }

    #[test]
    fn all_nulls_is_null() {
        let vals = [ScalarValue::Null, ScalarValue::Null];
        let mut acc = MaxAccumulator::new(DataType::Int32);
        assert_eq!(ScalarValue::Null, run(&mut acc, &vals));
    }

    #[test]
    fn strings_lexicographic() {
        let vals = [
            ScalarValue::from("pear"),
            ScalarValue::from("apple"),
            ScalarValue::from("zucchini"),
        ];
        let mut min = MinAccumulator::new(DataType::Utf8);
        let mut max = MaxAccumulator::new(DataType::Utf8);
        assert_eq!(ScalarValue::from("apple"), run(&mut min, &vals));
        assert_eq!(ScalarValue::from("zucchini"), run(&mut max, &vals));
    }

    #[test]
    fn nan_order_independent() {
        let nan_first = [ScalarValue::Float64(f64::NAN), ScalarValue::Float64(5.0)];
        let five_first = [ScalarValue::Float64(5.0), ScalarValue::Float64(f64::NAN)];

        for vals in [&nan_first, &five_first] {
            let mut max = MaxAccumulator::new(DataType::Float64);
            let out = run(&mut max, vals);
            assert!(matches!(out, ScalarValue::Float64(v) if v.is_nan()), "got {out:?}");

            let mut min = MinAccumulator::new(DataType::Float64);
            assert_eq!(ScalarValue::Float64(5.0), run(&mut min, vals));
        }
    }

    #[test]
    fn wrong_type() {
        let mut acc = MinAccumulator::new(DataType::Int32);
        let err = acc.accumulate(&ScalarValue::Int64(4)).unwrap_err();
        assert_eq!(ErrorKind::TypeMismatch, err.kind());
    }
}
