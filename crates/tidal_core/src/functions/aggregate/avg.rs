use tidal_error::Result;

use super::Accumulator;
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::{OwnedScalarValue, ScalarValue};

/// Mean of non-null numeric values as Float64.
#[derive(Debug)]
pub struct AvgAccumulator {
    datatype: DataType,
    sum: f64,
    count: i64,
}

impl AvgAccumulator {
    pub fn new(datatype: DataType) -> Self {
        AvgAccumulator {
            datatype,
            sum: 0.0,
            count: 0,
        }
    }
}

impl Accumulator for AvgAccumulator {
    fn accumulate(&mut self, value: &ScalarValue) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        value.check_type(self.datatype)?;

        self.sum += value.try_as_f64()?;
        self.count += 1;
        Ok(())
    }

    fn final_value(&self) -> Result<OwnedScalarValue> {
        if self.count == 0 {
            return Ok(ScalarValue::Null);
        }
        Ok(ScalarValue::Float64(self.sum / self.count as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avg_ints() {
        let mut acc = AvgAccumulator::new(DataType::Int32);
        for v in [ScalarValue::Int32(1), ScalarValue::Null, ScalarValue::Int32(4)] {
            acc.accumulate(&v).unwrap();
        }
        assert_eq!(ScalarValue::Float64(2.5), acc.final_value().unwrap());
    }

    #[test]
    fn avg_nothing_is_null() {
        let acc = AvgAccumulator::new(DataType::Float64);
        assert_eq!(ScalarValue::Null, acc.final_value().unwrap());
    }
}
