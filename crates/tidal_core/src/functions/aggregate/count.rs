use tidal_error::Result;

use super::Accumulator;
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::{OwnedScalarValue, ScalarValue};

/// Counts every row, including rows where the input is null.
#[derive(Debug)]
pub struct CountAccumulator {
    datatype: DataType,
    count: i64,
}

impl CountAccumulator {
    pub fn new(datatype: DataType) -> Self {
        CountAccumulator { datatype, count: 0 }
    }
}

impl Accumulator for CountAccumulator {
    fn accumulate(&mut self, value: &ScalarValue) -> Result<()> {
        value.check_type(self.datatype)?;
        self.count += 1;
        Ok(())
    }

    fn final_value(&self) -> Result<OwnedScalarValue> {
        Ok(ScalarValue::Int64(self.count))
    }
}
