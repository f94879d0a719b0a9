use std::fmt;
use std::sync::Arc;

use tidal_error::{DbError, ErrorKind, Result};

use super::{PhysicalScalarExpression, check_binary_inputs, check_binary_types};
use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::compute::cmp::{ComparisonOperator, compare};
use crate::arrays::datatype::DataType;
use crate::arrays::field::Schema;

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalComparisonExpr {
    pub op: ComparisonOperator,
    pub left: Box<PhysicalScalarExpression>,
    pub right: Box<PhysicalScalarExpression>,
}

impl PhysicalComparisonExpr {
    pub fn eval(&self, batch: &Batch) -> Result<Arc<Array>> {
        let left = self.left.eval(batch)?;
        let right = self.right.eval(batch)?;
        check_binary_inputs(&self.op, &left, &right)?;

        Ok(Arc::new(compare(self.op, &left, &right)?))
    }

    pub fn datatype(&self, schema: &Schema) -> Result<DataType> {
        let input = check_binary_types(
            &self.op,
            self.left.datatype(schema)?,
            self.right.datatype(schema)?,
        )?;

        if input == DataType::Boolean && self.op.is_ordering() {
            return Err(DbError::with_kind(
                ErrorKind::UnsupportedType,
                format!("Cannot apply '{}' to {input}", self.op),
            ));
        }

        Ok(DataType::Boolean)
    }
}

impl fmt::Display for PhysicalComparisonExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.op, self.right)
    }
}
