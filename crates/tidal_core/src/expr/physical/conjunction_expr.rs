use std::fmt;
use std::sync::Arc;

use tidal_error::{DbError, ErrorKind, Result};

use super::{PhysicalScalarExpression, check_binary_inputs, check_binary_types};
use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::compute::boolean::{ConjunctionOperator, conjunction};
use crate::arrays::datatype::DataType;
use crate::arrays::field::Schema;

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalConjunctionExpr {
    pub op: ConjunctionOperator,
    pub left: Box<PhysicalScalarExpression>,
    pub right: Box<PhysicalScalarExpression>,
}

impl PhysicalConjunctionExpr {
    pub fn eval(&self, batch: &Batch) -> Result<Arc<Array>> {
        let left = self.left.eval(batch)?;
        let right = self.right.eval(batch)?;
        check_binary_inputs(&self.op, &left, &right)?;

        Ok(Arc::new(conjunction(self.op, &left, &right)?))
    }

    pub fn datatype(&self, schema: &Schema) -> Result<DataType> {
        let input = check_binary_types(
            &self.op,
            self.left.datatype(schema)?,
            self.right.datatype(schema)?,
        )?;

        if input != DataType::Boolean {
            return Err(DbError::with_kind(
                ErrorKind::UnsupportedType,
                format!("{} requires boolean inputs", self.op),
            )
            .with_field("got", input));
        }

        Ok(DataType::Boolean)
    }
}

impl fmt::Display for PhysicalConjunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.op, self.right)
    }
}
