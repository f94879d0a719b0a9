use std::fmt;
use std::sync::Arc;

use tidal_error::{DbError, ErrorKind, Result};

use super::{PhysicalScalarExpression, check_binary_inputs, check_binary_types};
use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::compute::arith::{ArithOperator, arith};
use crate::arrays::datatype::DataType;
use crate::arrays::field::Schema;

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalArithExpr {
    pub op: ArithOperator,
    pub left: Box<PhysicalScalarExpression>,
    pub right: Box<PhysicalScalarExpression>,
}

impl PhysicalArithExpr {
    pub fn eval(&self, batch: &Batch) -> Result<Arc<Array>> {
        let left = self.left.eval(batch)?;
        let right = self.right.eval(batch)?;
        check_binary_inputs(&self.op, &left, &right)?;

        Ok(Arc::new(arith(self.op, &left, &right)?))
    }

    /// Output type is the shared input type.
    pub fn datatype(&self, schema: &Schema) -> Result<DataType> {
        let datatype = check_binary_types(
            &self.op,
            self.left.datatype(schema)?,
            self.right.datatype(schema)?,
        )?;

        if !datatype.is_numeric() {
            return Err(DbError::with_kind(
                ErrorKind::UnsupportedType,
                format!("Cannot apply '{}' to {datatype}", self.op),
            ));
        }

        Ok(datatype)
    }
}

impl fmt::Display for PhysicalArithExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.op, self.right)
    }
}
