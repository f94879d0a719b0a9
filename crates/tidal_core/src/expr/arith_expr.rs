use std::fmt;

use tidal_error::{DbError, ErrorKind, Result};

use super::Expression;
use crate::arrays::compute::arith::ArithOperator;
use crate::arrays::field::{Field, Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct ArithExpr {
    pub op: ArithOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl ArithExpr {
    /// Output keeps the operand type. Operands must already agree.
    pub fn to_field(&self, input: &Schema) -> Result<Field> {
        let left = self.left.datatype(input)?;
        let right = self.right.datatype(input)?;

        if left != right {
            return Err(DbError::with_kind(
                ErrorKind::TypeMismatch,
                format!("Operands to '{}' have differing types", self.op),
            )
            .with_field("expression", self)
            .with_field("left", left)
            .with_field("right", right));
        }

        if !left.is_numeric() {
            return Err(DbError::with_kind(
                ErrorKind::UnsupportedType,
                format!("Cannot apply '{}' to {left}", self.op),
            ));
        }

        Ok(Field::new(self.to_string(), left))
    }
}

impl fmt::Display for ArithExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}
