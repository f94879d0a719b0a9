use std::fmt;

use tidal_error::{DbError, ErrorKind, Result};

use super::Expression;
use crate::arrays::compute::cmp::ComparisonOperator;
use crate::arrays::datatype::DataType;
use crate::arrays::field::{Field, Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpr {
    pub op: ComparisonOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl ComparisonExpr {
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

        if left == DataType::Boolean && self.op.is_ordering() {
            return Err(DbError::with_kind(
                ErrorKind::UnsupportedType,
                format!("Cannot apply '{}' to {left}", self.op),
            ));
        }

        Ok(Field::new(self.to_string(), DataType::Boolean))
    }
}

impl fmt::Display for ComparisonExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}
