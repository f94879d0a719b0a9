use std::fmt;

use tidal_error::{DbError, ErrorKind, Result};

use super::Expression;
use crate::arrays::compute::boolean::ConjunctionOperator;
use crate::arrays::datatype::DataType;
use crate::arrays::field::{Field, Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct ConjunctionExpr {
    pub op: ConjunctionOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl ConjunctionExpr {
    pub fn to_field(&self, input: &Schema) -> Result<Field> {
        let left = self.left.datatype(input)?;
        let right = self.right.datatype(input)?;

        if left != right {
            return Err(DbError::with_kind(
                ErrorKind::TypeMismatch,
                format!("Operands to {} have differing types", self.op),
            )
            .with_field("expression", self)
            .with_field("left", left)
            .with_field("right", right));
        }

        if left != DataType::Boolean {
            return Err(DbError::with_kind(
                ErrorKind::UnsupportedType,
                format!("{} requires boolean operands", self.op),
            )
            .with_field("got", left));
        }

        Ok(Field::new(self.to_string(), DataType::Boolean))
    }
}

impl fmt::Display for ConjunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}
