use std::fmt;

use crate::arrays::datatype::DataType;
use crate::arrays::field::Field;
use crate::arrays::scalar::{OwnedScalarValue, ScalarValue};

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub literal: OwnedScalarValue,
    pub datatype: DataType,
}

impl LiteralExpr {
    /// Literals are named by their text.
    pub fn to_field(&self) -> Field {
        Field::new(self.to_string(), self.datatype)
    }
}

impl fmt::Display for LiteralExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            ScalarValue::Utf8(s) => write!(f, "'{s}'"),
            other => write!(f, "{other}"),
        }
    }
}
