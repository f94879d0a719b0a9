use std::fmt;

use tidal_error::Result;

use super::Expression;
use crate::arrays::field::{Field, Schema};

/// Renames the output of an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasExpr {
    pub expr: Box<Expression>,
    pub name: String,
}

impl AliasExpr {
    pub fn to_field(&self, input: &Schema) -> Result<Field> {
        let field = self.expr.to_field(input)?;
        Ok(Field::new(self.name.clone(), field.datatype))
    }
}

impl fmt::Display for AliasExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.expr, self.name)
    }
}
