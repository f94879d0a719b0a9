use std::fmt;

use tidal_error::Result;

use crate::arrays::field::{Field, Schema};

/// Reference to a column by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpr {
    pub name: String,
}

impl ColumnExpr {
    pub fn to_field(&self, input: &Schema) -> Result<Field> {
        let idx = input.find_index(&self.name)?;
        // Index came from the schema.
        Ok(input.fields[idx].clone())
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
