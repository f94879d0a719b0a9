use std::fmt;
use std::sync::Arc;

use tidal_error::{DbError, ErrorKind, Result};

use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::datatype::DataType;
use crate::arrays::field::Schema;

/// Reference to a column in the input batch by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalColumnExpr {
    pub idx: usize,
}

impl PhysicalColumnExpr {
    pub fn new(idx: usize) -> Self {
        PhysicalColumnExpr { idx }
    }

    /// Returns the column from the batch. The array is shared, not copied.
    pub fn eval(&self, batch: &Batch) -> Result<Arc<Array>> {
        batch.get_column(self.idx).cloned()
    }

    pub fn datatype(&self, schema: &Schema) -> Result<DataType> {
        schema
            .field(self.idx)
            .map(|f| f.datatype)
            .ok_or_else(|| {
                DbError::with_kind(
                    ErrorKind::IndexError,
                    format!("Column reference {self} out of range"),
                )
                .with_field("num_fields", schema.len())
            })
    }
}

impl fmt::Display for PhysicalColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_batch;

    #[test]
    fn eval_shares_column() {
        let batch = generate_batch!(("a", [1, 2]), ("b", ["x", "y"]));
        let out = PhysicalColumnExpr::new(1).eval(&batch).unwrap();
        assert!(Arc::ptr_eq(batch.column(1).unwrap(), &out));
    }

    #[test]
    fn eval_out_of_range() {
        let batch = generate_batch!(("a", [1, 2]));
        let err = PhysicalColumnExpr::new(3).eval(&batch).unwrap_err();
        assert_eq!(ErrorKind::IndexError, err.kind());
    }

    #[test]
    fn datatype_out_of_range() {
        let batch = generate_batch!(("a", [1, 2]));
        let err = PhysicalColumnExpr::new(1).datatype(batch.schema()).unwrap_err();
        assert_eq!(ErrorKind::IndexError, err.kind());
    }
}
