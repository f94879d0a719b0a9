use std::fmt;
use std::sync::Arc;

use tidal_error::Result;

use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::{OwnedScalarValue, ScalarValue};

/// A literal value broadcast to every row of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalLiteralExpr {
    pub literal: OwnedScalarValue,
    /// Type of the literal. Needed since nulls are untyped.
    pub datatype: DataType,
}

impl PhysicalLiteralExpr {
    /// Create a literal from a non-null value.
    ///
    /// Returns `None` if the value is null, use `new_typed_null` for that.
    pub fn new(literal: OwnedScalarValue) -> Option<Self> {
        let datatype = literal.datatype()?;
        Some(PhysicalLiteralExpr { literal, datatype })
    }

    pub fn new_typed_null(datatype: DataType) -> Self {
        PhysicalLiteralExpr {
            literal: ScalarValue::Null,
            datatype,
        }
    }

    /// Produce a constant array with as many rows as the batch.
    pub fn eval(&self, batch: &Batch) -> Result<Arc<Array>> {
        let arr = self.literal.as_array(self.datatype, batch.num_rows())?;
        Ok(Arc::new(arr))
    }
}

impl fmt::Display for PhysicalLiteralExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            ScalarValue::Utf8(s) => write!(f, "'{s}'"),
            other => write!(f, "{other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::testutil::assert_arrays_eq;
    use crate::generate_batch;

    #[test]
    fn broadcast_to_batch_len() {
        let batch = generate_batch!(("a", [1, 2, 3]));
        let expr = PhysicalLiteralExpr::new(ScalarValue::Int64(7)).unwrap();

        let out = expr.eval(&batch).unwrap();
        assert!(out.is_constant());
        assert_arrays_eq(&Array::from_iter([7_i64, 7, 7]), &out);
    }

    #[test]
    fn typed_null() {
        let batch = generate_batch!(("a", [1, 2]));
        let expr = PhysicalLiteralExpr::new_typed_null(DataType::Utf8);

        let out = expr.eval(&batch).unwrap();
        assert_eq!(DataType::Utf8, out.datatype());
        assert_eq!(ScalarValue::Null, out.logical_value(1).unwrap());
    }

    #[test]
    fn untyped_null_rejected() {
        assert!(PhysicalLiteralExpr::new(ScalarValue::Null).is_none());
    }

    #[test]
    fn display_quotes_strings() {
        let expr = PhysicalLiteralExpr::new("hello".to_string().into()).unwrap();
        assert_eq!("'hello'", expr.to_string());
    }
}
