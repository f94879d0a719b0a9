use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};
use tidal_error::{DbError, ErrorKind, Result};

use crate::arrays::array::Array;
use crate::arrays::array::physical_type::{
    PhysicalBool,
    PhysicalF32,
    PhysicalF64,
    PhysicalI8,
    PhysicalI16,
    PhysicalI32,
    PhysicalI64,
    PhysicalStorage,
    PhysicalU8,
    PhysicalU16,
    PhysicalU32,
    PhysicalU64,
    PhysicalUtf8,
};
use crate::arrays::datatype::DataType;
use crate::arrays::executor::builder::BooleanBuffer;
use crate::arrays::executor::scalar::BinaryExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOperator {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }

    /// If this operator needs an ordering rather than just equality.
    pub const fn is_ordering(&self) -> bool {
        !matches!(self, Self::Eq | Self::NotEq)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

pub trait ComparisonOperation: Debug + Sync + Send + Copy + 'static {
    fn compare<T>(left: &T, right: &T) -> bool
    where
        T: PartialEq + PartialOrd + ?Sized;
}

#[derive(Debug, Clone, Copy)]
pub struct EqOperation;

impl ComparisonOperation for EqOperation {
    fn compare<T>(left: &T, right: &T) -> bool
    where
        T: PartialEq + PartialOrd + ?Sized,
    {
        left == right
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NotEqOperation;

impl ComparisonOperation for NotEqOperation {
    fn compare<T>(left: &T, right: &T) -> bool
    where
        T: PartialEq + PartialOrd + ?Sized,
    {
        left != right
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LtOperation;

impl ComparisonOperation for LtOperation {
    fn compare<T>(left: &T, right: &T) -> bool
    where
        T: PartialEq + PartialOrd + ?Sized,
    {
        left < right
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LtEqOperation;

impl ComparisonOperation for LtEqOperation {
    fn compare<T>(left: &T, right: &T) -> bool
    where
        T: PartialEq + PartialOrd + ?Sized,
    {
        left <= right
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GtOperation;

impl ComparisonOperation for GtOperation {
    fn compare<T>(left: &T, right: &T) -> bool
    where
        T: PartialEq + PartialOrd + ?Sized,
    {
        left > right
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GtEqOperation;

impl ComparisonOperation for GtEqOperation {
    fn compare<T>(left: &T, right: &T) -> bool
    where
        T: PartialEq + PartialOrd + ?Sized,
    {
        left >= right
    }
}

/// Compare two arrays of the same type, producing a boolean array.
///
/// Strings compare by byte order. Booleans only support equality.
pub fn compare(op: ComparisonOperator, left: &Array, right: &Array) -> Result<Array> {
    if left.datatype() != right.datatype() {
        return Err(DbError::with_kind(
            ErrorKind::TypeMismatch,
            format!("Cannot compare with '{op}'"),
        )
        .with_field("left", left.datatype())
        .with_field("right", right.datatype()));
    }

    match op {
        ComparisonOperator::Eq => compare_dispatch::<EqOperation>(op, left, right),
        ComparisonOperator::NotEq => compare_dispatch::<NotEqOperation>(op, left, right),
        ComparisonOperator::Lt => compare_dispatch::<LtOperation>(op, left, right),
        ComparisonOperator::LtEq => compare_dispatch::<LtEqOperation>(op, left, right),
        ComparisonOperator::Gt => compare_dispatch::<GtOperation>(op, left, right),
        ComparisonOperator::GtEq => compare_dispatch::<GtEqOperation>(op, left, right),
    }
}

fn compare_dispatch<O>(op: ComparisonOperator, left: &Array, right: &Array) -> Result<Array>
where
    O: ComparisonOperation,
{
    match left.datatype() {
        DataType::Boolean => {
            if op.is_ordering() {
                return Err(DbError::with_kind(
                    ErrorKind::UnsupportedType,
                    format!("Boolean values do not support '{op}'"),
                ));
            }
            compare_typed::<PhysicalBool, O>(left, right)
        }
        DataType::Int8 => compare_typed::<PhysicalI8, O>(left, right),
        DataType::Int16 => compare_typed::<PhysicalI16, O>(left, right),
        DataType::Int32 => compare_typed::<PhysicalI32, O>(left, right),
        DataType::Int64 => compare_typed::<PhysicalI64, O>(left, right),
        DataType::UInt8 => compare_typed::<PhysicalU8, O>(left, right),
        DataType::UInt16 => compare_typed::<PhysicalU16, O>(left, right),
        DataType::UInt32 => compare_typed::<PhysicalU32, O>(left, right),
        DataType::UInt64 => compare_typed::<PhysicalU64, O>(left, right),
        DataType::Float32 => compare_typed::<PhysicalF32, O>(left, right),
        DataType::Float64 => compare_typed::<PhysicalF64, O>(left, right),
        DataType::Utf8 => compare_typed::<PhysicalUtf8, O>(left, right),
    }
}

fn compare_typed<S, O>(left: &Array, right: &Array) -> Result<Array>
where
    S: PhysicalStorage,
    S::StorageType: PartialEq + PartialOrd,
    O: ComparisonOperation,
{
    BinaryExecutor::execute::<S, S, BooleanBuffer, _>(
        left,
        right,
        DataType::Boolean,
        |a, b, buf| buf.put(&O::compare(a, b)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::scalar::ScalarValue;
    use crate::arrays::testutil::assert_arrays_eq;

    #[test]
    fn eq_float() {
        let left = Array::from_iter([21.0, 22.8, 21.0]);
        let right = Array::new_constant(DataType::Float64, &ScalarValue::Float64(21.0), 3).unwrap();

        let out = compare(ComparisonOperator::Eq, &left, &right).unwrap();
        assert_arrays_eq(&Array::from_iter([true, false, true]), &out);
    }

    #[test]
    fn lt_with_nulls() {
        let left = Array::from_iter([Some(1_i64), None, Some(5)]);
        let right = Array::from_iter([2_i64, 2, 2]);

        let out = compare(ComparisonOperator::Lt, &left, &right).unwrap();
        assert_arrays_eq(&Array::from_iter([Some(true), None, Some(false)]), &out);
    }

    #[test]
    fn strings_lexicographic() {
        let left = Array::from_iter(["apple", "Banana", "cherry"]);
        let right = Array::from_iter(["banana", "banana", "cherry"]);

        let out = compare(ComparisonOperator::GtEq, &left, &right).unwrap();
        assert_arrays_eq(&Array::from_iter([false, false, true]), &out);
    }

    #[test]
    fn bool_equality_only() {
        let left = Array::from_iter([true, false]);
        let right = Array::from_iter([true, true]);

        let out = compare(ComparisonOperator::NotEq, &left, &right).unwrap();
        assert_arrays_eq(&Array::from_iter([false, true]), &out);

        let err = compare(ComparisonOperator::Gt, &left, &right).unwrap_err();
        assert_eq!(ErrorKind::UnsupportedType, err.kind());
    }

    #[test]
    fn mismatched_types() {
        let left = Array::from_iter([1_i32, 2]);
        let right = Array::from_iter([1_i64, 2]);

        let err = compare(ComparisonOperator::Eq, &left, &right).unwrap_err();
        assert_eq!(ErrorKind::TypeMismatch, err.kind());
    }

    #[test]
    fn unsigned_compare() {
        let left = Array::from_iter([1_u8, 200]);
        let right = Array::from_iter([100_u8, 100]);

        let out = compare(ComparisonOperator::Gt, &left, &right).unwrap();
        assert_arrays_eq(&Array::from_iter([false, true]), &out);
    }
}
