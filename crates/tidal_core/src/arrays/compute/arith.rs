use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};
use tidal_error::{DbError, ErrorKind, Result};

use crate::arrays::array::Array;
use crate::arrays::array::physical_type::{
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
};
use crate::arrays::datatype::DataType;
use crate::arrays::executor::builder::{ArrayDataBuffer, PrimitiveBuffer};
use crate::arrays::executor::scalar::BinaryExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOperator {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}

impl fmt::Display for ArithOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Arithmetic on a native type.
///
/// Returning `None` produces a null in the output. Integers wrap on overflow
/// for add/sub/mul, division and remainder by zero are null.
pub trait ArithNative: Debug + Default + Copy + 'static {
    fn arith_add(self, rhs: Self) -> Option<Self>;
    fn arith_sub(self, rhs: Self) -> Option<Self>;
    fn arith_mul(self, rhs: Self) -> Option<Self>;
    fn arith_div(self, rhs: Self) -> Option<Self>;
    fn arith_rem(self, rhs: Self) -> Option<Self>;
}

macro_rules! impl_arith_int {
    ($prim:ty) => {
        impl ArithNative for $prim {
            fn arith_add(self, rhs: Self) -> Option<Self> {
                Some(self.wrapping_add(rhs))
            }

            fn arith_sub(self, rhs: Self) -> Option<Self> {
                Some(self.wrapping_sub(rhs))
            }

            fn arith_mul(self, rhs: Self) -> Option<Self> {
                Some(self.wrapping_mul(rhs))
            }

            // `MIN / -1` also lands here.
            fn arith_div(self, rhs: Self) -> Option<Self> {
                self.checked_div(rhs)
            }

            fn arith_rem(self, rhs: Self) -> Option<Self> {
                self.checked_rem(rhs)
            }
        }
    };
}

impl_arith_int!(i8);
impl_arith_int!(i16);
impl_arith_int!(i32);
impl_arith_int!(i64);
impl_arith_int!(u8);
impl_arith_int!(u16);
impl_arith_int!(u32);
impl_arith_int!(u64);

macro_rules! impl_arith_float {
    ($prim:ty) => {
        impl ArithNative for $prim {
            fn arith_add(self, rhs: Self) -> Option<Self> {
                Some(self + rhs)
            }

            fn arith_sub(self, rhs: Self) -> Option<Self> {
                Some(self - rhs)
            }

            fn arith_mul(self, rhs: Self) -> Option<Self> {
                Some(self * rhs)
            }

            fn arith_div(self, rhs: Self) -> Option<Self> {
                Some(self / rhs)
            }

            fn arith_rem(self, rhs: Self) -> Option<Self> {
                Some(self % rhs)
            }
        }
    };
}

impl_arith_float!(f32);
impl_arith_float!(f64);

/// Apply an arithmetic operator to two arrays of the same numeric type.
///
/// The output has the input type. There's no implicit widening, `Int32 *
/// Float64` is a type mismatch.
pub fn arith(op: ArithOperator, left: &Array, right: &Array) -> Result<Array> {
    if left.datatype() != right.datatype() {
        return Err(DbError::with_kind(
            ErrorKind::TypeMismatch,
            format!("Cannot apply '{op}' to differing types"),
        )
        .with_field("left", left.datatype())
        .with_field("right", right.datatype()));
    }

    let datatype = left.datatype();
    match datatype {
        DataType::Int8 => arith_typed::<PhysicalI8>(op, left, right, datatype),
        DataType::Int16 => arith_typed::<PhysicalI16>(op, left, right, datatype),
        DataType::Int32 => arith_typed::<PhysicalI32>(op, left, right, datatype),
        DataType::Int64 => arith_typed::<PhysicalI64>(op, left, right, datatype),
        DataType::UInt8 => arith_typed::<PhysicalU8>(op, left, right, datatype),
        DataType::UInt16 => arith_typed::<PhysicalU16>(op, left, right, datatype),
        DataType::UInt32 => arith_typed::<PhysicalU32>(op, left, right, datatype),
        DataType::UInt64 => arith_typed::<PhysicalU64>(op, left, right, datatype),
        DataType::Float32 => arith_typed::<PhysicalF32>(op, left, right, datatype),
        DataType::Float64 => arith_typed::<PhysicalF64>(op, left, right, datatype),
        DataType::Boolean | DataType::Utf8 => Err(DbError::with_kind(
            ErrorKind::UnsupportedType,
            format!("Cannot apply '{op}' to {datatype}"),
        )),
    }
}

fn arith_typed<S>(op: ArithOperator, left: &Array, right: &Array, datatype: DataType) -> Result<Array>
where
    S: PhysicalStorage,
    S::StorageType: ArithNative,
    PrimitiveBuffer<S::StorageType>: ArrayDataBuffer<Type = S::StorageType>,
{
    let f: fn(S::StorageType, S::StorageType) -> Option<S::StorageType> = match op {
        ArithOperator::Add => <S::StorageType as ArithNative>::arith_add,
        ArithOperator::Sub => <S::StorageType as ArithNative>::arith_sub,
        ArithOperator::Mul => <S::StorageType as ArithNative>::arith_mul,
        ArithOperator::Div => <S::StorageType as ArithNative>::arith_div,
        ArithOperator::Rem => <S::StorageType as ArithNative>::arith_rem,
    };

    BinaryExecutor::execute::<S, S, PrimitiveBuffer<S::StorageType>, _>(
        left,
        right,
        datatype,
        |&a, &b, buf| match f(a, b) {
            Some(v) => buf.put(&v),
            None => buf.put_null(),
        },
    )
}
