use std::fmt::{self, Debug};

use tidal_error::{DbError, ErrorKind, Result};

use super::ArrayData;
use super::storage::{AddressableStorage, StringStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Utf8,
}

impl PhysicalType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Utf8 => "Utf8",
        }
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed access to array data.
///
/// `get_storage` checks the physical type once per array. Executors then
/// read values through the returned storage without further type checks.
pub trait PhysicalStorage: Debug + Sync + Send + Clone + Copy + 'static {
    const PHYSICAL_TYPE: PhysicalType;

    /// The native value type being stored.
    type StorageType: ?Sized;

    type Storage<'a>: AddressableStorage<T = Self::StorageType>;

    fn get_storage(data: &ArrayData) -> Result<Self::Storage<'_>>;
}

fn storage_type_err(expected: PhysicalType, got: PhysicalType) -> DbError {
    DbError::with_kind(
        ErrorKind::TypeMismatch,
        "Array data has unexpected physical type",
    )
    .with_field("expected", expected)
    .with_field("got", got)
}

macro_rules! impl_primitive_storage {
    ($name:ident, $prim:ty, $variant:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl PhysicalStorage for $name {
            const PHYSICAL_TYPE: PhysicalType = PhysicalType::$variant;

            type StorageType = $prim;
            type Storage<'a> = &'a [$prim];

            fn get_storage(data: &ArrayData) -> Result<Self::Storage<'_>> {
                match data {
                    ArrayData::$variant(storage) => Ok(storage.as_slice()),
                    other => Err(storage_type_err(
                        Self::PHYSICAL_TYPE,
                        other.physical_type(),
                    )),
                }
            }
        }
    };
}

impl_primitive_storage!(PhysicalBool, bool, Boolean);
impl_primitive_storage!(PhysicalI8, i8, Int8);
impl_primitive_storage!(PhysicalI16, i16, Int16);
impl_primitive_storage!(PhysicalI32, i32, Int32);
impl_primitive_storage!(PhysicalI64, i64, Int64);
impl_primitive_storage!(PhysicalU8, u8, UInt8);
impl_primitive_storage!(PhysicalU16, u16, UInt16);
impl_primitive_storage!(PhysicalU32, u32, UInt32);
impl_primitive_storage!(PhysicalU64, u64, UInt64);
impl_primitive_storage!(PhysicalF32, f32, Float32);
impl_primitive_storage!(PhysicalF64, f64, Float64);

#[derive(Debug, Clone, Copy)]
pub struct PhysicalUtf8;

impl PhysicalStorage for PhysicalUtf8 {
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Utf8;

    type StorageType = str;
    type Storage<'a> = &'a StringStorage;

    fn get_storage(data: &ArrayData) -> Result<Self::Storage<'_>> {
        match data {
            ArrayData::Utf8(storage) => Ok(storage.as_ref()),
            other => Err(storage_type_err(
                Self::PHYSICAL_TYPE,
                other.physical_type(),
            )),
        }
    }
}
