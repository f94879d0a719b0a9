use std::borrow::Cow;
use std::fmt;

use tidal_error::{DbError, ErrorKind, Result};

use super::array::Array;
use super::datatype::DataType;

/// A single scalar value.
///
/// `Null` is untyped. Anything needing a typed null (literal expressions,
/// constant arrays) carries the type alongside the value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue<'a> {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Utf8(Cow<'a, str>),
}

pub type OwnedScalarValue = ScalarValue<'static>;

impl ScalarValue<'_> {
    /// Data type of the value, `None` for `Null`.
    pub fn datatype(&self) -> Option<DataType> {
        Some(match self {
            Self::Null => return None,
            Self::Boolean(_) => DataType::Boolean,
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt8(_) => DataType::UInt8,
            Self::UInt16(_) => DataType::UInt16,
            Self::UInt32(_) => DataType::UInt32,
            Self::UInt64(_) => DataType::UInt64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn into_owned(self) -> OwnedScalarValue {
        match self {
            Self::Null => OwnedScalarValue::Null,
            Self::Boolean(v) => OwnedScalarValue::Boolean(v),
            Self::Int8(v) => OwnedScalarValue::Int8(v),
            Self::Int16(v) => OwnedScalarValue::Int16(v),
            Self::Int32(v) => OwnedScalarValue::Int32(v),
            Self::Int64(v) => OwnedScalarValue::Int64(v),
            Self::UInt8(v) => OwnedScalarValue::UInt8(v),
            Self::UInt16(v) => OwnedScalarValue::UInt16(v),
            Self::UInt32(v) => OwnedScalarValue::UInt32(v),
            Self::UInt64(v) => OwnedScalarValue::UInt64(v),
            Self::Float32(v) => OwnedScalarValue::Float32(v),
            Self::Float64(v) => OwnedScalarValue::Float64(v),
            Self::Utf8(v) => OwnedScalarValue::Utf8(Cow::Owned(v.into_owned())),
        }
    }

    /// Check that this value can live in a container of `datatype`.
    ///
    /// Nulls fit any type.
    pub fn check_type(&self, datatype: DataType) -> Result<()> {
        match self.datatype() {
            None => Ok(()),
            Some(actual) if actual == datatype => Ok(()),
            Some(actual) => Err(DbError::with_kind(
                ErrorKind::TypeMismatch,
                "Scalar value does not match expected type",
            )
            .with_field("expected", datatype)
            .with_field("got", actual)),
        }
    }

    /// Create a constant array of `len` rows holding this value.
    pub fn as_array(&self, datatype: DataType, len: usize) -> Result<Array> {
        Array::new_constant(datatype, self, len)
    }

    /// Numeric value widened to f64.
    pub fn try_as_f64(&self) -> Result<f64> {
        match self {
            Self::Int8(v) => Ok(*v as f64),
            Self::Int16(v) => Ok(*v as f64),
            Self::Int32(v) => Ok(*v as f64),
            Self::Int64(v) => Ok(*v as f64),
            Self::UInt8(v) => Ok(*v as f64),
            Self::UInt16(v) => Ok(*v as f64),
            Self::UInt32(v) => Ok(*v as f64),
            Self::UInt64(v) => Ok(*v as f64),
            Self::Float32(v) => Ok(*v as f64),
            Self::Float64(v) => Ok(*v),
            other => Err(DbError::with_kind(
                ErrorKind::UnsupportedType,
                format!("Not a numeric value: {other}"),
            )),
        }
    }

    /// Parse a string into a scalar of the given type.
    ///
    /// The empty string parses to `Null` for every type except Utf8.
    pub fn try_parse(s: &str, datatype: DataType) -> Result<OwnedScalarValue> {
        fn parse<T: std::str::FromStr>(s: &str, datatype: DataType) -> Result<T> {
            s.trim().parse::<T>().map_err(|_| {
                DbError::with_kind(
                    ErrorKind::Parse,
                    format!("Failed to parse '{s}' as {datatype}"),
                )
            })
        }

        if s.is_empty() && datatype != DataType::Utf8 {
            return Ok(OwnedScalarValue::Null);
        }

        Ok(match datatype {
            DataType::Boolean => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => ScalarValue::Boolean(true),
                "false" | "f" | "0" => ScalarValue::Boolean(false),
                _ => {
                    return Err(DbError::with_kind(
                        ErrorKind::Parse,
                        format!("Failed to parse '{s}' as Boolean"),
                    ));
                }
            },
            DataType::Int8 => ScalarValue::Int8(parse(s, datatype)?),
            DataType::Int16 => ScalarValue::Int16(parse(s, datatype)?),
            DataType::Int32 => ScalarValue::Int32(parse(s, datatype)?),
            DataType::Int64 => ScalarValue::Int64(parse(s, datatype)?),
            DataType::UInt8 => ScalarValue::UInt8(parse(s, datatype)?),
            DataType::UInt16 => ScalarValue::UInt16(parse(s, datatype)?),
            DataType::UInt32 => ScalarValue::UInt32(parse(s, datatype)?),
            DataType::UInt64 => ScalarValue::UInt64(parse(s, datatype)?),
            DataType::Float32 => ScalarValue::Float32(parse(s, datatype)?),
            DataType::Float64 => ScalarValue::Float64(parse(s, datatype)?),
            DataType::Utf8 => ScalarValue::Utf8(Cow::Owned(s.to_string())),
        })
    }
}

impl fmt::Display for ScalarValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_scalar_from {
    ($prim:ty, $variant:ident) => {
        impl From<$prim> for ScalarValue<'_> {
            fn from(value: $prim) -> Self {
                ScalarValue::$variant(value)
            }
        }
    };
}

impl_scalar_from!(bool, Boolean);
impl_scalar_from!(i8, Int8);
impl_scalar_from!(i16, Int16);
impl_scalar_from!(i32, Int32);
impl_scalar_from!(i64, Int64);
impl_scalar_from!(u8, UInt8);
impl_scalar_from!(u16, UInt16);
impl_scalar_from!(u32, UInt32);
impl_scalar_from!(u64, UInt64);
impl_scalar_from!(f32, Float32);
impl_scalar_from!(f64, Float64);

impl<'a> From<&'a str> for ScalarValue<'a> {
    fn from(value: &'a str) -> Self {
        ScalarValue::Utf8(Cow::Borrowed(value))
    }
}

impl From<String> for ScalarValue<'_> {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(Cow::Owned(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_typed() {
        assert_eq!(
            ScalarValue::Int32(21),
            ScalarValue::try_parse(" 21", DataType::Int32).unwrap()
        );
        assert_eq!(
            ScalarValue::Float64(21.5),
            ScalarValue::try_parse("21.5", DataType::Float64).unwrap()
        );
        assert_eq!(
            ScalarValue::Null,
            ScalarValue::try_parse("", DataType::Int64).unwrap()
        );
        assert_eq!(
            ScalarValue::from(""),
            ScalarValue::try_parse("", DataType::Utf8).unwrap()
        );
    }

    #[test]
    fn parse_failure() {
        let err = ScalarValue::try_parse("abc", DataType::Int32).unwrap_err();
        assert_eq!(ErrorKind::Parse, err.kind());
    }

    #[test]
    fn check_type() {
        ScalarValue::Null.check_type(DataType::Utf8).unwrap();
        ScalarValue::Int32(4).check_type(DataType::Int32).unwrap();
        let err = ScalarValue::Int32(4)
            .check_type(DataType::Float64)
            .unwrap_err();
        assert_eq!(ErrorKind::TypeMismatch, err.kind());
    }

    #[test]
    fn widen_to_f64() {
        assert_eq!(3.0, ScalarValue::UInt8(3).try_as_f64().unwrap());
        assert_eq!(
            ErrorKind::UnsupportedType,
            ScalarValue::Boolean(true).try_as_f64().unwrap_err().kind()
        );
    }
}
