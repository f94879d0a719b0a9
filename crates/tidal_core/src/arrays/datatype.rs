use std::fmt;

use serde::{Deserialize, Serialize};
use tidal_error::{DbError, ErrorKind, Result};

use super::array::physical_type::PhysicalType;

/// Logical type of a column or scalar.
///
/// The set is closed. Every operation that dispatches on type matches on
/// this enum explicitly and errors on the types it doesn't handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
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

impl DataType {
    pub const fn physical_type(&self) -> PhysicalType {
        match self {
            Self::Boolean => PhysicalType::Boolean,
            Self::Int8 => PhysicalType::Int8,
            Self::Int16 => PhysicalType::Int16,
            Self::Int32 => PhysicalType::Int32,
            Self::Int64 => PhysicalType::Int64,
            Self::UInt8 => PhysicalType::UInt8,
            Self::UInt16 => PhysicalType::UInt16,
            Self::UInt32 => PhysicalType::UInt32,
            Self::UInt64 => PhysicalType::UInt64,
            Self::Float32 => PhysicalType::Float32,
            Self::Float64 => PhysicalType::Float64,
            Self::Utf8 => PhysicalType::Utf8,
        }
    }

    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

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

    /// Parse a type name, case insensitive.
    ///
    /// Accepts the display names along with a few common aliases
    /// (`int`, `bigint`, `double`, `text`, ...).
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name.trim().to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Self::Boolean,
            "int8" | "tinyint" => Self::Int8,
            "int16" | "smallint" => Self::Int16,
            "int32" | "int" | "integer" => Self::Int32,
            "int64" | "bigint" | "long" => Self::Int64,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "uint64" => Self::UInt64,
            "float32" | "float" | "real" => Self::Float32,
            "float64" | "double" => Self::Float64,
            "utf8" | "string" | "text" | "varchar" => Self::Utf8,
            other => {
                return Err(DbError::with_kind(
                    ErrorKind::Parse,
                    format!("Unknown data type '{other}'"),
                ));
            }
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!(DataType::Int32, DataType::from_name("INT").unwrap());
        assert_eq!(DataType::Float64, DataType::from_name(" double ").unwrap());
        assert_eq!(DataType::Utf8, DataType::from_name("Utf8").unwrap());
        assert_eq!(
            ErrorKind::Parse,
            DataType::from_name("decimal").unwrap_err().kind()
        );
    }

    #[test]
    fn numeric_classification() {
        assert!(DataType::UInt16.is_numeric());
        assert!(DataType::Float32.is_float());
        assert!(!DataType::Boolean.is_numeric());
        assert!(!DataType::Utf8.is_integer());
    }
}
