use std::fmt;

use serde::{Deserialize, Serialize};
use tidal_error::{DbError, ErrorKind, Result};

use super::datatype::DataType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub datatype: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Field {
            name: name.into(),
            datatype,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.datatype)
    }
}

/// Ordered list of fields.
///
/// Names are not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        Schema {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Schema { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn datatypes(&self) -> impl Iterator<Item = DataType> + '_ {
        self.fields.iter().map(|f| f.datatype)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Index of the first field with the given name.
    pub fn find_index(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| {
                DbError::with_kind(
                    ErrorKind::SchemaResolution,
                    format!("Missing column '{name}'"),
                )
                .with_field("available", self.names().collect::<Vec<_>>().join(", "))
            })
    }

    /// Select fields by name.
    ///
    /// Returns the selected schema along with each selected field's index in
    /// this schema. Fields come back in the order they were requested. A name
    /// shared by several fields selects all of them, in schema order.
    ///
    /// An empty list of names selects every field. Names with no matching
    /// field are skipped.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> (Schema, Vec<usize>) {
        if names.is_empty() {
            return (self.clone(), (0..self.fields.len()).collect());
        }

        let mut fields = Vec::with_capacity(names.len());
        let mut indices = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref();
            for (idx, field) in self.fields.iter().enumerate() {
                if field.name == name {
                    fields.push(field.clone());
                    indices.push(idx);
                }
            }
        }

        (Schema { fields }, indices)
    }

    /// Like `select`, but every name must resolve.
    ///
    /// Used when resolving a scan projection, where an unknown column is a
    /// plan error rather than something to skip.
    pub fn try_select<S: AsRef<str>>(&self, names: &[S]) -> Result<(Schema, Vec<usize>)> {
        for name in names {
            let name = name.as_ref();
            if !self.fields.iter().any(|f| f.name == name) {
                return Err(DbError::with_kind(
                    ErrorKind::SchemaResolution,
                    format!("Cannot select missing column '{name}'"),
                )
                .with_field("available", self.names().collect::<Vec<_>>().join(", ")));
            }
        }
        Ok(self.select(names))
    }

    /// Project by positional indices.
    pub fn try_project(&self, indices: &[usize]) -> Result<Schema> {
        let fields = indices
            .iter()
            .map(|&idx| {
                self.fields.get(idx).cloned().ok_or_else(|| {
                    DbError::with_kind(ErrorKind::IndexError, "Field index out of range")
                        .with_field("index", idx)
                        .with_field("num_fields", self.fields.len())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Schema { fields })
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cars() -> Schema {
        Schema::new([
            Field::new("model", DataType::Utf8),
            Field::new("mpg", DataType::Float64),
            Field::new("cyl", DataType::Int32),
        ])
    }

    #[test]
    fn select_empty_is_identity() {
        let (schema, indices) = cars().select::<&str>(&[]);
        assert_eq!(cars(), schema);
        assert_eq!(vec![0, 1, 2], indices);
    }

    #[test]
    fn select_in_request_order() {
        let (schema, indices) = cars().select(&["cyl", "model"]);
        assert_eq!(vec![2, 0], indices);
        assert_eq!(vec!["cyl", "model"], schema.names().collect::<Vec<_>>());
    }

    #[test]
    fn select_duplicate_names_selects_all() {
        let schema = Schema::new([
            Field::new("a", DataType::Int32),
            Field::new("b", DataType::Int32),
            Field::new("a", DataType::Utf8),
        ]);

        let (selected, indices) = schema.select(&["a"]);
        assert_eq!(vec![0, 2], indices);
        assert_eq!(DataType::Utf8, selected.fields[1].datatype);
    }

    #[test]
    fn select_skips_missing_names() {
        let (schema, indices) = cars().select(&["hp", "mpg"]);
        assert_eq!(vec![1], indices);
        assert_eq!(vec!["mpg"], schema.names().collect::<Vec<_>>());
    }

    #[test]
    fn try_select_missing_name() {
        let err = cars().try_select(&["mpg", "hp"]).unwrap_err();
        assert_eq!(ErrorKind::SchemaResolution, err.kind());

        let (schema, indices) = cars().try_select(&["cyl", "model"]).unwrap();
        assert_eq!(vec![2, 0], indices);
        assert_eq!(cars().select(&["cyl", "model"]).0, schema);
    }

    #[test]
    fn project_out_of_range() {
        let err = cars().try_project(&[0, 5]).unwrap_err();
        assert_eq!(ErrorKind::IndexError, err.kind());
    }

    #[test]
    fn display() {
        assert_eq!("[model: Utf8, mpg: Float64, cyl: Int32]", cars().to_string());
    }
}
