use std::sync::Arc;

use tidal_error::{DbError, ErrorKind, Result};

use super::array::Array;
use super::bitmap::Bitmap;
use super::field::Schema;
use super::scalar::ScalarValue;

/// A batch of same-length arrays along with the schema describing them.
///
/// Immutable. Operators that transform a batch produce a new batch, columns
/// that pass through unchanged are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    schema: Arc<Schema>,
    /// Arrays making up the batch, one per schema field.
    arrays: Vec<Arc<Array>>,
    /// Number of logical rows in every array.
    num_rows: usize,
}

impl Batch {
    /// Create a new batch.
    ///
    /// Errors if there are no columns, if the number of arrays doesn't match
    /// the number of fields, if an array's type differs from its field, or if
    /// the arrays have differing lengths.
    pub fn try_new(schema: Arc<Schema>, arrays: Vec<Arc<Array>>) -> Result<Self> {
        if arrays.is_empty() {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Batch requires at least one column",
            ));
        }

        if arrays.len() != schema.len() {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Number of arrays does not match number of fields",
            )
            .with_field("arrays", arrays.len())
            .with_field("fields", schema.len()));
        }

        let num_rows = arrays[0].logical_len();
        for (idx, (array, field)) in arrays.iter().zip(&schema.fields).enumerate() {
            if array.datatype() != field.datatype {
                return Err(DbError::with_kind(
                    ErrorKind::InvariantViolation,
                    "Array type does not match field type",
                )
                .with_field("column", idx)
                .with_field("field", field)
                .with_field("array", array.datatype()));
            }

            if array.logical_len() != num_rows {
                return Err(DbError::with_kind(
                    ErrorKind::InvariantViolation,
                    "Expected all arrays to have the same length",
                )
                .with_field("column", idx)
                .with_field("expected", num_rows)
                .with_field("got", array.logical_len()));
            }
        }

        Ok(Batch {
            schema,
            arrays,
            num_rows,
        })
    }

    /// Like `try_new` but takes owned arrays.
    pub fn try_from_arrays(
        schema: Arc<Schema>,
        arrays: impl IntoIterator<Item = Array>,
    ) -> Result<Self> {
        Self::try_new(schema, arrays.into_iter().map(Arc::new).collect())
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.arrays.len()
    }

    pub fn column(&self, idx: usize) -> Option<&Arc<Array>> {
        self.arrays.get(idx)
    }

    /// Get a column, erroring if out of range.
    pub fn get_column(&self, idx: usize) -> Result<&Arc<Array>> {
        self.arrays.get(idx).ok_or_else(|| {
            DbError::with_kind(ErrorKind::IndexError, "Column index out of range")
                .with_field("index", idx)
                .with_field("num_columns", self.arrays.len())
        })
    }

    pub fn columns(&self) -> &[Arc<Array>] {
        &self.arrays
    }

    /// Get all values for a single row.
    pub fn row(&self, idx: usize) -> Result<Vec<ScalarValue<'_>>> {
        self.arrays
            .iter()
            .map(|arr| arr.logical_value(idx))
            .collect()
    }

    /// Keep rows where `selection` is set. The schema is unchanged.
    pub fn select(&self, selection: &Bitmap) -> Result<Self> {
        let arrays = self
            .arrays
            .iter()
            .map(|arr| arr.filter(selection).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        Ok(Batch {
            schema: self.schema.clone(),
            arrays,
            num_rows: selection.count_trues(),
        })
    }

    pub fn slice(&self, offset: usize, count: usize) -> Result<Self> {
        let arrays = self
            .arrays
            .iter()
            .map(|arr| arr.slice(offset, count).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        Ok(Batch {
            schema: self.schema.clone(),
            arrays,
            num_rows: count,
        })
    }

    /// Project columns by index. Arrays are shared, not copied.
    pub fn project(&self, indices: &[usize]) -> Result<Self> {
        let schema = self.schema.try_project(indices)?;
        let arrays = indices
            .iter()
            .map(|&idx| self.get_column(idx).cloned())
            .collect::<Result<Vec<_>>>()?;

        Self::try_new(Arc::new(schema), arrays)
    }
}
