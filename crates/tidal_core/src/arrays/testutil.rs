//! Test utilities.
//!
//! Note this this isn't behind a `#[cfg(test)]` flag since this should be
//! usable outside of this crate.
//!
//! Should not be used outside of tests.

use std::sync::Arc;

use super::array::Array;
use super::batch::Batch;
use super::field::{Field, Schema};

/// Asserts that two arrays are logically equal.
///
/// Flat and constant arrays holding the same values compare equal.
pub fn assert_arrays_eq(a: &Array, b: &Array) {
    assert_eq!(a.datatype(), b.datatype(), "data types differ");
    assert_eq!(a.logical_len(), b.logical_len(), "logical lengths differ");

    for row_idx in 0..a.logical_len() {
        let a_val = a.logical_value(row_idx).unwrap();
        let b_val = b.logical_value(row_idx).unwrap();

        assert_eq!(a_val, b_val, "values differ at row {row_idx}");
    }
}

/// Asserts that two batches are logically equal, including schema.
pub fn assert_batches_eq(a: &Batch, b: &Batch) {
    assert_eq!(a.schema(), b.schema(), "schemas differ");
    assert_eq!(a.num_rows(), b.num_rows(), "num rows differ");
    assert_eq!(a.num_columns(), b.num_columns(), "num columns differ");

    for col_idx in 0..a.num_columns() {
        let a_col = a.column(col_idx).unwrap();
        let b_col = b.column(col_idx).unwrap();

        assert_arrays_eq(a_col, b_col);
    }
}

/// Asserts two batches hold the same rows, ignoring row order.
pub fn assert_batches_eq_unordered(a: &Batch, b: &Batch) {
    assert_eq!(a.schema(), b.schema(), "schemas differ");
    assert_eq!(a.num_rows(), b.num_rows(), "num rows differ");

    let mut a_rows = sorted_rows(a);
    let mut b_rows = sorted_rows(b);
    a_rows.sort();
    b_rows.sort();

    assert_eq!(a_rows, b_rows);
}

fn sorted_rows(batch: &Batch) -> Vec<String> {
    (0..batch.num_rows())
        .map(|idx| {
            batch
                .row(idx)
                .unwrap()
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect()
}

/// Build a batch from named arrays.
pub fn batch_from_columns<S: Into<String>>(columns: impl IntoIterator<Item = (S, Array)>) -> Batch {
    let (fields, arrays): (Vec<_>, Vec<_>) = columns
        .into_iter()
        .map(|(name, arr)| (Field::new(name, arr.datatype()), Arc::new(arr)))
        .unzip();

    Batch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

/// Helper for generating a batch from named column values.
///
/// ```text
/// generate_batch!(("a", [1, 2, 3]), ("b", ["x", "y", "z"]))
/// ```
#[macro_export]
macro_rules! generate_batch {
    ( $( ($name:expr, $array_values:expr) ),+ $(,)? ) => {{
        use $crate::arrays::array::Array;
        $crate::arrays::testutil::batch_from_columns([
            $( ($name, Array::from_iter($array_values)), )+
        ])
    }};
}
