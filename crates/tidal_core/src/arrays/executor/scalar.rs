//! Scalar executors for generic vectorized execution over different types of
//! arrays.
//!
//! Explicit generic typing is used so each operation gets monomorphized per
//! physical type. The type check happens once when grabbing the storage.

use tidal_error::{DbError, ErrorKind, Result};

use super::builder::{ArrayDataBuffer, OutputBuffer};
use crate::arrays::array::Array;
use crate::arrays::array::physical_type::PhysicalStorage;
use crate::arrays::array::storage::AddressableStorage;
use crate::arrays::bitmap::Bitmap;
use crate::arrays::datatype::DataType;

/// Execute an operation on a single array.
#[derive(Debug, Clone, Copy)]
pub struct UnaryExecutor;

impl UnaryExecutor {
    /// Visit every logical row, passing `None` for null rows.
    pub fn for_each<S, Op>(array: &Array, mut op: Op) -> Result<()>
    where
        S: PhysicalStorage,
        Op: FnMut(usize, Option<&S::StorageType>),
    {
        let storage = S::get_storage(array.array_data())?;

        for idx in 0..array.logical_len() {
            let phys = array.physical_index(idx);
            if array.is_physical_valid(phys) {
                let val = storage.get(phys).ok_or_else(|| missing_value(phys))?;
                op(idx, Some(val));
            } else {
                op(idx, None);
            }
        }

        Ok(())
    }
}

/// Execute an operation on two arrays.
#[derive(Debug, Clone, Copy)]
pub struct BinaryExecutor;

impl BinaryExecutor {
    /// Apply `op` row by row, producing an array of `datatype`.
    ///
    /// A row is null in the output if it's null in either input, or if `op`
    /// calls `put_null`. When both inputs are constant the operation runs
    /// once and the output is constant too.
    pub fn execute<S1, S2, B, Op>(
        array1: &Array,
        array2: &Array,
        datatype: DataType,
        mut op: Op,
    ) -> Result<Array>
    where
        S1: PhysicalStorage,
        S2: PhysicalStorage,
        B: ArrayDataBuffer,
        Op: FnMut(&S1::StorageType, &S2::StorageType, &mut OutputBuffer<'_, B>),
    {
        let len = array1.logical_len();
        if len != array2.logical_len() {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Differing lengths of arrays",
            )
            .with_field("left", len)
            .with_field("right", array2.logical_len()));
        }

        let input1 = S1::get_storage(array1.array_data())?;
        let input2 = S2::get_storage(array2.array_data())?;

        let both_constant = array1.is_constant() && array2.is_constant();
        let out_len = if both_constant { 1 } else { len };

        let mut buffer = B::with_len(out_len);
        let mut validity = Bitmap::new_with_all_true(out_len);

        for idx in 0..out_len {
            let idx1 = array1.physical_index(idx);
            let idx2 = array2.physical_index(idx);

            if !array1.is_physical_valid(idx1) || !array2.is_physical_valid(idx2) {
                validity.set_unchecked(idx, false);
                continue;
            }

            let val1 = input1.get(idx1).ok_or_else(|| missing_value(idx1))?;
            let val2 = input2.get(idx2).ok_or_else(|| missing_value(idx2))?;

            op(
                val1,
                val2,
                &mut OutputBuffer {
                    idx,
                    buffer: &mut buffer,
                    validity: &mut validity,
                },
            );
        }

        let mut array = Array::try_new(datatype, Some(validity), buffer.into_data())?;
        if both_constant {
            array.constant_len = Some(len);
        }

        Ok(array)
    }
}

fn missing_value(idx: usize) -> DbError {
    DbError::new("Missing value in array storage").with_field("index", idx)
}
