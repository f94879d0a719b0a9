use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tidal_error::{DbError, ErrorKind, Result};

use crate::arrays::array::physical_type::{PhysicalBool, PhysicalStorage};
use crate::arrays::array::{Array, ArrayData};
use crate::arrays::bitmap::Bitmap;
use crate::arrays::datatype::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConjunctionOperator {
    And,
    Or,
}

impl fmt::Display for ConjunctionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// Three-valued AND/OR over boolean arrays.
///
/// `false AND NULL` is false and `true OR NULL` is true. Every other
/// combination involving a null is null.
pub fn conjunction(op: ConjunctionOperator, left: &Array, right: &Array) -> Result<Array> {
    for arr in [left, right] {
        if arr.datatype() != DataType::Boolean {
            return Err(DbError::with_kind(
                ErrorKind::UnsupportedType,
                format!("{op} requires boolean inputs"),
            )
            .with_field("got", arr.datatype()));
        }
    }

    let len = left.logical_len();
    if len != right.logical_len() {
        return Err(DbError::with_kind(
            ErrorKind::InvariantViolation,
            "Differing lengths of arrays",
        )
        .with_field("left", len)
        .with_field("right", right.logical_len()));
    }

    let left_vals = PhysicalBool::get_storage(left.array_data())?;
    let right_vals = PhysicalBool::get_storage(right.array_data())?;

    let value_at = |arr: &Array, vals: &[bool], idx: usize| {
        let idx = arr.physical_index(idx);
        if arr.is_physical_valid(idx) {
            Some(vals[idx])
        } else {
            None
        }
    };

    let mut values = Vec::with_capacity(len);
    let mut validity = Bitmap::new_with_all_true(len);

    for idx in 0..len {
        let l = value_at(left, left_vals, idx);
        let r = value_at(right, right_vals, idx);

        let out = match op {
            ConjunctionOperator::And => match (l, r) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            ConjunctionOperator::Or => match (l, r) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
        };

        match out {
            Some(v) => values.push(v),
            None => {
                values.push(false);
                validity.set_unchecked(idx, false);
            }
        }
    }

    Array::try_new(
        DataType::Boolean,
        Some(validity),
        ArrayData::Boolean(Arc::new(values.into())),
    )
}
