use std::hash::{Hash, Hasher};

use crate::arrays::scalar::{OwnedScalarValue, ScalarValue};

/// Values of the group expressions for a single row.
///
/// Equality compares the full tuple by type and value. Floats compare by bit
/// pattern so NaN groups with NaN. Nulls group together.
#[derive(Debug, Clone)]
pub struct GroupKey {
    values: Vec<OwnedScalarValue>,
}

impl GroupKey {
    pub fn new(values: Vec<OwnedScalarValue>) -> Self {
        GroupKey { values }
    }

    pub fn values(&self) -> &[OwnedScalarValue] {
        &self.values
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| value_eq(a, b))
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.values.len());
        for value in &self.values {
            hash_value(value, state);
        }
    }
}

fn value_eq(a: &ScalarValue, b: &ScalarValue) -> bool {
    match (a, b) {
        (ScalarValue::Float32(a), ScalarValue::Float32(b)) => a.to_bits() == b.to_bits(),
        (ScalarValue::Float64(a), ScalarValue::Float64(b)) => a.to_bits() == b.to_bits(),
        (a, b) => a == b,
    }
}

fn hash_value<H: Hasher>(value: &ScalarValue, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        ScalarValue::Null => (),
        ScalarValue::Boolean(v) => v.hash(state),
        ScalarValue::Int8(v) => v.hash(state),
        ScalarValue::Int16(v) => v.hash(state),
        ScalarValue::Int32(v) => v.hash(state),
        ScalarValue::Int64(v) => v.hash(state),
        ScalarValue::UInt8(v) => v.hash(state),
        ScalarValue::UInt16(v) => v.hash(state),
        ScalarValue::UInt32(v) => v.hash(state),
        ScalarValue::UInt64(v) => v.hash(state),
        ScalarValue::Float32(v) => v.to_bits().hash(state),
        ScalarValue::Float64(v) => v.to_bits().hash(state),
        ScalarValue::Utf8(v) => v.as_ref().hash(state),
    }
}

#[cfg(test)]
mod tests {
    use std::hash::BuildHasher;

    use super::*;
    use crate::execution::operators::hash_aggregate::RANDOM_STATE;

    fn key(values: Vec<OwnedScalarValue>) -> GroupKey {
        GroupKey::new(values)
    }

    #[test]
    fn tuple_equality() {
        let a = key(vec![ScalarValue::from("a|b"), ScalarValue::from("c")]);
        let b = key(vec![ScalarValue::from("a"), ScalarValue::from("b|c")]);
        assert_ne!(a, b);

        let c = key(vec![ScalarValue::from("a|b"), ScalarValue::from("c")]);
        assert_eq!(a, c);
        assert_eq!(RANDOM_STATE.hash_one(&a), RANDOM_STATE.hash_one(&c));
    }

    #[test]
    fn types_distinguish() {
        let a = key(vec![ScalarValue::Int32(1)]);
        let b = key(vec![ScalarValue::Int64(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn nan_groups_with_nan() {
        let a = key(vec![ScalarValue::Float64(f64::NAN)]);
        let b = key(vec![ScalarValue::Float64(f64::NAN)]);
        assert_eq!(a, b);
        assert_eq!(RANDOM_STATE.hash_one(&a), RANDOM_STATE.hash_one(&b));
    }

    #[test]
    fn nulls_group_together() {
        let a = key(vec![ScalarValue::Null, ScalarValue::Int32(4)]);
        let b = key(vec![ScalarValue::Null, ScalarValue::Int32(4)]);
        assert_eq!(a, b);
    }
}
