use std::sync::Arc;

use crate::arrays::array::ArrayData;
use crate::arrays::array::storage::{PrimitiveStorage, StringStorage};
use crate::arrays::bitmap::Bitmap;

/// Small wrapper containing the array buffer we're building up and an index
/// for where to write a value to.
#[derive(Debug)]
pub struct OutputBuffer<'a, B> {
    /// Index in the buffer we're writing to.
    ///
    /// Corresponds to the logical index in the input arrays.
    pub(crate) idx: usize,
    pub(crate) buffer: &'a mut B,
    pub(crate) validity: &'a mut Bitmap,
}

impl<B> OutputBuffer<'_, B>
where
    B: ArrayDataBuffer,
{
    pub fn put(&mut self, val: &B::Type) {
        self.buffer.put(self.idx, val)
    }

    /// Mark the current output row as null.
    pub fn put_null(&mut self) {
        self.validity.set_unchecked(self.idx, false)
    }
}

/// Pre-allocated buffer for arbitrarily putting values into.
pub trait ArrayDataBuffer {
    type Type: ?Sized;

    fn with_len(len: usize) -> Self
    where
        Self: Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Put a value at `idx`. Guaranteed to be in bounds according to `len`.
    fn put(&mut self, idx: usize, val: &Self::Type);

    fn into_data(self) -> ArrayData;
}

#[derive(Debug)]
pub struct PrimitiveBuffer<T> {
    pub(crate) values: Vec<T>,
}

impl<T> ArrayDataBuffer for PrimitiveBuffer<T>
where
    T: Default + Copy,
    ArrayData: From<PrimitiveStorage<T>>,
{
    type Type = T;

    fn with_len(len: usize) -> Self {
        PrimitiveBuffer {
            values: vec![T::default(); len],
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn put(&mut self, idx: usize, val: &Self::Type) {
        self.values[idx] = *val
    }

    fn into_data(self) -> ArrayData {
        PrimitiveStorage::from(self.values).into()
    }
}

pub type BooleanBuffer = PrimitiveBuffer<bool>;

#[derive(Debug)]
pub struct StringBuffer {
    storage: StringStorage,
}

impl ArrayDataBuffer for StringBuffer {
    type Type = str;

    fn with_len(len: usize) -> Self {
        StringBuffer {
            storage: StringStorage {
                spans: vec![(0, 0); len],
                data: String::new(),
            },
        }
    }

    fn len(&self) -> usize {
        self.storage.spans.len()
    }

    fn put(&mut self, idx: usize, val: &Self::Type) {
        let offset = self.storage.data.len();
        self.storage.data.push_str(val);
        self.storage.spans[idx] = (offset, val.len());
    }

    fn into_data(self) -> ArrayData {
        ArrayData::Utf8(Arc::new(self.storage))
    }
}

macro_rules! impl_from_primitive_storage {
    ($prim:ty, $variant:ident) => {
        impl From<PrimitiveStorage<$prim>> for ArrayData {
            fn from(value: PrimitiveStorage<$prim>) -> Self {
                ArrayData::$variant(Arc::new(value))
            }
        }
    };
}

impl_from_primitive_storage!(bool, Boolean);
impl_from_primitive_storage!(i8, Int8);
impl_from_primitive_storage!(i16, Int16);
impl_from_primitive_storage!(i32, Int32);
impl_from_primitive_storage!(i64, Int64);
impl_from_primitive_storage!(u8, UInt8);
impl_from_primitive_storage!(u16, UInt16);
impl_from_primitive_storage!(u32, UInt32);
impl_from_primitive_storage!(u64, UInt64);
impl_from_primitive_storage!(f32, Float32);
impl_from_primitive_storage!(f64, Float64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_buffer_out_of_order() {
        let mut buf = StringBuffer::with_len(3);
        buf.put(2, "c");
        buf.put(0, "aa");

        let data = buf.into_data();
        let ArrayData::Utf8(storage) = data else {
            panic!("expected utf8 data");
        };
        assert_eq!(Some("aa"), storage.get(0));
        assert_eq!(Some(""), storage.get(1));
        assert_eq!(Some("c"), storage.get(2));
    }

    #[test]
    fn primitive_buffer_put() {
        let mut buf = PrimitiveBuffer::<i32>::with_len(2);
        buf.put(1, &7);
        assert_eq!(vec![0, 7], buf.values);
    }
}
