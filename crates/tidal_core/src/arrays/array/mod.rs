pub mod physical_type;
pub mod storage;

use std::borrow::Cow;
use std::sync::Arc;

use physical_type::PhysicalType;
use storage::{PrimitiveStorage, StringStorage};
use tidal_error::{DbError, ErrorKind, Result};

use super::bitmap::Bitmap;
use super::datatype::DataType;
use super::scalar::ScalarValue;

/// An immutable column of values of a single type.
///
/// An array is either flat (one physical value per row, with an optional
/// validity mask) or constant (a single physical value broadcast to
/// `constant_len` rows). Constant arrays never allocate per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub(crate) datatype: DataType,
    /// Validity of the physical values. `None` means all valid.
    pub(crate) validity: Option<Arc<Bitmap>>,
    pub(crate) data: ArrayData,
    /// Logical length when this array is a constant.
    pub(crate) constant_len: Option<usize>,
}

impl Array {
    /// Create a flat array, checking that the data matches the type and the
    /// validity mask covers every value.
    pub fn try_new(datatype: DataType, validity: Option<Bitmap>, data: ArrayData) -> Result<Self> {
        if datatype.physical_type() != data.physical_type() {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Array data not valid for data type",
            )
            .with_field("datatype", datatype)
            .with_field("physical_type", data.physical_type()));
        }

        if let Some(validity) = &validity {
            if validity.len() != data.len() {
                return Err(DbError::with_kind(
                    ErrorKind::InvariantViolation,
                    "Validity length does not match data length",
                )
                .with_field("validity", validity.len())
                .with_field("data", data.len()));
            }
        }

        Ok(Self::new_unchecked(datatype, validity, data))
    }

    /// Caller guarantees the data's physical type matches `datatype` and the
    /// validity (if any) has the same length as the data.
    pub(crate) fn new_unchecked(
        datatype: DataType,
        validity: Option<Bitmap>,
        data: ArrayData,
    ) -> Self {
        // Keep arrays without nulls cheap to check.
        let validity = validity.filter(|v| !v.is_all_true()).map(Arc::new);
        Array {
            datatype,
            validity,
            data,
            constant_len: None,
        }
    }

    /// Create an array with `value` repeated `len` times.
    pub fn new_constant(datatype: DataType, value: &ScalarValue, len: usize) -> Result<Self> {
        let single = Self::try_from_scalars(datatype, std::iter::once(value.clone()))?;
        Ok(Array {
            constant_len: Some(len),
            ..single
        })
    }

    /// Create a typed array with every row null.
    pub fn new_typed_null_array(datatype: DataType, len: usize) -> Self {
        Array {
            datatype,
            validity: Some(Arc::new(Bitmap::new_with_all_false(1))),
            data: ArrayData::zeroed(datatype, 1),
            constant_len: Some(len),
        }
    }

    /// Build a flat array from scalars.
    ///
    /// Every non-null value must have exactly `datatype`.
    pub fn try_from_scalars<'a>(
        datatype: DataType,
        scalars: impl IntoIterator<Item = ScalarValue<'a>>,
    ) -> Result<Self> {
        let iter = scalars.into_iter();
        let (lower, _) = iter.size_hint();
        let mut validity = Bitmap::default();

        let mismatch = |got: &ScalarValue| {
            DbError::with_kind(
                ErrorKind::TypeMismatch,
                "Scalar value does not match array type",
            )
            .with_field("expected", datatype)
            .with_field(
                "got",
                got.datatype().map(|d| d.to_string()).unwrap_or_default(),
            )
        };

        macro_rules! collect_primitive {
            ($variant:ident) => {{
                let mut values = Vec::with_capacity(lower);
                for scalar in iter {
                    match scalar {
                        ScalarValue::Null => {
                            values.push(Default::default());
                            validity.push(false);
                        }
                        ScalarValue::$variant(v) => {
                            values.push(v);
                            validity.push(true);
                        }
                        other => return Err(mismatch(&other)),
                    }
                }
                ArrayData::$variant(Arc::new(values.into()))
            }};
        }

        let data = match datatype {
            DataType::Boolean => collect_primitive!(Boolean),
            DataType::Int8 => collect_primitive!(Int8),
            DataType::Int16 => collect_primitive!(Int16),
            DataType::Int32 => collect_primitive!(Int32),
            DataType::Int64 => collect_primitive!(Int64),
            DataType::UInt8 => collect_primitive!(UInt8),
            DataType::UInt16 => collect_primitive!(UInt16),
            DataType::UInt32 => collect_primitive!(UInt32),
            DataType::UInt64 => collect_primitive!(UInt64),
            DataType::Float32 => collect_primitive!(Float32),
            DataType::Float64 => collect_primitive!(Float64),
            DataType::Utf8 => {
                let mut storage = StringStorage::with_capacity(lower, 0);
                for scalar in iter {
                    match scalar {
                        ScalarValue::Null => {
                            storage.push("");
                            validity.push(false);
                        }
                        ScalarValue::Utf8(v) => {
                            storage.push(&v);
                            validity.push(true);
                        }
                        other => return Err(mismatch(&other)),
                    }
                }
                ArrayData::Utf8(Arc::new(storage))
            }
        };

        Ok(Self::new_unchecked(datatype, Some(validity), data))
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.data.physical_type()
    }

    pub fn logical_len(&self) -> usize {
        match self.constant_len {
            Some(len) => len,
            None => self.data.len(),
        }
    }

    pub fn is_constant(&self) -> bool {
        self.constant_len.is_some()
    }

    /// Map a logical row to its physical value index.
    ///
    /// Does not bounds check.
    #[inline]
    pub fn physical_index(&self, idx: usize) -> usize {
        if self.constant_len.is_some() { 0 } else { idx }
    }

    /// Check validity of a physical index.
    #[inline]
    pub(crate) fn is_physical_valid(&self, idx: usize) -> bool {
        match &self.validity {
            Some(validity) => validity.value(idx),
            None => true,
        }
    }

    /// Validity of a logical row, `None` if out of bounds.
    pub fn is_valid(&self, idx: usize) -> Option<bool> {
        if idx >= self.logical_len() {
            return None;
        }
        Some(self.is_physical_valid(self.physical_index(idx)))
    }

    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_deref()
    }

    pub fn array_data(&self) -> &ArrayData {
        &self.data
    }

    /// Get the value at a logical index.
    pub fn logical_value(&self, idx: usize) -> Result<ScalarValue<'_>> {
        if idx >= self.logical_len() {
            return Err(DbError::with_kind(
                ErrorKind::IndexError,
                "Logical index out of bounds",
            )
            .with_field("index", idx)
            .with_field("len", self.logical_len()));
        }

        let idx = self.physical_index(idx);
        if !self.is_physical_valid(idx) {
            return Ok(ScalarValue::Null);
        }

        self.data.get_scalar(idx).ok_or_else(|| {
            DbError::new("Physical index out of bounds").with_field("index", idx)
        })
    }

    /// Select rows by logical index.
    ///
    /// Flat arrays copy the selected values, constant arrays just change
    /// their length.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Self> {
        let len = self.logical_len();
        if let Some(&bad) = rows.iter().find(|&&row| row >= len) {
            return Err(DbError::with_kind(
                ErrorKind::IndexError,
                "Selected row out of bounds",
            )
            .with_field("index", bad)
            .with_field("len", len));
        }

        if self.is_constant() {
            return Ok(Array {
                constant_len: Some(rows.len()),
                ..self.clone()
            });
        }

        let validity = self
            .validity
            .as_ref()
            .map(|v| rows.iter().map(|&row| v.value(row)).collect::<Bitmap>());

        Ok(Self::new_unchecked(
            self.datatype,
            validity,
            self.data.take(rows),
        ))
    }

    /// Keep rows where `selection` is set.
    pub fn filter(&self, selection: &Bitmap) -> Result<Self> {
        if selection.len() != self.logical_len() {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Selection length does not match array length",
            )
            .with_field("selection", selection.len())
            .with_field("array", self.logical_len()));
        }

        let rows: Vec<_> = selection.index_iter().collect();
        self.select_rows(&rows)
    }

    pub fn slice(&self, offset: usize, count: usize) -> Result<Self> {
        let rows: Vec<_> = (offset..offset + count).collect();
        self.select_rows(&rows)
    }
}

impl<F> FromIterator<Option<F>> for Array
where
    F: Default,
    Array: FromIterator<F>,
{
    fn from_iter<T: IntoIterator<Item = Option<F>>>(iter: T) -> Self {
        let mut validity = Bitmap::default();
        let vals: Vec<_> = iter
            .into_iter()
            .map(|v| {
                validity.push(v.is_some());
                v.unwrap_or_default()
            })
            .collect();

        let array = Array::from_iter(vals);
        Array::new_unchecked(array.datatype, Some(validity), array.data)
    }
}

impl<'a> FromIterator<&'a str> for Array {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let storage: StringStorage = iter.into_iter().collect();
        Array::new_unchecked(DataType::Utf8, None, ArrayData::Utf8(Arc::new(storage)))
    }
}

impl FromIterator<String> for Array {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let mut storage = StringStorage::default();
        for s in iter {
            storage.push(&s);
        }
        Array::new_unchecked(DataType::Utf8, None, ArrayData::Utf8(Arc::new(storage)))
    }
}

macro_rules! impl_primitive_from_iter {
    ($prim:ty, $variant:ident) => {
        impl FromIterator<$prim> for Array {
            fn from_iter<T: IntoIterator<Item = $prim>>(iter: T) -> Self {
                let vals: Vec<_> = iter.into_iter().collect();
                Array::new_unchecked(
                    DataType::$variant,
                    None,
                    ArrayData::$variant(Arc::new(vals.into())),
                )
            }
        }
    };
}

impl_primitive_from_iter!(bool, Boolean);
impl_primitive_from_iter!(i8, Int8);
impl_primitive_from_iter!(i16, Int16);
impl_primitive_from_iter!(i32, Int32);
impl_primitive_from_iter!(i64, Int64);
impl_primitive_from_iter!(u8, UInt8);
impl_primitive_from_iter!(u16, UInt16);
impl_primitive_from_iter!(u32, UInt32);
impl_primitive_from_iter!(u64, UInt64);
impl_primitive_from_iter!(f32, Float32);
impl_primitive_from_iter!(f64, Float64);

/// Physical values backing an array.
///
/// Cheap to clone, buffers are reference counted.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Boolean(Arc<PrimitiveStorage<bool>>),
    Int8(Arc<PrimitiveStorage<i8>>),
    Int16(Arc<PrimitiveStorage<i16>>),
    Int32(Arc<PrimitiveStorage<i32>>),
    Int64(Arc<PrimitiveStorage<i64>>),
    UInt8(Arc<PrimitiveStorage<u8>>),
    UInt16(Arc<PrimitiveStorage<u16>>),
    UInt32(Arc<PrimitiveStorage<u32>>),
    UInt64(Arc<PrimitiveStorage<u64>>),
    Float32(Arc<PrimitiveStorage<f32>>),
    Float64(Arc<PrimitiveStorage<f64>>),
    Utf8(Arc<StringStorage>),
}

/// Run `$body` against the storage of any primitive variant, or `$utf8`
/// against string storage.
macro_rules! match_data {
    ($data:expr, $s:ident => $body:expr, $u:ident => $utf8:expr) => {
        match $data {
            ArrayData::Boolean($s) => $body,
            ArrayData::Int8($s) => $body,
            ArrayData::Int16($s) => $body,
            ArrayData::Int32($s) => $body,
            ArrayData::Int64($s) => $body,
            ArrayData::UInt8($s) => $body,
            ArrayData::UInt16($s) => $body,
            ArrayData::UInt32($s) => $body,
            ArrayData::UInt64($s) => $body,
            ArrayData::Float32($s) => $body,
            ArrayData::Float64($s) => $body,
            ArrayData::Utf8($u) => $utf8,
        }
    };
}

impl ArrayData {
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            Self::Boolean(_) => PhysicalType::Boolean,
            Self::Int8(_) => PhysicalType::Int8,
            Self::Int16(_) => PhysicalType::Int16,
            Self::Int32(_) => PhysicalType::Int32,
            Self::Int64(_) => PhysicalType::Int64,
            Self::UInt8(_) => PhysicalType::UInt8,
            Self::UInt16(_) => PhysicalType::UInt16,
            Self::UInt32(_) => PhysicalType::UInt32,
            Self::UInt64(_) => PhysicalType::UInt64,
            Self::Float32(_) => PhysicalType::Float32,
            Self::Float64(_) => PhysicalType::Float64,
            Self::Utf8(_) => PhysicalType::Utf8,
        }
    }

    pub fn len(&self) -> usize {
        match_data!(self, s => s.len(), u => u.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Data of `len` default values.
    pub fn zeroed(datatype: DataType, len: usize) -> Self {
        match datatype {
            DataType::Boolean => Self::Boolean(Arc::new(vec![false; len].into())),
            DataType::Int8 => Self::Int8(Arc::new(vec![0; len].into())),
            DataType::Int16 => Self::Int16(Arc::new(vec![0; len].into())),
            DataType::Int32 => Self::Int32(Arc::new(vec![0; len].into())),
            DataType::Int64 => Self::Int64(Arc::new(vec![0; len].into())),
            DataType::UInt8 => Self::UInt8(Arc::new(vec![0; len].into())),
            DataType::UInt16 => Self::UInt16(Arc::new(vec![0; len].into())),
            DataType::UInt32 => Self::UInt32(Arc::new(vec![0; len].into())),
            DataType::UInt64 => Self::UInt64(Arc::new(vec![0; len].into())),
            DataType::Float32 => Self::Float32(Arc::new(vec![0.0; len].into())),
            DataType::Float64 => Self::Float64(Arc::new(vec![0.0; len].into())),
            DataType::Utf8 => Self::Utf8(Arc::new(StringStorage {
                spans: vec![(0, 0); len],
                data: String::new(),
            })),
        }
    }

    /// Copy out the values at the given physical indices.
    ///
    /// Panics if an index is out of bounds.
    fn take(&self, rows: &[usize]) -> Self {
        macro_rules! take_primitive {
            ($variant:ident, $s:expr) => {
                Self::$variant(Arc::new(
                    rows.iter()
                        .map(|&row| $s.0[row])
                        .collect::<Vec<_>>()
                        .into(),
                ))
            };
        }

        match self {
            Self::Boolean(s) => take_primitive!(Boolean, s),
            Self::Int8(s) => take_primitive!(Int8, s),
            Self::Int16(s) => take_primitive!(Int16, s),
            Self::Int32(s) => take_primitive!(Int32, s),
            Self::Int64(s) => take_primitive!(Int64, s),
            Self::UInt8(s) => take_primitive!(UInt8, s),
            Self::UInt16(s) => take_primitive!(UInt16, s),
            Self::UInt32(s) => take_primitive!(UInt32, s),
            Self::UInt64(s) => take_primitive!(UInt64, s),
            Self::Float32(s) => take_primitive!(Float32, s),
            Self::Float64(s) => take_primitive!(Float64, s),
            Self::Utf8(s) => {
                let mut out = StringStorage::with_capacity(rows.len(), 0);
                for &row in rows {
                    let (offset, len) = s.spans[row];
                    out.push(&s.data[offset..offset + len]);
                }
                Self::Utf8(Arc::new(out))
            }
        }
    }

    fn get_scalar(&self, idx: usize) -> Option<ScalarValue<'_>> {
        Some(match self {
            Self::Boolean(s) => ScalarValue::Boolean(*s.0.get(idx)?),
            Self::Int8(s) => ScalarValue::Int8(*s.0.get(idx)?),
            Self::Int16(s) => ScalarValue::Int16(*s.0.get(idx)?),
            Self::Int32(s) => ScalarValue::Int32(*s.0.get(idx)?),
            Self::Int64(s) => ScalarValue::Int64(*s.0.get(idx)?),
            Self::UInt8(s) => ScalarValue::UInt8(*s.0.get(idx)?),
            Self::UInt16(s) => ScalarValue::UInt16(*s.0.get(idx)?),
            Self::UInt32(s) => ScalarValue::UInt32(*s.0.get(idx)?),
            Self::UInt64(s) => ScalarValue::UInt64(*s.0.get(idx)?),
            Self::Float32(s) => ScalarValue::Float32(*s.0.get(idx)?),
            Self::Float64(s) => ScalarValue::Float64(*s.0.get(idx)?),
            Self::Utf8(s) => ScalarValue::Utf8(Cow::Borrowed(s.get(idx)?)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::testutil::assert_arrays_eq;

    #[test]
    fn logical_value_flat() {
        let arr = Array::from_iter([Some(1_i64), None, Some(3)]);
        assert_eq!(3, arr.logical_len());
        assert_eq!(ScalarValue::Int64(1), arr.logical_value(0).unwrap());
        assert_eq!(ScalarValue::Null, arr.logical_value(1).unwrap());
        assert_eq!(Some(false), arr.is_valid(1));
    }

    #[test]
    fn logical_value_out_of_bounds() {
        let arr = Array::from_iter([1_i32, 2]);
        let err = arr.logical_value(2).unwrap_err();
        assert_eq!(ErrorKind::IndexError, err.kind());
        assert_eq!(None, arr.is_valid(2));
    }

    #[test]
    fn constant_broadcast() {
        let arr = Array::new_constant(DataType::Utf8, &"CO".into(), 1000).unwrap();
        assert!(arr.is_constant());
        assert_eq!(1000, arr.logical_len());
        assert_eq!(1, arr.array_data().len());
        assert_eq!(ScalarValue::from("CO"), arr.logical_value(999).unwrap());
    }

    #[test]
    fn constant_wrong_type() {
        let err = Array::new_constant(DataType::Int32, &ScalarValue::Float64(1.0), 3).unwrap_err();
        assert_eq!(ErrorKind::TypeMismatch, err.kind());
    }

    #[test]
    fn typed_null_array() {
        let arr = Array::new_typed_null_array(DataType::Float32, 4);
        assert_eq!(DataType::Float32, arr.datatype());
        assert_eq!(4, arr.logical_len());
        for idx in 0..4 {
            assert_eq!(ScalarValue::Null, arr.logical_value(idx).unwrap());
        }
    }

    #[test]
    fn filter_flat() {
        let arr = Array::from_iter([Some("a"), None, Some("c"), Some("d")]);
        let sel: Bitmap = [true, true, false, true].into_iter().collect();
        let out = arr.filter(&sel).unwrap();

        let expected = Array::from_iter([Some("a"), None, Some("d")]);
        assert_arrays_eq(&expected, &out);
    }

    #[test]
    fn filter_constant_stays_constant() {
        let arr = Array::new_constant(DataType::Int32, &ScalarValue::Int32(4), 4).unwrap();
        let sel: Bitmap = [true, false, false, true].into_iter().collect();
        let out = arr.filter(&sel).unwrap();
        assert!(out.is_constant());
        assert_arrays_eq(&Array::from_iter([4, 4]), &out);
    }

    #[test]
    fn filter_wrong_len() {
        let arr = Array::from_iter([1_i32, 2, 3]);
        let sel = Bitmap::new_with_all_true(2);
        let err = arr.filter(&sel).unwrap_err();
        assert_eq!(ErrorKind::InvariantViolation, err.kind());
    }

    #[test]
    fn slice_flat() {
        let arr = Array::from_iter([1_u16, 2, 3, 4, 5]);
        let out = arr.slice(1, 3).unwrap();
        assert_arrays_eq(&Array::from_iter([2_u16, 3, 4]), &out);
        assert!(arr.slice(4, 2).is_err());
    }

    #[test]
    fn from_scalars_type_checked() {
        let arr = Array::try_from_scalars(
            DataType::Float64,
            [ScalarValue::Float64(1.5), ScalarValue::Null],
        )
        .unwrap();
        assert_arrays_eq(&Array::from_iter([Some(1.5), None]), &arr);

        let err = Array::try_from_scalars(
            DataType::Float64,
            [ScalarValue::Float64(1.5), ScalarValue::Int32(2)],
        )
        .unwrap_err();
        assert_eq!(ErrorKind::TypeMismatch, err.kind());
    }

    #[test]
    fn equal_arrays_with_differently_built_validity() {
        let mut validity = Bitmap::new_with_all_true(3);
        validity.set_unchecked(2, false);
        let data = ArrayData::Int32(Arc::new(vec![1, 2, 0].into()));
        let arr = Array::try_new(DataType::Int32, Some(validity), data).unwrap();

        assert_eq!(Array::from_iter([Some(1), Some(2), None]), arr);
    }

    #[test]
    fn try_new_checks_physical_type() {
        let data = ArrayData::zeroed(DataType::Int8, 3);
        let err = Array::try_new(DataType::Utf8, None, data.clone()).unwrap_err();
        assert_eq!(ErrorKind::InvariantViolation, err.kind());

        let err = Array::try_new(DataType::Int8, Some(Bitmap::new_with_all_true(2)), data)
            .unwrap_err();
        assert_eq!(ErrorKind::InvariantViolation, err.kind());
    }
}
