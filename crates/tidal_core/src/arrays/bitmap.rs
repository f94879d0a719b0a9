use std::fmt;

/// An LSB ordered bitmap.
///
/// Used both as an array validity mask and as the row selection produced by
/// a filter predicate.
///
/// Bits past `len` in the trailing byte are unspecified. Equality only looks
/// at the first `len` bits.
#[derive(Clone, Default)]
pub struct Bitmap {
    len: usize,
    data: Vec<u8>,
}

impl Bitmap {
    pub fn new_with_all_true(len: usize) -> Self {
        Bitmap {
            len,
            data: vec![u8::MAX; len.div_ceil(8)],
        }
    }

    pub fn new_with_all_false(len: usize) -> Self {
        Bitmap {
            len,
            data: vec![0; len.div_ceil(8)],
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn count_trues(&self) -> usize {
        // Full bytes first, then mask off bits past `len` in the trailing
        // byte.
        let full = self.len / 8;
        let mut count: usize = self.data[..full]
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum();

        let rem = self.len % 8;
        if rem != 0 {
            let mask = (1u8 << rem) - 1;
            count += (self.data[full] & mask).count_ones() as usize;
        }

        count
    }

    pub fn is_all_true(&self) -> bool {
        self.count_trues() == self.len
    }

    pub fn push(&mut self, val: bool) {
        if self.len == self.data.len() * 8 {
            self.data.push(0);
        }
        let idx = self.len;
        self.len += 1;
        self.set_unchecked(idx, val);
    }

    /// Get the value at index.
    ///
    /// Panics if index is out of bounds.
    #[inline]
    pub fn value(&self, idx: usize) -> bool {
        let byte = self.data[idx >> 3];
        (byte >> (idx & 7)) & 1 != 0
    }

    /// Set a bit at index.
    ///
    /// Panics if index is out of bounds.
    #[inline]
    pub fn set_unchecked(&mut self, idx: usize, val: bool) {
        let byte = idx / 8;
        let bit = idx & 7;
        if val {
            self.data[byte] |= 1 << bit;
        } else {
            self.data[byte] &= !(1 << bit);
        }
    }

    pub fn iter(&self) -> BitmapIter<'_> {
        BitmapIter {
            idx: 0,
            bitmap: self,
        }
    }

    /// Iterate over the indices of set bits.
    pub fn index_iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter()
            .enumerate()
            .filter_map(|(idx, set)| if set { Some(idx) } else { None })
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for Bitmap {}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<_> = self.iter().collect();
        f.debug_struct("Bitmap").field("values", &values).finish()
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();

        let mut bitmap = Bitmap {
            len: 0,
            data: Vec::with_capacity(lower.div_ceil(8)),
        };
        for val in iter {
            bitmap.push(val);
        }

        bitmap
    }
}

#[derive(Debug)]
pub struct BitmapIter<'a> {
    idx: usize,
    bitmap: &'a Bitmap,
}

impl Iterator for BitmapIter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.bitmap.len {
            return None;
        }
        let v = self.bitmap.value(self.idx);
        self.idx += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.bitmap.len - self.idx;
        (rem, Some(rem))
    }
}

impl ExactSizeIterator for BitmapIter<'_> {}
