use std::fmt::Debug;

/// Values that can be addressed by physical index.
pub trait AddressableStorage: Debug {
    type T: ?Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, idx: usize) -> Option<&Self::T>;
}

/// Contiguous fixed width values.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveStorage<T>(pub(crate) Vec<T>);

impl<T> PrimitiveStorage<T> {
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> From<Vec<T>> for PrimitiveStorage<T> {
    fn from(value: Vec<T>) -> Self {
        PrimitiveStorage(value)
    }
}

impl<T: Debug> AddressableStorage for &[T] {
    type T = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn get(&self, idx: usize) -> Option<&Self::T> {
        <[T]>::get(self, idx)
    }
}

/// Variable length strings stored back to back in a single buffer.
///
/// Each row stores an (offset, len) span into `data`. Spans don't need to be
/// in order, which lets builders write rows at arbitrary indices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringStorage {
    pub(crate) spans: Vec<(usize, usize)>,
    pub(crate) data: String,
}

impl StringStorage {
    pub fn with_capacity(rows: usize, data_cap: usize) -> Self {
        StringStorage {
            spans: Vec::with_capacity(rows),
            data: String::with_capacity(data_cap),
        }
    }

    pub fn push(&mut self, s: &str) {
        self.spans.push((self.data.len(), s.len()));
        self.data.push_str(s);
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        let (offset, len) = *self.spans.get(idx)?;
        self.data.get(offset..offset + len)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans
            .iter()
            .map(|&(offset, len)| &self.data[offset..offset + len])
    }
}

impl AddressableStorage for &StringStorage {
    type T = str;

    fn len(&self) -> usize {
        StringStorage::len(self)
    }

    fn get(&self, idx: usize) -> Option<&Self::T> {
        StringStorage::get(self, idx)
    }
}

impl<'a> FromIterator<&'a str> for StringStorage {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let mut storage = StringStorage::with_capacity(lower, 0);
        for s in iter {
            storage.push(s);
        }
        storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_storage_get() {
        let storage: StringStorage = ["hello", "", "world"].into_iter().collect();
        assert_eq!(3, storage.len());
        assert_eq!(Some("hello"), storage.get(0));
        assert_eq!(Some(""), storage.get(1));
        assert_eq!(Some("world"), storage.get(2));
        assert_eq!(None, storage.get(3));
        assert_eq!(
            vec!["hello", "", "world"],
            storage.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn primitive_storage_addressable() {
        let storage = PrimitiveStorage::from(vec![1, 2, 3]);
        let s = storage.as_slice();
        assert_eq!(Some(&2), AddressableStorage::get(&s, 1));
        assert_eq!(3, AddressableStorage::len(&s));
    }
}
