//! Insertion-ordered hash dictionary.

pub(crate) mod buffer;
pub mod sorted;

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;
use std::ops::{Bound, Index, Range, RangeBounds};

use crate::error::{Error, Result};
use crate::storage::{HashedStorage, IntoElements};
use buffer::OrderedDictionaryBuffer;

/// Resolves any `RangeBounds<usize>` against a collection of length `len`.
pub(crate) fn simplify_range<R: RangeBounds<usize>>(range: R, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&i) => i,
        Bound::Excluded(&i) => i.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&i) => i.saturating_add(1),
        Bound::Excluded(&i) => i,
        Bound::Unbounded => len,
    };
    assert!(
        start <= end && end <= len,
        "range {start}..{end} out of bounds for length {len}"
    );
    start..end
}

/// A hash map that remembers the order in which keys were inserted.
///
/// Lookup by key is O(1) through an open-addressing table; positional access
/// and iteration follow logical order. Inserting a key that is already present
/// through [`append`](Self::append) or [`insert_at`](Self::insert_at) is a no-op
/// (the first write wins); [`update_value`](Self::update_value) and
/// [`set`](Self::set) overwrite.
///
/// Cloning is O(1): clones share storage until one of them is mutated. Because
/// the first mutation of a shared dictionary copies the elements, mutating
/// methods require `K: Clone` and `V: Clone`.
pub struct OrderedDictionary<K, V, S = RandomState> {
    buffer: OrderedDictionaryBuffer<K, V, S>,
}

impl<K, V, S> Clone for OrderedDictionary<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
        }
    }
}

impl<K, V> OrderedDictionary<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V, S> OrderedDictionary<K, V, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            buffer: OrderedDictionaryBuffer::with_capacity_and_hasher(capacity, hash_builder),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements the current storage holds before it must grow.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn hasher(&self) -> &S {
        self.buffer.storage().hash_builder()
    }

    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        (index < self.len()).then(|| self.buffer.element_at(index))
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.get_index(0)
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.len().checked_sub(1).and_then(|i| self.get_index(i))
    }

    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(self.buffer.storage())
    }

    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V, S> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> OrderedDictionary<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buffer.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buffer.index_of(key).is_some()
    }

    /// Logical position of `key`.
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buffer.index_of(key)
    }
}

impl<K, V, S> OrderedDictionary<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Makes room for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        let minimum = self.len().saturating_add(additional);
        self.buffer.reserve_capacity(minimum);
    }

    pub fn shrink_to_fit(&mut self) {
        self.buffer.reallocate(self.len());
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buffer.get_mut(key)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<(&K, &mut V)> {
        if index < self.len() {
            Some(self.buffer.element_at_mut(index))
        } else {
            None
        }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, V> {
        ValuesMut {
            inner: self.buffer.values_mut().into_iter(),
        }
    }

    /// Appends `(key, value)`. Returns `false` and changes nothing if `key`
    /// is already present.
    pub fn append(&mut self, key: K, value: V) -> bool {
        self.buffer.append(key, value)
    }

    /// Inserts `(key, value)` at logical position `index`. Returns `false` and
    /// changes nothing if `key` is already present.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_at(&mut self, index: usize, key: K, value: V) -> bool {
        self.buffer.initialize(key, value, index)
    }

    /// Checked [`insert_at`](Self::insert_at).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index > len`.
    pub fn try_insert_at(&mut self, index: usize, key: K, value: V) -> Result<bool> {
        if index > self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok(self.insert_at(index, key, value))
    }

    /// Inserts a run of pairs starting at `index`, skipping keys that are
    /// already present. Returns how many pairs were inserted.
    pub fn insert_contents_of<I>(&mut self, elements: I, index: usize) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.buffer
            .insert_contents(elements.into_iter().collect(), index)
    }

    /// Sets the value for `key`, returning the previous value. New keys are
    /// appended.
    pub fn update_value(&mut self, key: K, value: V) -> Option<V> {
        self.buffer.update_value(key, value)
    }

    /// Subscript assignment: `Some` behaves like
    /// [`update_value`](Self::update_value), `None` removes `key`.
    pub fn set(&mut self, key: K, value: Option<V>) -> Option<V> {
        match value {
            Some(value) => self.update_value(key, value),
            None => self.remove_value(&key),
        }
    }

    pub fn remove_value<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buffer.remove_value(key).map(|(_, k, v)| (k, v))
    }

    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> (K, V) {
        self.buffer.destroy_at(index)
    }

    /// Checked [`remove_at`](Self::remove_at).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index >= len`.
    pub fn try_remove_at(&mut self, index: usize) -> Result<(K, V)> {
        if index >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok(self.remove_at(index))
    }

    pub fn remove_first(&mut self) -> Option<(K, V)> {
        (!self.is_empty()).then(|| self.remove_at(0))
    }

    pub fn remove_last(&mut self) -> Option<(K, V)> {
        let last = self.len().checked_sub(1)?;
        Some(self.remove_at(last))
    }

    pub fn remove_subrange<R: RangeBounds<usize>>(&mut self, range: R) {
        let range = simplify_range(range, self.len());
        self.buffer.remove_subrange(range);
    }

    pub fn remove_all(&mut self, keep_capacity: bool) {
        self.buffer.remove_all(keep_capacity);
    }

    pub fn clear(&mut self) {
        self.remove_all(false);
    }
}

impl<K, V> Default for OrderedDictionary<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for OrderedDictionary<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for OrderedDictionary<K, V, S>
where
    K: Eq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        if self.buffer.identical(&other.buffer) {
            return true;
        }
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, S> Eq for OrderedDictionary<K, V, S> {}

impl<K, Q, V, S> Index<&Q> for OrderedDictionary<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found in OrderedDictionary")
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedDictionary<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    /// Builds in iteration order; later duplicates of a key are ignored.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut dict = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        dict.extend(iter);
        dict
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedDictionary<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Appends each pair; keys already present keep their current value.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrderedDictionary<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> IntoIterator for OrderedDictionary<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.buffer.into_elements(),
        }
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Borrowing iterator over `(key, value)` pairs in logical order.
pub struct Iter<'a, K, V, S> {
    storage: &'a HashedStorage<K, V, S>,
    front: usize,
    back: usize,
}

impl<'a, K, V, S> Iter<'a, K, V, S> {
    pub(crate) fn new(storage: &'a HashedStorage<K, V, S>) -> Self {
        Self::over(storage, 0..storage.len())
    }

    pub(crate) fn over(storage: &'a HashedStorage<K, V, S>, positions: Range<usize>) -> Self {
        debug_assert!(positions.end <= storage.len());
        Self {
            storage,
            front: positions.start,
            back: positions.end,
        }
    }
}

impl<K, V, S> Clone for Iter<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let item = self.storage.element_at(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<K, V, S> DoubleEndedIterator for Iter<'_, K, V, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.storage.element_at(self.back))
    }
}

impl<K, V, S> ExactSizeIterator for Iter<'_, K, V, S> {}
impl<K, V, S> FusedIterator for Iter<'_, K, V, S> {}

pub struct Keys<'a, K, V, S> {
    pub(crate) inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Iterator for Keys<'a, K, V, S> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, S> DoubleEndedIterator for Keys<'_, K, V, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V, S> ExactSizeIterator for Keys<'_, K, V, S> {}

pub struct Values<'a, K, V, S> {
    inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Iterator for Values<'a, K, V, S> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, S> DoubleEndedIterator for Values<'_, K, V, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V, S> ExactSizeIterator for Values<'_, K, V, S> {}

pub struct ValuesMut<'a, V> {
    inner: std::vec::IntoIter<&'a mut V>,
}

impl<'a, V> Iterator for ValuesMut<'a, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> DoubleEndedIterator for ValuesMut<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<V> ExactSizeIterator for ValuesMut<'_, V> {}

/// Owning iterator in logical order.
pub struct IntoIter<K, V, S> {
    inner: IntoElements<K, V, S>,
}

impl<K, V, S> Iterator for IntoIter<K, V, S> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, S> DoubleEndedIterator for IntoIter<K, V, S> {
    fn next_back(&mut self) -> Option<(K, V)> {
        self.inner.next_back()
    }
}

impl<K, V, S> ExactSizeIterator for IntoIter<K, V, S> {}

#[cfg(test)]
impl<K: Hash + Eq, V, S: BuildHasher> OrderedDictionary<K, V, S> {
    pub(crate) fn validate(&self) {
        self.buffer.storage().validate();
    }
}
