//! Hash dictionary whose logical order is ascending key order.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::ops::{Bound, Index, RangeBounds};

use super::buffer::OrderedDictionaryBuffer;
use super::{Iter, Keys, Values};

/// An ordered dictionary that keeps its positions sorted by key.
///
/// Key lookup stays O(1) through the hash table; new keys are placed at the
/// position found by binary search, so iteration is in ascending key order.
/// [`insert`](Self::insert) ignores keys that are already present;
/// [`update_value`](Self::update_value) overwrites.
pub struct SortedDictionary<K, V, S = RandomState> {
    buffer: OrderedDictionaryBuffer<K, V, S>,
}

impl<K, V, S> Clone for SortedDictionary<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
        }
    }
}

impl<K, V> SortedDictionary<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V> Default for SortedDictionary<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> SortedDictionary<K, V, S> {
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

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        (index < self.len()).then(|| self.buffer.element_at(index))
    }

    /// Entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.get_index(0)
    }

    /// Entry with the largest key.
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

impl<K: Ord, V, S> SortedDictionary<K, V, S> {
    /// Leftmost position at which `key` keeps the keys sorted.
    fn insertion_point<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut low = 0;
        let mut high = self.len();
        while low < high {
            let mid = low + (high - low) / 2;
            if self.buffer.key_at(mid).borrow() < key {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        low
    }

    /// Entries whose keys fall inside `range`, in ascending key order.
    pub fn range<Q, R>(&self, range: R) -> Iter<'_, K, V, S>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
        R: RangeBounds<Q>,
    {
        let start = match range.start_bound() {
            Bound::Included(key) => self.insertion_point(key),
            Bound::Excluded(key) => self.upper_point(key),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(key) => self.upper_point(key),
            Bound::Excluded(key) => self.insertion_point(key),
            Bound::Unbounded => self.len(),
        };
        Iter::over(self.buffer.storage(), start..end.max(start))
    }

    /// First position whose key is strictly greater than `key`.
    fn upper_point<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut low = 0;
        let mut high = self.len();
        while low < high {
            let mid = low + (high - low) / 2;
            if self.buffer.key_at(mid).borrow() <= key {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        low
    }
}

impl<K, V, S> SortedDictionary<K, V, S>
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

    /// Sorted position of `key`, found through the hash table.
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buffer.index_of(key)
    }
}

impl<K, V, S> SortedDictionary<K, V, S>
where
    K: Hash + Ord + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    pub fn reserve(&mut self, additional: usize) {
        let minimum = self.len().saturating_add(additional);
        self.buffer.reserve_capacity(minimum);
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buffer.get_mut(key)
    }

    /// Inserts `(key, value)` at its sorted position. Returns `false` and
    /// changes nothing if `key` is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.buffer.index_of(&key).is_some() {
            return false;
        }
        let position = self.insertion_point(&key);
        self.buffer.initialize(key, value, position)
    }

    /// Sets the value for `key`, returning the previous value.
    pub fn update_value(&mut self, key: K, value: V) -> Option<V> {
        match self.buffer.index_of(&key) {
            Some(position) => Some(self.buffer.replace_value_at(position, value)),
            None => {
                self.insert(key, value);
                None
            }
        }
    }

    /// Subscript assignment: `Some` overwrites or inserts, `None` removes.
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
        self.buffer.remove_value(key).map(|(_, _, v)| v)
    }

    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> (K, V) {
        self.buffer.destroy_at(index)
    }

    pub fn clear(&mut self) {
        self.buffer.remove_all(false);
    }
}

impl<K, V, S> fmt::Debug for SortedDictionary<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Eq, V: PartialEq, S> PartialEq for SortedDictionary<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        if self.buffer.identical(&other.buffer) {
            return true;
        }
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, S> Eq for SortedDictionary<K, V, S> {}

impl<K, Q, V, S> Index<&Q> for SortedDictionary<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found in SortedDictionary")
    }
}

impl<K, V, S> FromIterator<(K, V)> for SortedDictionary<K, V, S>
where
    K: Hash + Ord + Clone,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut dict = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        dict.extend(iter);
        dict
    }
}

impl<K, V, S> Extend<(K, V)> for SortedDictionary<K, V, S>
where
    K: Hash + Ord + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a SortedDictionary<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
impl<K: Hash + Ord + fmt::Debug, V, S: BuildHasher> SortedDictionary<K, V, S> {
    pub(crate) fn validate(&self) {
        self.buffer.storage().validate();
        for position in 1..self.len() {
            let (prev, next) = (self.buffer.key_at(position - 1), self.buffer.key_at(position));
            assert!(prev < next, "keys out of order: {prev:?} before {next:?}");
        }
    }
}
