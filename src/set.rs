//! Insertion-ordered hash set.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::dictionary::buffer::OrderedDictionaryBuffer;
use crate::dictionary::Keys;
use crate::error::{Error, Result};

/// A hash set that iterates in insertion order.
///
/// Shares the ordered dictionary's storage with a zero-sized value.
pub struct OrderedSet<T, S = RandomState> {
    buffer: OrderedDictionaryBuffer<T, (), S>,
}

impl<T, S> Clone for OrderedSet<T, S> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
        }
    }
}

impl<T> OrderedSet<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> OrderedSet<T, S> {
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

    pub fn get_index(&self, index: usize) -> Option<&T> {
        (index < self.len()).then(|| self.buffer.key_at(index))
    }

    pub fn first(&self) -> Option<&T> {
        self.get_index(0)
    }

    pub fn last(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|i| self.get_index(i))
    }

    pub fn iter(&self) -> Keys<'_, T, (), S> {
        Keys {
            inner: crate::dictionary::Iter::new(self.buffer.storage()),
        }
    }
}

impl<T: Hash + Eq, S: BuildHasher> OrderedSet<T, S> {
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buffer.index_of(value).is_some()
    }

    pub fn index_of<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buffer.index_of(value)
    }
}

impl<T, S> OrderedSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    /// Appends `value`. Returns `false` if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        self.buffer.append(value, ())
    }

    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_at(&mut self, index: usize, value: T) -> bool {
        self.buffer.initialize(value, (), index)
    }

    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index > len`.
    pub fn try_insert_at(&mut self, index: usize, value: T) -> Result<bool> {
        if index > self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok(self.insert_at(index, value))
    }

    pub fn remove<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buffer.remove_value(value).map(|(_, v, ())| v)
    }

    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> T {
        self.buffer.destroy_at(index).0
    }

    pub fn reserve(&mut self, additional: usize) {
        let minimum = self.len().saturating_add(additional);
        self.buffer.reserve_capacity(minimum);
    }

    pub fn clear(&mut self) {
        self.buffer.remove_all(false);
    }
}

impl<T: fmt::Debug, S> fmt::Debug for OrderedSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Eq, S> PartialEq for OrderedSet<T, S> {
    fn eq(&self, other: &Self) -> bool {
        if self.buffer.identical(&other.buffer) {
            return true;
        }
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, S> Eq for OrderedSet<T, S> {}

impl<T, S> FromIterator<T> for OrderedSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut set = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        set.extend(iter);
        set
    }
}

impl<T, S> Extend<T> for OrderedSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, S> IntoIterator for &'a OrderedSet<T, S> {
    type Item = &'a T;
    type IntoIter = Keys<'a, T, (), S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
