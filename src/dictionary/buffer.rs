//! Copy-on-write handle over a hashed storage block.
//!
//! The buffer is a value: cloning it shares the block. Every mutating method
//! goes through [`storage_mut`](OrderedDictionaryBuffer::storage_mut), which
//! clones the block first if it is shared, so no write ever reaches storage
//! that another buffer can observe.

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::mem;
use std::ops::Range;
use std::sync::Arc;

use crate::storage::{HashedStorage, IntoElements};

pub(crate) struct OrderedDictionaryBuffer<K, V, S> {
    storage: Arc<HashedStorage<K, V, S>>,
}

impl<K, V, S> Clone for OrderedDictionaryBuffer<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<K, V, S> OrderedDictionaryBuffer<K, V, S> {
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            storage: Arc::new(HashedStorage::with_capacity_and_hasher(
                capacity,
                hash_builder,
            )),
        }
    }

    #[inline]
    pub(crate) fn storage(&self) -> &HashedStorage<K, V, S> {
        &self.storage
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    #[inline]
    pub(crate) fn is_uniquely_referenced(&mut self) -> bool {
        Arc::get_mut(&mut self.storage).is_some()
    }

    /// Same backing block and same element count.
    #[inline]
    pub(crate) fn identical(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage) && self.len() == other.len()
    }

    #[inline]
    pub(crate) fn key_at(&self, position: usize) -> &K {
        self.storage.key_at(position)
    }

    #[inline]
    pub(crate) fn element_at(&self, position: usize) -> (&K, &V) {
        self.storage.element_at(position)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> OrderedDictionaryBuffer<K, V, S> {
    pub(crate) fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.storage.find(key) {
            (bucket, true) => self.storage.position(bucket),
            (_, false) => None,
        }
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.storage.find(key) {
            (bucket, true) => Some(self.storage.value_in(bucket)),
            (_, false) => None,
        }
    }
}

impl<K, V, S> OrderedDictionaryBuffer<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Unique access to the block, cloning it first if it is shared.
    pub(crate) fn storage_mut(&mut self) -> &mut HashedStorage<K, V, S> {
        if !self.is_uniquely_referenced() {
            tracing::trace!(count = self.len(), "cloning shared dictionary storage");
        }
        Arc::make_mut(&mut self.storage)
    }

    /// Guarantees unique ownership and room for `minimum` elements.
    ///
    /// Growth at least doubles the capacity so repeated appends amortize.
    pub(crate) fn reserve_capacity(&mut self, minimum: usize) {
        let capacity = self.capacity();
        if minimum <= capacity {
            self.storage_mut();
            return;
        }
        let target = minimum.max(capacity.saturating_mul(2));
        self.reallocate(target);
    }

    /// Rebuilds the block for `capacity` elements (never below the count).
    pub(crate) fn reallocate(&mut self, capacity: usize) {
        let rebuilt = match Arc::get_mut(&mut self.storage) {
            Some(storage) => {
                let hash_builder = storage.hash_builder().clone();
                let owned = mem::replace(
                    storage,
                    HashedStorage::with_capacity_and_hasher(0, hash_builder),
                );
                owned.rehashed(capacity)
            }
            None => self.storage.reallocated(capacity),
        };
        self.storage = Arc::new(rebuilt);
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let position = self.index_of(key)?;
        Some(self.storage_mut().value_at_mut(position))
    }

    pub(crate) fn element_at_mut(&mut self, position: usize) -> (&K, &mut V) {
        self.storage_mut().element_at_mut(position)
    }

    pub(crate) fn values_mut(&mut self) -> Vec<&mut V> {
        self.storage_mut().values_in_order_mut()
    }

    /// Stores `(key, value)` at `position` unless `key` is already present.
    pub(crate) fn initialize(&mut self, key: K, value: V, position: usize) -> bool {
        assert!(
            position <= self.len(),
            "insertion index (is {position}) should be <= len (is {})",
            self.len()
        );
        if self.index_of(&key).is_some() {
            return false;
        }
        self.reserve_capacity(self.len() + 1);
        self.storage_mut().initialize(key, value, position)
    }

    pub(crate) fn append(&mut self, key: K, value: V) -> bool {
        let position = self.len();
        self.initialize(key, value, position)
    }

    /// Bulk insert at `position`; keys already present (or repeated) are skipped.
    pub(crate) fn insert_contents(&mut self, elements: Vec<(K, V)>, position: usize) -> usize {
        assert!(
            position <= self.len(),
            "insertion index (is {position}) should be <= len (is {})",
            self.len()
        );
        if elements.is_empty() {
            return 0;
        }
        self.reserve_capacity(self.len() + elements.len());
        self.storage_mut().initialize_many(elements, position)
    }

    /// Overwrites the value for `key`, or appends the pair if `key` is new.
    pub(crate) fn update_value(&mut self, key: K, value: V) -> Option<V> {
        match self.index_of(&key) {
            Some(position) => Some(self.replace_value_at(position, value)),
            None => {
                self.append(key, value);
                None
            }
        }
    }

    pub(crate) fn replace_value_at(&mut self, position: usize, value: V) -> V {
        mem::replace(self.storage_mut().value_at_mut(position), value)
    }

    pub(crate) fn destroy_at(&mut self, position: usize) -> (K, V) {
        let storage = self.storage_mut();
        let bucket = storage.bucket(position);
        storage.destroy(bucket)
    }

    pub(crate) fn remove_value<Q>(&mut self, key: &Q) -> Option<(usize, K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let position = self.index_of(key)?;
        let (key, value) = self.destroy_at(position);
        Some((position, key, value))
    }

    /// Removes a contiguous run of positions, one element at a time.
    pub(crate) fn remove_subrange(&mut self, range: Range<usize>) {
        assert!(
            range.start <= range.end && range.end <= self.len(),
            "range {range:?} out of bounds for length {}",
            self.len()
        );
        // Each removal shifts the rest of the run down onto `range.start`.
        for _ in range.clone() {
            self.destroy_at(range.start);
        }
    }

    pub(crate) fn remove_all(&mut self, keep_capacity: bool) {
        if keep_capacity {
            self.storage_mut().remove_all();
        } else {
            let hash_builder = self.storage.hash_builder().clone();
            self.storage = Arc::new(HashedStorage::with_capacity_and_hasher(0, hash_builder));
        }
    }

    pub(crate) fn into_elements(self) -> IntoElements<K, V, S> {
        let storage = Arc::try_unwrap(self.storage).unwrap_or_else(|shared| (*shared).clone());
        storage.into_elements()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::CollidingState;
    use std::collections::hash_map::RandomState;

    type Buffer = OrderedDictionaryBuffer<u64, &'static str, RandomState>;

    fn keys<S>(b: &OrderedDictionaryBuffer<u64, &'static str, S>) -> Vec<u64> {
        (0..b.len()).map(|p| *b.key_at(p)).collect()
    }

    #[test]
    fn test_copy_on_write() {
        let mut a = Buffer::with_capacity_and_hasher(4, RandomState::new());
        a.append(1, "one");
        a.append(2, "two");
        let mut b = a.clone();
        assert!(a.identical(&b));
        assert!(!a.is_uniquely_referenced());

        b.append(3, "three");
        assert!(!a.identical(&b));
        assert_eq!(keys(&a), vec![1, 2]);
        assert_eq!(keys(&b), vec![1, 2, 3]);
        assert!(a.is_uniquely_referenced());
        assert!(b.is_uniquely_referenced());
    }

    #[test]
    fn test_growth_rehashes_in_order() {
        let mut b = Buffer::with_capacity_and_hasher(0, RandomState::new());
        assert_eq!(b.capacity(), 6);
        for k in (0..100).rev() {
            assert!(b.append(k, "v"));
        }
        assert!(b.capacity() >= 100);
        assert_eq!(keys(&b), (0..100).rev().collect::<Vec<_>>());
        b.storage().validate();
    }

    #[test]
    fn test_first_write_wins_vs_update() {
        let mut b = Buffer::with_capacity_and_hasher(4, RandomState::new());
        assert!(b.append(1, "first"));
        assert!(!b.append(1, "second"));
        assert_eq!(b.get(&1), Some(&"first"));

        assert_eq!(b.update_value(1, "third"), Some("first"));
        assert_eq!(b.get(&1), Some(&"third"));
        assert_eq!(b.update_value(2, "new"), None);
        assert_eq!(keys(&b), vec![1, 2]);
    }

    #[test]
    fn test_remove_subrange() {
        let mut b =
            OrderedDictionaryBuffer::with_capacity_and_hasher(0, CollidingState { modulus: 4 });
        for k in 0..20u64 {
            b.append(k, "v");
        }
        b.remove_subrange(5..15);
        assert_eq!(keys(&b), vec![0, 1, 2, 3, 4, 15, 16, 17, 18, 19]);
        b.storage().validate();
        b.remove_subrange(3..3);
        assert_eq!(b.len(), 10);
    }

    #[test]
    fn test_remove_all() {
        let mut b = Buffer::with_capacity_and_hasher(40, RandomState::new());
        b.append(7, "seven");
        let shared = b.clone();
        b.remove_all(true);
        assert_eq!(b.len(), 0);
        assert!(b.capacity() >= 40);
        assert_eq!(shared.len(), 1);

        b.append(8, "eight");
        b.remove_all(false);
        assert_eq!(b.capacity(), 6);
    }

    #[test]
    fn test_into_elements_shared_and_unique() {
        let mut b = Buffer::with_capacity_and_hasher(4, RandomState::new());
        b.append(2, "two");
        b.append(1, "one");
        let shared = b.clone();
        let drained: Vec<_> = b.into_elements().collect();
        assert_eq!(drained, vec![(2, "two"), (1, "one")]);
        assert_eq!(keys(&shared), vec![2, 1]);
        let drained: Vec<_> = shared.into_elements().rev().collect();
        assert_eq!(drained, vec![(1, "one"), (2, "two")]);
    }
}
