//! Hashed storage block: header, bucket map and parallel key/value slots.
//!
//! Layout:
//! - header: `count` (live elements) and `capacity` (elements allowed before
//!   the owner must reallocate)
//! - `bucket_map`: logical position <-> bucket
//! - `keys[bucket]`, `values[bucket]`: parallel slot arrays, one entry per bucket
//!
//! Collisions are resolved by linear probing. Deletion never rehashes; the
//! probe chain around the freed slot is patched in place instead.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use crate::bucket::{Bucket, BucketMap};
use crate::{MAX_LOAD_FACTOR_DEN, MAX_LOAD_FACTOR_NUM, MIN_BUCKET_COUNT};

/// Smallest power-of-two bucket count that holds `capacity` elements while
/// honoring the maximum load factor. Always leaves at least one empty bucket.
pub(crate) fn minimum_bucket_count(capacity: usize) -> usize {
    let needed = capacity
        .saturating_mul(MAX_LOAD_FACTOR_DEN)
        .div_ceil(MAX_LOAD_FACTOR_NUM);
    needed
        .max(capacity.saturating_add(1))
        .max(MIN_BUCKET_COUNT)
        .next_power_of_two()
}

#[inline]
fn element_capacity(bucket_count: usize) -> usize {
    bucket_count / MAX_LOAD_FACTOR_DEN * MAX_LOAD_FACTOR_NUM
}

#[derive(Clone)]
pub(crate) struct HashedStorage<K, V, S> {
    count: usize,
    capacity: usize,
    bucket_map: BucketMap,
    keys: Box<[Option<K>]>,
    values: Box<[Option<V>]>,
    hash_builder: S,
}

impl<K, V, S> HashedStorage<K, V, S> {
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let bucket_count = minimum_bucket_count(capacity);
        Self {
            count: 0,
            capacity: element_capacity(bucket_count),
            bucket_map: BucketMap::new(bucket_count),
            keys: (0..bucket_count).map(|_| None).collect(),
            values: (0..bucket_count).map(|_| None).collect(),
            hash_builder,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of physical buckets (a power of two).
    #[inline]
    pub(crate) fn represented_capacity(&self) -> usize {
        self.bucket_map.capacity()
    }

    #[inline]
    pub(crate) fn hash_builder(&self) -> &S {
        &self.hash_builder
    }

    #[inline]
    fn is_occupied(&self, bucket: Bucket) -> bool {
        self.keys[bucket.index()].is_some()
    }

    #[inline]
    pub(crate) fn bucket(&self, position: usize) -> Bucket {
        self.bucket_map.bucket(position).unwrap_or_else(|| {
            panic!(
                "index out of bounds: the len is {} but the index is {position}",
                self.count
            )
        })
    }

    #[inline]
    pub(crate) fn position(&self, bucket: Bucket) -> Option<usize> {
        self.bucket_map.position(bucket)
    }

    #[inline]
    pub(crate) fn key_in(&self, bucket: Bucket) -> &K {
        self.keys[bucket.index()]
            .as_ref()
            .expect("bucket bound to a position must hold a key")
    }

    #[inline]
    pub(crate) fn value_in(&self, bucket: Bucket) -> &V {
        self.values[bucket.index()]
            .as_ref()
            .expect("bucket bound to a position must hold a value")
    }

    #[inline]
    pub(crate) fn value_in_mut(&mut self, bucket: Bucket) -> &mut V {
        self.values[bucket.index()]
            .as_mut()
            .expect("bucket bound to a position must hold a value")
    }

    #[inline]
    pub(crate) fn key_at(&self, position: usize) -> &K {
        self.key_in(self.bucket(position))
    }

    #[cfg(test)]
    pub(crate) fn value_at(&self, position: usize) -> &V {
        self.value_in(self.bucket(position))
    }

    #[inline]
    pub(crate) fn value_at_mut(&mut self, position: usize) -> &mut V {
        let bucket = self.bucket(position);
        self.value_in_mut(bucket)
    }

    #[inline]
    pub(crate) fn element_at(&self, position: usize) -> (&K, &V) {
        let bucket = self.bucket(position);
        (self.key_in(bucket), self.value_in(bucket))
    }

    /// Moves the entry in `from` into the empty bucket `to`, keeping its position.
    fn relocate(&mut self, from: Bucket, to: Bucket) {
        debug_assert!(!self.is_occupied(to));
        tracing::trace!(from = from.index(), to = to.index(), "relocating entry into hole");
        self.keys[to.index()] = self.keys[from.index()].take();
        self.values[to.index()] = self.values[from.index()].take();
        self.bucket_map.replace(from, to);
    }

    /// Drops every element, keeping the bucket count.
    pub(crate) fn remove_all(&mut self) {
        for bucket in self.bucket_map.iter() {
            self.keys[bucket.index()] = None;
            self.values[bucket.index()] = None;
        }
        self.bucket_map.clear();
        self.count = 0;
    }

    #[inline]
    pub(crate) fn element_at_mut(&mut self, position: usize) -> (&K, &mut V) {
        let bucket = self.bucket(position);
        let key = self.keys[bucket.index()]
            .as_ref()
            .expect("bucket bound to a position must hold a key");
        let value = self.values[bucket.index()]
            .as_mut()
            .expect("bucket bound to a position must hold a value");
        (key, value)
    }

    /// Mutable references to every value, in logical order.
    pub(crate) fn values_in_order_mut(&mut self) -> Vec<&mut V> {
        let mut ordered: Vec<Option<&mut V>> = (0..self.count).map(|_| None).collect();
        for (index, slot) in self.values.iter_mut().enumerate() {
            if let Some(value) = slot.as_mut() {
                let position = self
                    .bucket_map
                    .position(Bucket::new(index))
                    .expect("occupied bucket must be bound to a position");
                ordered[position] = Some(value);
            }
        }
        ordered.into_iter().flatten().collect()
    }

    /// Moves every element, in logical order, out of the block.
    pub(crate) fn into_elements(self) -> IntoElements<K, V, S> {
        let buckets: Vec<Bucket> = self.bucket_map.iter().collect();
        IntoElements {
            storage: self,
            buckets: buckets.into_iter(),
        }
    }
}

/// Owning iterator draining a storage block in logical order.
pub(crate) struct IntoElements<K, V, S> {
    storage: HashedStorage<K, V, S>,
    buckets: std::vec::IntoIter<Bucket>,
}

impl<K, V, S> IntoElements<K, V, S> {
    fn take(&mut self, bucket: Bucket) -> (K, V) {
        let key = self.storage.keys[bucket.index()]
            .take()
            .expect("bucket bound to a position must hold a key");
        let value = self.storage.values[bucket.index()]
            .take()
            .expect("bucket bound to a position must hold a value");
        (key, value)
    }
}

impl<K, V, S> Iterator for IntoElements<K, V, S> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let bucket = self.buckets.next()?;
        Some(self.take(bucket))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.buckets.size_hint()
    }
}

impl<K, V, S> DoubleEndedIterator for IntoElements<K, V, S> {
    fn next_back(&mut self) -> Option<(K, V)> {
        let bucket = self.buckets.next_back()?;
        Some(self.take(bucket))
    }
}

impl<K, V, S> ExactSizeIterator for IntoElements<K, V, S> {}

impl<K: Hash + Eq, V, S: BuildHasher> HashedStorage<K, V, S> {
    #[inline]
    pub(crate) fn ideal_bucket<Q: ?Sized + Hash>(&self, key: &Q) -> Bucket {
        let hash = self.hash_builder.hash_one(key);
        Bucket::new(hash as usize & (self.represented_capacity() - 1))
    }

    /// Linear probe from the ideal bucket of `key`.
    ///
    /// Returns the bucket holding `key` and `true`, or the first empty bucket
    /// on the probe path (where `key` belongs) and `false`.
    pub(crate) fn find<Q>(&self, key: &Q) -> (Bucket, bool)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let bucket_count = self.represented_capacity();
        let mut bucket = self.ideal_bucket(key);
        for _ in 0..bucket_count {
            match &self.keys[bucket.index()] {
                None => return (bucket, false),
                Some(k) if k.borrow() == key => return (bucket, true),
                Some(_) => bucket = bucket.successor(bucket_count),
            }
        }
        panic!("probe sequence visited all {bucket_count} buckets without an empty slot");
    }

    /// Like [`find`](Self::find), but treats buckets in `pending` as occupied
    /// by elements that have been assigned a bucket but are not yet stored.
    pub(crate) fn find_pending(&self, key: &K, pending: &HashMap<Bucket, &K>) -> (Bucket, bool) {
        let bucket_count = self.represented_capacity();
        let mut bucket = self.ideal_bucket(key);
        for _ in 0..bucket_count {
            let occupant = self.keys[bucket.index()]
                .as_ref()
                .or_else(|| pending.get(&bucket).copied());
            match occupant {
                None => return (bucket, false),
                Some(k) if k == key => return (bucket, true),
                Some(_) => bucket = bucket.successor(bucket_count),
            }
        }
        panic!("probe sequence visited all {bucket_count} buckets without an empty slot");
    }

    /// Stores `(key, value)` at logical `position`.
    ///
    /// A key that is already present is left untouched and `false` is
    /// returned: the first write wins.
    pub(crate) fn initialize(&mut self, key: K, value: V, position: usize) -> bool {
        let (bucket, found) = self.find(&key);
        if found {
            return false;
        }
        assert!(
            self.count < self.capacity,
            "hashed storage full: {} elements",
            self.count
        );
        self.keys[bucket.index()] = Some(key);
        self.values[bucket.index()] = Some(value);
        self.bucket_map.insert(&[bucket], position);
        self.count += 1;
        true
    }

    /// Stores a batch of elements contiguously starting at `position`.
    ///
    /// Buckets for the whole batch are chosen before anything is written, so
    /// later elements probe past the buckets claimed by earlier ones. Keys that
    /// are already stored, or repeated within the batch, are skipped. Returns
    /// the number of elements stored.
    pub(crate) fn initialize_many(&mut self, elements: Vec<(K, V)>, position: usize) -> usize {
        let assigned: Vec<Option<Bucket>> = {
            let mut pending: HashMap<Bucket, &K> = HashMap::with_capacity(elements.len());
            elements
                .iter()
                .map(|(key, _)| {
                    let (bucket, found) = self.find_pending(key, &pending);
                    if found {
                        None
                    } else {
                        pending.insert(bucket, key);
                        Some(bucket)
                    }
                })
                .collect()
        };

        let stored = assigned.iter().flatten().count();
        assert!(
            self.count + stored <= self.capacity,
            "hashed storage full: {} elements",
            self.count
        );

        let mut buckets = Vec::with_capacity(stored);
        for ((key, value), bucket) in elements.into_iter().zip(assigned) {
            if let Some(bucket) = bucket {
                self.keys[bucket.index()] = Some(key);
                self.values[bucket.index()] = Some(value);
                buckets.push(bucket);
            }
        }
        self.bucket_map.insert(&buckets, position);
        self.count += buckets.len();
        buckets.len()
    }

    /// Removes the element stored in `bucket` and patches the probe chain.
    pub(crate) fn destroy(&mut self, bucket: Bucket) -> (K, V) {
        let position = self
            .bucket_map
            .position(bucket)
            .expect("destroyed bucket must be bound to a position");
        let key = self.keys[bucket.index()]
            .take()
            .expect("bucket bound to a position must hold a key");
        let value = self.values[bucket.index()]
            .take()
            .expect("bucket bound to a position must hold a value");
        self.bucket_map.remove(position);
        self.count -= 1;

        let ideal = self.ideal_bucket(&key);
        self.patch(bucket, ideal);
        (key, value)
    }

    /// Restores probe reachability after `hole` was emptied.
    ///
    /// `ideal` is the ideal bucket of the removed key. Entries later in the
    /// contiguous chain whose ideal bucket lies in `start..=hole` (cyclically)
    /// are moved back into the hole, which then moves to where they were.
    fn patch(&mut self, mut hole: Bucket, ideal: Bucket) {
        let bucket_count = self.represented_capacity();

        let mut start = ideal;
        while self.is_occupied(start.predecessor(bucket_count)) {
            start = start.predecessor(bucket_count);
        }

        let mut last_in_chain = hole;
        let mut b = last_in_chain.successor(bucket_count);
        while self.is_occupied(b) {
            last_in_chain = b;
            b = b.successor(bucket_count);
        }

        while hole != last_in_chain {
            // Walk back from the end of the chain looking for a misplaced entry.
            let mut b = last_in_chain;
            while b != hole {
                let ideal = self.ideal_bucket(self.key_in(b));
                let c0 = ideal >= start;
                let c1 = ideal <= hole;
                if if start <= hole { c0 && c1 } else { c0 || c1 } {
                    break;
                }
                b = b.predecessor(bucket_count);
            }
            if b == hole {
                break;
            }
            self.relocate(b, hole);
            hole = b;
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Clone> HashedStorage<K, V, S> {
    /// Rebuilds into a fresh block sized for `capacity`, reinserting every
    /// element in logical order.
    pub(crate) fn rehashed(self, capacity: usize) -> Self {
        let capacity = capacity.max(self.count);
        let mut storage = Self::with_capacity_and_hasher(capacity, self.hash_builder.clone());
        tracing::trace!(
            from = self.represented_capacity(),
            to = storage.represented_capacity(),
            count = self.count,
            "reallocating hashed storage"
        );
        for (key, value) in self.into_elements() {
            let position = storage.count;
            storage.initialize(key, value, position);
        }
        storage
    }
}

impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher + Clone> HashedStorage<K, V, S> {
    /// Copies into a fresh block sized for `capacity`, leaving `self` intact.
    pub(crate) fn reallocated(&self, capacity: usize) -> Self {
        let capacity = capacity.max(self.count);
        let mut storage = Self::with_capacity_and_hasher(capacity, self.hash_builder.clone());
        tracing::trace!(
            from = self.represented_capacity(),
            to = storage.represented_capacity(),
            count = self.count,
            "copying hashed storage"
        );
        for bucket in self.bucket_map.iter() {
            let position = storage.count;
            storage.initialize(
                self.key_in(bucket).clone(),
                self.value_in(bucket).clone(),
                position,
            );
        }
        storage
    }
}

#[cfg(test)]
impl<K: Hash + Eq, V, S: BuildHasher> HashedStorage<K, V, S> {
    /// Checks header, bucket map bijection and probe reachability.
    pub(crate) fn validate(&self) {
        let bucket_count = self.represented_capacity();
        assert!(bucket_count.is_power_of_two());
        assert_eq!(self.count, self.bucket_map.len(), "header count must match bucket map");
        assert!(self.count <= self.capacity, "count must not exceed capacity");
        assert!(self.count < bucket_count, "at least one bucket must stay empty");

        let mut occupied = 0usize;
        for index in 0..bucket_count {
            let bucket = Bucket::new(index);
            match (&self.keys[index], &self.values[index]) {
                (Some(key), Some(_)) => {
                    occupied += 1;
                    let position = self
                        .bucket_map
                        .position(bucket)
                        .expect("occupied bucket must be bound to a position");
                    assert_eq!(self.bucket_map.bucket(position), Some(bucket));
                    assert_eq!(self.find(key), (bucket, true), "key must be reachable by probing");
                }
                (None, None) => assert!(!self.bucket_map.is_occupied(bucket)),
                _ => panic!("key and value slots out of sync at {bucket:?}"),
            }
        }
        assert_eq!(occupied, self.count);
    }
}
