//! Translation between logical positions and physical hash buckets.
//!
//! Hashed storage keeps its elements in bucket order (wherever the probe
//! sequence put them) but exposes them in logical order. `BucketMap` is the
//! indirection between the two: position `p` maps to exactly one occupied
//! bucket and every occupied bucket maps back to exactly one position.

use std::fmt;

/// A physical slot index inside a power-of-two sized bucket array.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bucket(usize);

impl Bucket {
    #[inline]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    /// Moves `by` slots, wrapping around at `capacity` (a power of two).
    #[inline]
    pub fn advanced(self, by: isize, capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self(self.0.wrapping_add_signed(by) & (capacity - 1))
    }

    #[inline]
    pub fn successor(self, capacity: usize) -> Self {
        self.advanced(1, capacity)
    }

    #[inline]
    pub fn predecessor(self, capacity: usize) -> Self {
        self.advanced(-1, capacity)
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bucket({})", self.0)
    }
}

/// Fixed-capacity bijection between logical positions `0..len` and buckets.
///
/// Running out of room is a broken precondition, not an error: growing the
/// table is the owning storage's job.
#[derive(Clone)]
pub struct BucketMap {
    /// Logical position -> bucket. Dense over `0..len`.
    buckets: Vec<Bucket>,
    /// Bucket -> logical position, `None` for unoccupied buckets.
    positions: Box<[Option<usize>]>,
}

impl BucketMap {
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "bucket map capacity must be a power of two, got {capacity}"
        );
        Self {
            buckets: Vec::with_capacity(capacity),
            positions: vec![None; capacity].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    #[inline]
    pub fn bucket(&self, position: usize) -> Option<Bucket> {
        self.buckets.get(position).copied()
    }

    #[inline]
    pub fn position(&self, bucket: Bucket) -> Option<usize> {
        self.positions[bucket.index()]
    }

    #[inline]
    pub fn is_occupied(&self, bucket: Bucket) -> bool {
        self.positions[bucket.index()].is_some()
    }

    /// Positional assignment.
    ///
    /// `Some(bucket)` at `len` appends, `Some(bucket)` below `len` rebinds the
    /// position to a new bucket, `None` removes the position and closes the gap.
    pub fn set(&mut self, position: usize, bucket: Option<Bucket>) {
        match bucket {
            Some(bucket) if position == self.len() => self.push(bucket),
            Some(bucket) => {
                assert!(
                    position < self.len(),
                    "position {position} out of bounds for bucket map of length {}",
                    self.len()
                );
                let old = self.buckets[position];
                self.replace(old, bucket);
            }
            None => {
                self.remove(position);
            }
        }
    }

    pub fn push(&mut self, bucket: Bucket) {
        self.insert(&[bucket], self.len());
    }

    /// Inserts `buckets` at `position`, shifting later positions right.
    pub fn insert(&mut self, buckets: &[Bucket], position: usize) {
        assert!(
            position <= self.len(),
            "insertion position {position} out of bounds for bucket map of length {}",
            self.len()
        );
        assert!(
            self.len() + buckets.len() <= self.capacity(),
            "bucket map capacity {} exhausted",
            self.capacity()
        );
        for (i, &bucket) in buckets.iter().enumerate() {
            assert!(
                !self.is_occupied(bucket),
                "{bucket:?} is already bound to a position"
            );
            debug_assert!(
                !buckets[..i].contains(&bucket),
                "{bucket:?} appears twice in one insertion"
            );
        }

        self.buckets
            .splice(position..position, buckets.iter().copied());
        for p in position..self.buckets.len() {
            self.positions[self.buckets[p].index()] = Some(p);
        }
    }

    /// Removes `position`, shifting later positions left. Returns its bucket.
    pub fn remove(&mut self, position: usize) -> Bucket {
        assert!(
            position < self.len(),
            "position {position} out of bounds for bucket map of length {}",
            self.len()
        );
        let bucket = self.buckets.remove(position);
        self.positions[bucket.index()] = None;
        for p in position..self.buckets.len() {
            self.positions[self.buckets[p].index()] = Some(p);
        }
        bucket
    }

    /// Moves the position bound to `bucket` onto `with`, keeping logical order.
    pub fn replace(&mut self, bucket: Bucket, with: Bucket) {
        if bucket == with {
            return;
        }
        let position = self.positions[bucket.index()]
            .unwrap_or_else(|| panic!("{bucket:?} is not bound to a position"));
        assert!(
            !self.is_occupied(with),
            "{with:?} is already bound to a position"
        );
        self.positions[bucket.index()] = None;
        self.positions[with.index()] = Some(position);
        self.buckets[position] = with;
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.positions.fill(None);
    }

    /// Buckets in logical order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Bucket> + ExactSizeIterator + '_ {
        self.buckets.iter().copied()
    }
}

impl fmt::Debug for BucketMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.buckets.iter().enumerate())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bijective(map: &BucketMap) {
        let mut occupied = 0;
        for b in 0..map.capacity() {
            if let Some(p) = map.position(Bucket::new(b)) {
                assert_eq!(map.bucket(p), Some(Bucket::new(b)));
                occupied += 1;
            }
        }
        assert_eq!(occupied, map.len());
    }

    #[test]
    fn test_bucket_wraps() {
        let b = Bucket::new(7);
        assert_eq!(b.successor(8), Bucket::new(0));
        assert_eq!(Bucket::new(0).predecessor(8), Bucket::new(7));
        assert_eq!(b.advanced(-9, 8), Bucket::new(6));
        assert_eq!(b.advanced(17, 8), Bucket::new(0));
    }

    #[test]
    fn test_push_and_lookup() {
        let mut m = BucketMap::new(8);
        m.push(Bucket::new(3));
        m.push(Bucket::new(5));
        m.set(2, Some(Bucket::new(0)));
        assert_eq!(m.len(), 3);
        assert_eq!(m.bucket(0), Some(Bucket::new(3)));
        assert_eq!(m.bucket(2), Some(Bucket::new(0)));
        assert_eq!(m.position(Bucket::new(5)), Some(1));
        assert_eq!(m.position(Bucket::new(1)), None);
        assert_bijective(&m);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "appears twice in one insertion")]
    fn test_insert_rejects_repeated_bucket() {
        let mut m = BucketMap::new(8);
        m.push(Bucket::new(1));
        m.insert(&[Bucket::new(4), Bucket::new(4)], 0);
    }

    #[test]
    fn test_insert_shifts_positions() {
        let mut m = BucketMap::new(8);
        m.push(Bucket::new(1));
        m.push(Bucket::new(2));
        m.insert(&[Bucket::new(6), Bucket::new(7)], 1);
        let order: Vec<_> = m.iter().map(Bucket::index).collect();
        assert_eq!(order, vec![1, 6, 7, 2]);
        assert_eq!(m.position(Bucket::new(2)), Some(3));
        assert_bijective(&m);
    }

    #[test]
    fn test_remove_and_clear_via_set() {
        let mut m = BucketMap::new(4);
        for b in [0, 1, 2] {
            m.push(Bucket::new(b));
        }
        m.set(0, None);
        assert_eq!(m.position(Bucket::new(0)), None);
        assert_eq!(m.position(Bucket::new(2)), Some(1));
        assert_bijective(&m);

        m.clear();
        assert!(m.is_empty());
        assert!(!m.is_occupied(Bucket::new(1)));
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut m = BucketMap::new(8);
        for b in [4, 5, 6] {
            m.push(Bucket::new(b));
        }
        m.replace(Bucket::new(5), Bucket::new(0));
        let order: Vec<_> = m.iter().map(Bucket::index).collect();
        assert_eq!(order, vec![4, 0, 6]);
        assert!(!m.is_occupied(Bucket::new(5)));
        assert_bijective(&m);

        m.set(2, Some(Bucket::new(1)));
        assert_eq!(m.bucket(2), Some(Bucket::new(1)));
        assert!(!m.is_occupied(Bucket::new(6)));
    }

    #[test]
    #[should_panic(expected = "capacity 2 exhausted")]
    fn test_overflow_panics() {
        let mut m = BucketMap::new(2);
        m.push(Bucket::new(0));
        m.push(Bucket::new(1));
        m.push(Bucket::new(1));
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_non_power_of_two_panics() {
        let _ = BucketMap::new(6);
    }
}
