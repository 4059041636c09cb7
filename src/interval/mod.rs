//! Sets of values stored as maximally merged intervals.

mod buffer;
mod endpoint;

use std::fmt;
use std::ops::Index;
use std::slice;

pub use buffer::SearchIndex;
pub use endpoint::{Endpoint, EndpointKind, Interval, Side};

use buffer::{normalize, IntervalMapBuffer};

/// A set of values represented as sorted, disjoint, non-adjacent intervals.
///
/// Inserting an interval merges it with every stored interval it overlaps or
/// touches, so `[1, 3)` followed by `[3, 5)` is stored as `[1, 5)`. Removing
/// an interval splits whatever it partially covers. Cloning is O(1); the
/// first mutation of a shared map copies its intervals.
pub struct IntervalMap<B: Ord> {
    buffer: IntervalMapBuffer<B>,
}

impl<B: Ord> Clone for IntervalMap<B> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
        }
    }
}

impl<B: Ord> Default for IntervalMap<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Ord> IntervalMap<B> {
    pub fn new() -> Self {
        Self {
            buffer: IntervalMapBuffer::new(),
        }
    }

    /// Number of stored (merged) intervals.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&Interval<B>> {
        self.buffer.elements().get(index)
    }

    pub fn first(&self) -> Option<&Interval<B>> {
        self.buffer.elements().first()
    }

    pub fn last(&self) -> Option<&Interval<B>> {
        self.buffer.elements().last()
    }

    pub fn iter(&self) -> slice::Iter<'_, Interval<B>> {
        self.buffer.elements().iter()
    }

    pub fn as_slice(&self) -> &[Interval<B>] {
        self.buffer.elements()
    }

    pub fn search(&self, endpoint: &Endpoint<B>) -> SearchIndex {
        self.buffer.search(endpoint)
    }

    pub fn search_point(&self, point: &B) -> SearchIndex {
        self.buffer.search_point(point)
    }

    pub fn search_interval(&self, interval: &Interval<B>) -> (SearchIndex, SearchIndex) {
        self.buffer.search_interval(interval)
    }

    pub fn contains(&self, point: &B) -> bool {
        self.search_point(point).exact().is_some()
    }

    /// Whether a single stored interval covers all of `interval`.
    pub fn contains_interval(&self, interval: &Interval<B>) -> bool {
        match self.search_interval(interval) {
            (SearchIndex::Exact(i), SearchIndex::Exact(j)) => i == j,
            _ => false,
        }
    }

    /// Index of the stored interval containing `point`.
    pub fn index_of(&self, point: &B) -> Option<usize> {
        self.search_point(point).exact()
    }
}

impl<B: Ord + Clone> IntervalMap<B> {
    /// Builds a map from arbitrary intervals in O(n log n).
    pub fn from_intervals<I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = Interval<B>>,
    {
        let intervals: Vec<_> = intervals.into_iter().collect();
        let input = intervals.len();
        let merged = normalize(intervals);
        tracing::debug!(input, merged = merged.len(), "built interval map");
        Self {
            buffer: IntervalMapBuffer::from_normalized(merged),
        }
    }

    /// Builds a map covering exactly the given points.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = B>,
    {
        Self::from_intervals(points.into_iter().map(Interval::point))
    }

    /// The smallest interval containing every stored value.
    pub fn coverage(&self) -> Option<Interval<B>> {
        let (first, last) = (self.first()?, self.last()?);
        Interval::from_endpoints(first.lower().clone(), last.upper().clone())
    }

    pub fn insert(&mut self, interval: Interval<B>) {
        self.buffer.insert(interval);
    }

    pub fn insert_point(&mut self, point: B) {
        self.insert(Interval::point(point));
    }

    pub fn remove(&mut self, interval: &Interval<B>) {
        self.buffer.remove(interval);
    }

    pub fn remove_point(&mut self, point: &B) {
        self.remove(&Interval::point(point.clone()));
    }

    /// The values of `coverage` that this map does not contain.
    pub fn inverted(&self, coverage: &Interval<B>) -> Self {
        Self {
            buffer: IntervalMapBuffer::from_normalized(self.buffer.inverted(coverage)),
        }
    }

    pub fn invert(&mut self, coverage: &Interval<B>) {
        *self = self.inverted(coverage);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.form_union(other);
        result
    }

    pub fn form_union(&mut self, other: &Self) {
        for interval in other.iter() {
            self.insert(interval.clone());
        }
    }

    pub fn subtracting(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.subtract(other);
        result
    }

    pub fn subtract(&mut self, other: &Self) {
        for interval in other.iter() {
            self.remove(interval);
        }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        match self.coverage() {
            Some(coverage) if !other.is_empty() => self.subtracting(&other.inverted(&coverage)),
            _ => Self::new(),
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl<B: Ord + fmt::Debug> fmt::Debug for IntervalMap<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<B: Ord> PartialEq for IntervalMap<B> {
    fn eq(&self, other: &Self) -> bool {
        self.buffer.identical(&other.buffer) || self.as_slice() == other.as_slice()
    }
}

impl<B: Ord> Eq for IntervalMap<B> {}

impl<B: Ord> Index<usize> for IntervalMap<B> {
    type Output = Interval<B>;

    fn index(&self, index: usize) -> &Interval<B> {
        &self.buffer.elements()[index]
    }
}

impl<B: Ord + Clone> FromIterator<Interval<B>> for IntervalMap<B> {
    fn from_iter<I: IntoIterator<Item = Interval<B>>>(iter: I) -> Self {
        Self::from_intervals(iter)
    }
}

impl<B: Ord + Clone> Extend<Interval<B>> for IntervalMap<B> {
    fn extend<I: IntoIterator<Item = Interval<B>>>(&mut self, iter: I) {
        for interval in iter {
            self.insert(interval);
        }
    }
}

impl<'a, B: Ord> IntoIterator for &'a IntervalMap<B> {
    type Item = &'a Interval<B>;
    type IntoIter = slice::Iter<'a, Interval<B>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
impl<B: Ord + Clone + fmt::Debug> IntervalMap<B> {
    pub(crate) fn validate(&self) {
        self.buffer.validate();
    }
}
