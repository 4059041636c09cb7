//! Sets of discrete values stored as maximal closed ranges.

mod buffer;
mod stride;

use std::fmt;
use std::iter::FusedIterator;
use std::ops::RangeInclusive;
use std::slice;

pub use stride::Strideable;

use crate::error::{Error, Result};
use crate::interval::SearchIndex;
use buffer::{combining_sort, rangify, RangeMapBuffer};

/// A set of integer-like values stored as sorted, disjoint, non-adjacent
/// closed ranges.
///
/// Because every bound has an exact successor, `5..=5` and `6..=6` are
/// adjacent and collapse into `5..=6`. Cloning is O(1); the first mutation of
/// a shared map copies its bounds.
pub struct CountableRangeMap<B> {
    buffer: RangeMapBuffer<B>,
}

impl<B> Clone for CountableRangeMap<B> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
        }
    }
}

impl<B: Strideable> Default for CountableRangeMap<B> {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_bounds<B: Strideable>(range: RangeInclusive<B>) -> Result<(B, B)> {
    let (lower, upper) = range.into_inner();
    if lower > upper {
        return Err(Error::InvertedBounds);
    }
    Ok((lower, upper))
}

fn bounds_or_panic<B: Strideable>(range: RangeInclusive<B>) -> (B, B) {
    match checked_bounds(range) {
        Ok(bounds) => bounds,
        Err(err) => panic!("{err}"),
    }
}

impl<B: Strideable> CountableRangeMap<B> {
    pub fn new() -> Self {
        Self {
            buffer: RangeMapBuffer::new(),
        }
    }

    /// Builds a map from arbitrary (possibly overlapping) ranges.
    ///
    /// # Panics
    ///
    /// Panics if any range has its lower bound above its upper bound.
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = RangeInclusive<B>>,
    {
        let ranges: Vec<_> = ranges.into_iter().map(bounds_or_panic).collect();
        let input = ranges.len();
        let bounds = combining_sort(ranges);
        tracing::debug!(input, merged = bounds.len() / 2, "built range map from ranges");
        Self {
            buffer: RangeMapBuffer::from_normalized(bounds),
        }
    }

    /// Builds a map covering exactly the given values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = B>,
    {
        let values: Vec<_> = values.into_iter().collect();
        let input = values.len();
        let bounds = rangify(values);
        tracing::debug!(input, merged = bounds.len() / 2, "built range map from values");
        Self {
            buffer: RangeMapBuffer::from_normalized(bounds),
        }
    }

    /// Number of stored ranges.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<RangeInclusive<B>> {
        (index < self.len()).then(|| self.buffer.lower(index)..=self.buffer.upper(index))
    }

    pub fn first(&self) -> Option<RangeInclusive<B>> {
        self.get(0)
    }

    pub fn last(&self) -> Option<RangeInclusive<B>> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn ranges(&self) -> Ranges<'_, B> {
        Ranges {
            pairs: self.buffer.bounds().chunks_exact(2),
        }
    }

    /// Every covered value, in ascending order.
    pub fn values(&self) -> CoveredValues<'_, B> {
        CoveredValues {
            ranges: self.ranges(),
            current: None,
        }
    }

    /// Total number of covered values.
    pub fn covered_count(&self) -> u128 {
        self.ranges()
            .map(|r| r.start().distance(*r.end()).unsigned_abs().saturating_add(1))
            .fold(0u128, u128::saturating_add)
    }

    pub fn search(&self, value: B) -> SearchIndex {
        self.buffer.search(value)
    }

    pub fn contains(&self, value: B) -> bool {
        self.index_of(value).is_some()
    }

    /// Index of the range containing `value`.
    pub fn index_of(&self, value: B) -> Option<usize> {
        self.search(value).exact()
    }

    /// The smallest range containing every stored value.
    pub fn coverage(&self) -> Option<RangeInclusive<B>> {
        let last = self.len().checked_sub(1)?;
        Some(self.buffer.lower(0)..=self.buffer.upper(last))
    }

    /// Adds `value`. Returns the index of the range that now holds it.
    pub fn insert(&mut self, value: B) -> usize {
        self.buffer.insert(value, value)
    }

    /// # Panics
    ///
    /// Panics if the range has its lower bound above its upper bound.
    pub fn insert_range(&mut self, range: RangeInclusive<B>) -> usize {
        let (lower, upper) = bounds_or_panic(range);
        self.buffer.insert(lower, upper)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvertedBounds`] if the lower bound is above the upper.
    pub fn try_insert_range(&mut self, range: RangeInclusive<B>) -> Result<usize> {
        let (lower, upper) = checked_bounds(range)?;
        Ok(self.buffer.insert(lower, upper))
    }

    pub fn remove(&mut self, value: B) {
        self.buffer.remove(value, value);
    }

    /// # Panics
    ///
    /// Panics if the range has its lower bound above its upper bound.
    pub fn remove_range(&mut self, range: RangeInclusive<B>) {
        let (lower, upper) = bounds_or_panic(range);
        self.buffer.remove(lower, upper);
    }

    /// # Errors
    ///
    /// Returns [`Error::InvertedBounds`] if the lower bound is above the upper.
    pub fn try_remove_range(&mut self, range: RangeInclusive<B>) -> Result<()> {
        let (lower, upper) = checked_bounds(range)?;
        self.buffer.remove(lower, upper);
        Ok(())
    }

    /// The values of `coverage` that this map does not contain.
    ///
    /// # Panics
    ///
    /// Panics if `coverage` has its lower bound above its upper bound.
    pub fn inverted(&self, coverage: RangeInclusive<B>) -> Self {
        let (lower, upper) = bounds_or_panic(coverage);
        Self {
            buffer: RangeMapBuffer::from_normalized(self.buffer.inverted(lower, upper)),
        }
    }

    pub fn invert(&mut self, coverage: RangeInclusive<B>) {
        *self = self.inverted(coverage);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.form_union(other);
        result
    }

    pub fn form_union(&mut self, other: &Self) {
        for range in other.ranges() {
            self.buffer.insert(*range.start(), *range.end());
        }
    }

    pub fn subtracting(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.subtract(other);
        result
    }

    pub fn subtract(&mut self, other: &Self) {
        for range in other.ranges() {
            self.buffer.remove(*range.start(), *range.end());
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Iterator over the stored ranges of a [`CountableRangeMap`].
#[derive(Clone)]
pub struct Ranges<'a, B> {
    pairs: slice::ChunksExact<'a, B>,
}

impl<B: Copy> Iterator for Ranges<'_, B> {
    type Item = RangeInclusive<B>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pairs.next().map(|pair| pair[0]..=pair[1])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pairs.size_hint()
    }
}

impl<B: Copy> DoubleEndedIterator for Ranges<'_, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.pairs.next_back().map(|pair| pair[0]..=pair[1])
    }
}

impl<B: Copy> ExactSizeIterator for Ranges<'_, B> {}
impl<B: Copy> FusedIterator for Ranges<'_, B> {}

/// Iterator over every value covered by a [`CountableRangeMap`].
#[derive(Clone)]
pub struct CoveredValues<'a, B> {
    ranges: Ranges<'a, B>,
    /// Next value to yield and the last value of its range.
    current: Option<(B, B)>,
}

impl<B: Strideable> Iterator for CoveredValues<'_, B> {
    type Item = B;

    fn next(&mut self) -> Option<B> {
        let (value, end) = match self.current {
            Some(cursor) => cursor,
            None => {
                let range = self.ranges.next()?;
                (*range.start(), *range.end())
            }
        };
        self.current = if value < end {
            value.successor().map(|next| (next, end))
        } else {
            None
        };
        Some(value)
    }
}

impl<B: Strideable> FusedIterator for CoveredValues<'_, B> {}

impl<B: Strideable> fmt::Debug for CountableRangeMap<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ranges()).finish()
    }
}

impl<B: Strideable> PartialEq for CountableRangeMap<B> {
    fn eq(&self, other: &Self) -> bool {
        self.buffer.identical(&other.buffer) || self.buffer.bounds() == other.buffer.bounds()
    }
}

impl<B: Strideable> Eq for CountableRangeMap<B> {}

impl<B: Strideable> FromIterator<B> for CountableRangeMap<B> {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

impl<B: Strideable> Extend<B> for CountableRangeMap<B> {
    fn extend<I: IntoIterator<Item = B>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, B: Strideable> IntoIterator for &'a CountableRangeMap<B> {
    type Item = RangeInclusive<B>;
    type IntoIter = Ranges<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges()
    }
}

#[cfg(test)]
impl<B: Strideable> CountableRangeMap<B> {
    pub(crate) fn validate(&self) {
        self.buffer.validate();
    }
}
