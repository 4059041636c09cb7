//! Flat run of closed range bounds behind a shared block.
//!
//! `bounds` holds `lower, upper` pairs back to back, so pair `i` is
//! `bounds[2 * i]..=bounds[2 * i + 1]`. Pairs are sorted, disjoint and never
//! adjacent: between two stored ranges there is always at least one value.

use std::ops::Range;
use std::sync::Arc;

use super::stride::Strideable;
use crate::interval::SearchIndex;

/// Which half of a pair a flat bound index refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Limit {
    Lower,
    Upper,
}

impl Limit {
    #[inline]
    pub(crate) fn of(flat: usize) -> Self {
        if flat % 2 == 0 {
            Limit::Lower
        } else {
            Limit::Upper
        }
    }
}

/// `upper` is immediately followed by `lower`.
#[inline]
fn touching<B: Strideable>(upper: B, lower: B) -> bool {
    upper.successor() == Some(lower)
}

pub(crate) struct RangeMapBuffer<B> {
    bounds: Arc<Vec<B>>,
}

impl<B> Clone for RangeMapBuffer<B> {
    fn clone(&self) -> Self {
        Self {
            bounds: Arc::clone(&self.bounds),
        }
    }
}

impl<B: Strideable> RangeMapBuffer<B> {
    pub(crate) fn new() -> Self {
        Self {
            bounds: Arc::new(Vec::new()),
        }
    }

    /// Adopts `lower, upper` pairs that already satisfy the run invariants.
    pub(crate) fn from_normalized(bounds: Vec<B>) -> Self {
        debug_assert!(bounds.len() % 2 == 0);
        Self {
            bounds: Arc::new(bounds),
        }
    }

    #[inline]
    pub(crate) fn bounds(&self) -> &[B] {
        &self.bounds
    }

    /// Number of stored ranges.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.bounds.len() / 2
    }

    #[inline]
    pub(crate) fn identical(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bounds, &other.bounds)
    }

    #[inline]
    pub(crate) fn lower(&self, index: usize) -> B {
        self.bounds[2 * index]
    }

    #[inline]
    pub(crate) fn upper(&self, index: usize) -> B {
        self.bounds[2 * index + 1]
    }

    /// Locates `value` among the stored ranges in O(log n).
    pub(crate) fn search(&self, value: B) -> SearchIndex {
        let flat = self.bounds.partition_point(|b| *b < value);
        let on_bound = flat < self.bounds.len() && self.bounds[flat] == value;
        match (on_bound, Limit::of(flat)) {
            (true, _) | (false, Limit::Upper) => SearchIndex::Exact(flat / 2),
            (false, Limit::Lower) if flat == 0 => SearchIndex::Successor(0),
            (false, Limit::Lower) => SearchIndex::Predecessor(flat / 2 - 1),
        }
    }

    fn bounds_mut(&mut self) -> &mut Vec<B> {
        if Arc::get_mut(&mut self.bounds).is_none() {
            tracing::trace!(count = self.len(), "cloning shared range storage");
        }
        Arc::make_mut(&mut self.bounds)
    }

    /// Replaces the pairs in `pairs` with `replacement` bounds.
    fn shift<I>(&mut self, pairs: Range<usize>, replacement: I)
    where
        I: IntoIterator<Item = B>,
    {
        let flat = 2 * pairs.start..2 * pairs.end;
        drop(self.bounds_mut().splice(flat, replacement));
    }

    /// Merges pair `index` with either neighbor it now touches. Returns the
    /// index the merged range ends up at.
    fn check_index(&mut self, index: usize) -> usize {
        let mut index = index;
        if index > 0 && touching(self.upper(index - 1), self.lower(index)) {
            self.bounds_mut().drain(2 * index - 1..2 * index + 1);
            index -= 1;
        }
        if index + 1 < self.len() && touching(self.upper(index), self.lower(index + 1)) {
            self.bounds_mut().drain(2 * index + 1..2 * index + 3);
        }
        index
    }

    /// Adds every value of `lower..=upper`. Returns the index of the range
    /// that now holds them.
    pub(crate) fn insert(&mut self, lower: B, upper: B) -> usize {
        debug_assert!(lower <= upper);
        let (first, lower) = match self.search(lower) {
            SearchIndex::Exact(i) => (i, self.lower(i)),
            SearchIndex::Predecessor(i) => (i + 1, lower),
            SearchIndex::Successor(i) => (i, lower),
        };
        let (end, upper) = match self.search(upper) {
            SearchIndex::Exact(j) => (j + 1, self.upper(j)),
            SearchIndex::Predecessor(j) => (j + 1, upper),
            SearchIndex::Successor(j) => (j, upper),
        };
        self.shift(first..end, [lower, upper]);
        self.check_index(first)
    }

    /// Removes every value of `lower..=upper`, splitting partially covered
    /// ranges.
    pub(crate) fn remove(&mut self, lower: B, upper: B) {
        debug_assert!(lower <= upper);
        let (start, below) = match self.search(lower) {
            SearchIndex::Exact(i) => {
                let kept = self.lower(i);
                let below = if kept < lower {
                    lower.predecessor().map(|end| [kept, end])
                } else {
                    None
                };
                (i, below)
            }
            SearchIndex::Predecessor(i) => (i + 1, None),
            SearchIndex::Successor(i) => (i, None),
        };
        let (end, above) = match self.search(upper) {
            SearchIndex::Exact(j) => {
                let kept = self.upper(j);
                let above = if upper < kept {
                    upper.successor().map(|begin| [begin, kept])
                } else {
                    None
                };
                (j + 1, above)
            }
            SearchIndex::Predecessor(j) => (j + 1, None),
            SearchIndex::Successor(j) => (j, None),
        };
        if start == end && below.is_none() && above.is_none() {
            return;
        }
        let remainders = below.into_iter().chain(above).flatten();
        self.shift(start..end.max(start), remainders);
    }

    /// Bounds of the gaps between stored ranges, clipped to `lower..=upper`.
    pub(crate) fn inverted(&self, lower: B, upper: B) -> Vec<B> {
        let mut gaps = Vec::new();
        let mut cursor = Some(lower);
        let overlapping = self
            .bounds
            .chunks_exact(2)
            .filter(|pair| pair[1] >= lower && pair[0] <= upper);
        for pair in overlapping {
            let Some(begin) = cursor else { break };
            if pair[0] > begin {
                if let Some(end) = pair[0].predecessor() {
                    gaps.extend([begin, end.min(upper)]);
                }
            }
            cursor = pair[1].successor();
        }
        if let Some(begin) = cursor.filter(|begin| *begin <= upper) {
            gaps.extend([begin, upper]);
        }
        gaps
    }

    pub(crate) fn clear(&mut self) {
        self.bounds = Arc::new(Vec::new());
    }

    #[cfg(test)]
    pub(crate) fn validate(&self) {
        assert!(self.bounds.len() % 2 == 0, "odd bound count");
        for pair in self.bounds.chunks_exact(2) {
            assert!(pair[0] <= pair[1], "inverted range {:?}..={:?}", pair[0], pair[1]);
        }
        for i in 1..self.len() {
            let (upper, lower) = (self.upper(i - 1), self.lower(i));
            assert!(
                upper < lower && !touching(upper, lower),
                "ranges ending at {upper:?} and starting at {lower:?} overlap or touch"
            );
        }
    }
}

/// Collapses sorted, deduplicated values into maximal runs.
pub(crate) fn rangify<B: Strideable>(mut values: Vec<B>) -> Vec<B> {
    values.sort_unstable();
    values.dedup();
    let mut bounds: Vec<B> = Vec::new();
    for value in values {
        match bounds.last_mut() {
            Some(upper) if touching(*upper, value) => *upper = value,
            _ => bounds.extend([value, value]),
        }
    }
    bounds
}

/// Sorts arbitrary closed ranges and merges overlapping or touching ones.
pub(crate) fn combining_sort<B: Strideable>(mut ranges: Vec<(B, B)>) -> Vec<B> {
    ranges.sort_unstable_by_key(|&(lower, _)| lower);
    let mut bounds: Vec<B> = Vec::with_capacity(ranges.len() * 2);
    for (lower, upper) in ranges {
        match bounds.last_mut() {
            Some(last) if last.successor().map_or(true, |next| lower <= next) => {
                *last = (*last).max(upper);
            }
            _ => bounds.extend([lower, upper]),
        }
    }
    bounds
}
