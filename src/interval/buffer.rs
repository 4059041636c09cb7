//! Sorted run of disjoint, non-adjacent intervals behind a shared block.

use std::sync::Arc;

use super::endpoint::{Endpoint, Interval};

/// Where an endpoint or point falls relative to the stored intervals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchIndex {
    /// Inside the interval at this index.
    Exact(usize),
    /// In the gap right after the interval at this index.
    Predecessor(usize),
    /// Before every interval (the index is always 0; the map may be empty).
    Successor(usize),
}

impl SearchIndex {
    #[inline]
    pub fn exact(self) -> Option<usize> {
        match self {
            Self::Exact(i) => Some(i),
            _ => None,
        }
    }
}

/// How one side of an inserted interval meets the stored elements.
enum Join {
    /// The side lands in (or touches) the element at this index.
    Absorb(usize),
    /// The side lands in open space; the splice boundary is this index.
    Free(usize),
}

pub(crate) struct IntervalMapBuffer<B: Ord> {
    elements: Arc<Vec<Interval<B>>>,
}

impl<B: Ord> Clone for IntervalMapBuffer<B> {
    fn clone(&self) -> Self {
        Self {
            elements: Arc::clone(&self.elements),
        }
    }
}

impl<B: Ord> IntervalMapBuffer<B> {
    pub(crate) fn new() -> Self {
        Self {
            elements: Arc::new(Vec::new()),
        }
    }

    /// Adopts elements that are already sorted, disjoint and non-adjacent.
    pub(crate) fn from_normalized(elements: Vec<Interval<B>>) -> Self {
        Self {
            elements: Arc::new(elements),
        }
    }

    #[inline]
    pub(crate) fn elements(&self) -> &[Interval<B>] {
        &self.elements
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub(crate) fn identical(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.elements, &other.elements)
    }

    /// Locates `endpoint` among the stored intervals in O(log n).
    pub(crate) fn search(&self, endpoint: &Endpoint<B>) -> SearchIndex {
        let i = self.elements.partition_point(|e| e.upper() < endpoint);
        if i < self.len() && self.elements[i].lower() <= endpoint {
            SearchIndex::Exact(i)
        } else if i == 0 {
            SearchIndex::Successor(0)
        } else {
            SearchIndex::Predecessor(i - 1)
        }
    }

    pub(crate) fn search_point(&self, point: &B) -> SearchIndex {
        let i = self
            .elements
            .partition_point(|e| e.upper().cmp_point(point).is_lt());
        if i < self.len() && self.elements[i].lower().cmp_point(point).is_le() {
            SearchIndex::Exact(i)
        } else if i == 0 {
            SearchIndex::Successor(0)
        } else {
            SearchIndex::Predecessor(i - 1)
        }
    }

    pub(crate) fn search_interval(&self, interval: &Interval<B>) -> (SearchIndex, SearchIndex) {
        (self.search(interval.lower()), self.search(interval.upper()))
    }
}

impl<B: Ord + Clone> IntervalMapBuffer<B> {
    fn elements_mut(&mut self) -> &mut Vec<Interval<B>> {
        if Arc::get_mut(&mut self.elements).is_none() {
            tracing::trace!(count = self.len(), "cloning shared interval storage");
        }
        Arc::make_mut(&mut self.elements)
    }

    /// Replaces `elements[range]` with `replacement`, moving the tail once.
    fn shift<I>(&mut self, range: std::ops::Range<usize>, replacement: I)
    where
        I: IntoIterator<Item = Interval<B>>,
    {
        drop(self.elements_mut().splice(range, replacement));
    }

    /// Element `i` ends right where `lower` begins (or overlaps it).
    fn touches_after(&self, i: usize, lower: &Endpoint<B>) -> bool {
        *lower <= self.elements[i].upper().inverted()
    }

    /// Element `j` begins right where `upper` ends (or overlaps it).
    fn touches_before(&self, j: usize, upper: &Endpoint<B>) -> bool {
        j < self.len() && *self.elements[j].lower() <= upper.inverted()
    }

    fn join_lower(&self, found: SearchIndex, lower: &Endpoint<B>) -> Join {
        match found {
            SearchIndex::Exact(i) => Join::Absorb(i),
            SearchIndex::Predecessor(i) if self.touches_after(i, lower) => Join::Absorb(i),
            SearchIndex::Predecessor(i) => Join::Free(i + 1),
            SearchIndex::Successor(i) => Join::Free(i),
        }
    }

    fn join_upper(&self, found: SearchIndex, upper: &Endpoint<B>) -> Join {
        match found {
            SearchIndex::Exact(j) => Join::Absorb(j),
            SearchIndex::Predecessor(j) if self.touches_before(j + 1, upper) => Join::Absorb(j + 1),
            SearchIndex::Predecessor(j) => Join::Free(j + 1),
            SearchIndex::Successor(j) if self.touches_before(j, upper) => Join::Absorb(j),
            SearchIndex::Successor(j) => Join::Free(j),
        }
    }

    /// Adds every value of `interval`, merging whatever it overlaps or touches.
    pub(crate) fn insert(&mut self, interval: Interval<B>) {
        let (lo, hi) = self.search_interval(&interval);
        let lower_join = self.join_lower(lo, interval.lower());
        let upper_join = self.join_upper(hi, interval.upper());
        let (lower, upper) = (interval.lower().clone(), interval.upper().clone());

        let (range, lower, upper) = match (lower_join, upper_join) {
            (Join::Absorb(i), Join::Absorb(j)) => (
                i..j + 1,
                self.elements[i].lower().clone(),
                self.elements[j].upper().clone(),
            ),
            (Join::Absorb(i), Join::Free(end)) => (i..end, self.elements[i].lower().clone(), upper),
            (Join::Free(start), Join::Absorb(j)) => {
                (start..j + 1, lower, self.elements[j].upper().clone())
            }
            (Join::Free(start), Join::Free(end)) => (start..end, lower, upper),
        };
        let merged = Interval::from_endpoints(lower, upper)
            .expect("merged interval spans the inserted one");
        self.shift(range, Some(merged));
    }

    /// Part of element `i` strictly below `lower`.
    fn remainder_below(&self, i: usize, lower: &Endpoint<B>) -> Option<Interval<B>> {
        Interval::from_endpoints(self.elements[i].lower().clone(), lower.inverted())
    }

    /// Part of element `j` strictly above `upper`.
    fn remainder_above(&self, j: usize, upper: &Endpoint<B>) -> Option<Interval<B>> {
        Interval::from_endpoints(upper.inverted(), self.elements[j].upper().clone())
    }

    /// Removes every value of `interval`, splitting partially covered elements.
    pub(crate) fn remove(&mut self, interval: &Interval<B>) {
        let (lo, hi) = self.search_interval(interval);
        let (start, below) = match lo {
            SearchIndex::Exact(i) => (i, self.remainder_below(i, interval.lower())),
            SearchIndex::Predecessor(i) => (i + 1, None),
            SearchIndex::Successor(i) => (i, None),
        };
        let (end, above) = match hi {
            SearchIndex::Exact(j) => (j + 1, self.remainder_above(j, interval.upper())),
            SearchIndex::Predecessor(j) => (j + 1, None),
            SearchIndex::Successor(j) => (j, None),
        };
        if start == end && below.is_none() && above.is_none() {
            return;
        }
        self.shift(start..end.max(start), below.into_iter().chain(above));
    }

    /// The gaps between stored intervals, clipped to `coverage`.
    pub(crate) fn inverted(&self, coverage: &Interval<B>) -> Vec<Interval<B>> {
        let mut gaps = Vec::new();
        let mut cursor = coverage.lower().clone();
        for element in self.elements.iter().filter(|e| e.overlaps(coverage)) {
            let gap_end = element.lower().inverted().min(coverage.upper().clone());
            if let Some(gap) = Interval::from_endpoints(cursor.clone(), gap_end) {
                gaps.push(gap);
            }
            cursor = cursor.max(element.upper().inverted());
        }
        if let Some(gap) = Interval::from_endpoints(cursor, coverage.upper().clone()) {
            gaps.push(gap);
        }
        gaps
    }

    pub(crate) fn clear(&mut self) {
        self.elements = Arc::new(Vec::new());
    }

    #[cfg(test)]
    pub(crate) fn validate(&self)
    where
        B: std::fmt::Debug,
    {
        for pair in self.elements.windows(2) {
            assert!(
                pair[0].upper().inverted() < *pair[1].lower(),
                "intervals {:?} and {:?} overlap or touch",
                pair[0].upper(),
                pair[1].lower(),
            );
        }
    }
}

/// Sorts arbitrary intervals and merges overlapping or touching neighbors.
pub(crate) fn normalize<B: Ord + Clone>(mut intervals: Vec<Interval<B>>) -> Vec<Interval<B>> {
    intervals.sort_by(|a, b| a.lower().cmp(b.lower()));
    let mut merged: Vec<Interval<B>> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if *interval.lower() <= last.upper().inverted() => {
                if interval.upper() > last.upper() {
                    *last = Interval::from_endpoints(last.lower().clone(), interval.upper().clone())
                        .expect("extending an interval keeps it non-empty");
                }
            }
            _ => merged.push(interval),
        }
    }
    merged
}
