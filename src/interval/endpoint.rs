use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Range, RangeInclusive};

use crate::error::{Error, Result};

/// Which end of an interval an endpoint bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Lower,
    Upper,
}

/// Whether the endpoint value itself belongs to the interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Closed,
    Open,
}

/// A directed interval endpoint.
///
/// Endpoints order by value first, then by where they sit relative to that
/// value: an open upper endpoint sits just below it, closed endpoints sit on
/// it, an open lower endpoint sits just above it. Under this order a point
/// `p` lies in `[lower, upper]` iff `lower <= p <= upper`, and the interval
/// following an upper endpoint `u` touches it iff its lower endpoint is
/// `<= u.inverted()`.
#[derive(Clone, Copy)]
pub struct Endpoint<B> {
    value: B,
    side: Side,
    kind: EndpointKind,
}

impl<B> Endpoint<B> {
    pub fn lower(value: B, kind: EndpointKind) -> Self {
        Self {
            value,
            side: Side::Lower,
            kind,
        }
    }

    pub fn upper(value: B, kind: EndpointKind) -> Self {
        Self {
            value,
            side: Side::Upper,
            kind,
        }
    }

    #[inline]
    pub fn value(&self) -> &B {
        &self.value
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.kind == EndpointKind::Closed
    }

    /// Position relative to `value`: -1 just below, 0 on, +1 just above.
    #[inline]
    fn offset(&self) -> i8 {
        match (self.side, self.kind) {
            (_, EndpointKind::Closed) => 0,
            (Side::Lower, EndpointKind::Open) => 1,
            (Side::Upper, EndpointKind::Open) => -1,
        }
    }

    /// The endpoint that bounds the complement on the other side of `self`.
    ///
    /// `[x` becomes `x)`, `(x` becomes `x]`, `x)` becomes `[x`, `x]` becomes `(x`.
    pub fn inverted(&self) -> Self
    where
        B: Clone,
    {
        Self {
            value: self.value.clone(),
            side: match self.side {
                Side::Lower => Side::Upper,
                Side::Upper => Side::Lower,
            },
            kind: match self.kind {
                EndpointKind::Closed => EndpointKind::Open,
                EndpointKind::Open => EndpointKind::Closed,
            },
        }
    }
}

impl<B: Ord> Endpoint<B> {
    /// Compares this endpoint against a point.
    pub fn cmp_point(&self, point: &B) -> Ordering {
        self.value.cmp(point).then(self.offset().cmp(&0))
    }
}

impl<B: Ord> Ord for Endpoint<B> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then(self.offset().cmp(&other.offset()))
    }
}

impl<B: Ord> PartialOrd for Endpoint<B> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<B: Ord> PartialEq for Endpoint<B> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<B: Ord> Eq for Endpoint<B> {}

impl<B: Ord + Hash> Hash for Endpoint<B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.offset().hash(state);
    }
}

impl<B: fmt::Debug> fmt::Debug for Endpoint<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.side, self.kind) {
            (Side::Lower, EndpointKind::Closed) => write!(f, "[{:?}", self.value),
            (Side::Lower, EndpointKind::Open) => write!(f, "({:?}", self.value),
            (Side::Upper, EndpointKind::Closed) => write!(f, "{:?}]", self.value),
            (Side::Upper, EndpointKind::Open) => write!(f, "{:?})", self.value),
        }
    }
}

/// A non-empty interval with independently open or closed ends.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval<B: Ord> {
    lower: Endpoint<B>,
    upper: Endpoint<B>,
}

impl<B: Ord> Interval<B> {
    /// # Panics
    ///
    /// Panics if the interval would contain no values.
    pub fn new(lower: B, lower_kind: EndpointKind, upper: B, upper_kind: EndpointKind) -> Self {
        match Self::try_new(lower, lower_kind, upper, upper_kind) {
            Ok(interval) => interval,
            Err(err) => panic!("{err}"),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::EmptyInterval`] if the interval would contain no values.
    pub fn try_new(
        lower: B,
        lower_kind: EndpointKind,
        upper: B,
        upper_kind: EndpointKind,
    ) -> Result<Self> {
        Self::from_endpoints(
            Endpoint::lower(lower, lower_kind),
            Endpoint::upper(upper, upper_kind),
        )
        .ok_or(Error::EmptyInterval)
    }

    /// `[lower, upper]`
    pub fn closed(lower: B, upper: B) -> Self {
        Self::new(lower, EndpointKind::Closed, upper, EndpointKind::Closed)
    }

    /// `(lower, upper)`
    pub fn open(lower: B, upper: B) -> Self {
        Self::new(lower, EndpointKind::Open, upper, EndpointKind::Open)
    }

    /// `[lower, upper)`
    pub fn closed_open(lower: B, upper: B) -> Self {
        Self::new(lower, EndpointKind::Closed, upper, EndpointKind::Open)
    }

    /// `(lower, upper]`
    pub fn open_closed(lower: B, upper: B) -> Self {
        Self::new(lower, EndpointKind::Open, upper, EndpointKind::Closed)
    }

    /// `[value, value]`
    pub fn point(value: B) -> Self
    where
        B: Clone,
    {
        Self::closed(value.clone(), value)
    }

    /// Builds an interval from a lower and an upper endpoint, or `None` if
    /// nothing lies between them.
    pub(crate) fn from_endpoints(lower: Endpoint<B>, upper: Endpoint<B>) -> Option<Self> {
        debug_assert_eq!(lower.side, Side::Lower);
        debug_assert_eq!(upper.side, Side::Upper);
        (lower <= upper).then_some(Self { lower, upper })
    }

    #[inline]
    pub fn lower(&self) -> &Endpoint<B> {
        &self.lower
    }

    #[inline]
    pub fn upper(&self) -> &Endpoint<B> {
        &self.upper
    }

    #[inline]
    pub fn lower_bound(&self) -> &B {
        &self.lower.value
    }

    #[inline]
    pub fn upper_bound(&self) -> &B {
        &self.upper.value
    }

    /// A single point: `[x, x]`.
    pub fn is_degenerate(&self) -> bool {
        self.lower.value == self.upper.value
    }

    pub fn contains(&self, point: &B) -> bool {
        self.lower.cmp_point(point).is_le() && self.upper.cmp_point(point).is_ge()
    }

    pub fn contains_interval(&self, other: &Self) -> bool {
        self.lower <= other.lower && other.upper <= self.upper
    }

    /// Shares at least one value with `other`.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }

    /// Shares no value with `other`, but their union has no gap.
    pub fn is_adjacent_to(&self, other: &Self) -> bool
    where
        B: Clone,
    {
        if self.overlaps(other) {
            return false;
        }
        let (first, second) = if self.upper < other.lower {
            (self, other)
        } else {
            (other, self)
        };
        second.lower <= first.upper.inverted()
    }
}

impl<B: Ord> From<Range<B>> for Interval<B> {
    fn from(range: Range<B>) -> Self {
        Self::closed_open(range.start, range.end)
    }
}

impl<B: Ord> From<RangeInclusive<B>> for Interval<B> {
    fn from(range: RangeInclusive<B>) -> Self {
        let (lower, upper) = range.into_inner();
        Self::closed(lower, upper)
    }
}

impl<B: Ord + fmt::Debug> fmt::Debug for Interval<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}, {:?}", self.lower, self.upper)
    }
}

impl<B: Ord + fmt::Display> fmt::Display for Interval<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.lower.is_closed() { '[' } else { '(' };
        let close = if self.upper.is_closed() { ']' } else { ')' };
        write!(f, "{open}{}, {}{close}", self.lower.value, self.upper.value)
    }
}
