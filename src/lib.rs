//! # ordered-storage
//!
//! Ordered collections over hand-managed, copy-on-write backing storage.
//!
//! - [`OrderedDictionary`] / [`OrderedSet`]: hash lookup with insertion-ordered
//!   iteration, built on an open-addressing table plus a [`BucketMap`] that
//!   translates logical positions into physical buckets.
//! - [`SortedDictionary`]: the same table, with positions kept in key order.
//! - [`IntervalMap`]: a maximally merged set of disjoint intervals with
//!   open/closed endpoints over any `Ord` bound.
//! - [`CountableRangeMap`]: the same idea for integer-like bounds, stored as a
//!   flat run of closed `lower, upper` pairs.
//!
//! Every collection is a value: `clone()` is O(1) and shares storage, and the
//! first mutation of a shared copy clones the backing block.
//!
//! ## Example
//!
//! ```rust
//! use ordered_storage::{CountableRangeMap, Interval, IntervalMap, OrderedDictionary};
//!
//! let mut dict: OrderedDictionary<&str, i32> =
//!     [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
//! dict.remove_value("b");
//! dict.append("d", 4);
//! assert_eq!(dict.iter().collect::<Vec<_>>(), vec![(&"a", &1), (&"c", &3), (&"d", &4)]);
//!
//! let mut intervals = IntervalMap::new();
//! intervals.insert(Interval::closed_open(1, 3));
//! intervals.insert(Interval::closed_open(3, 5));
//! assert_eq!(intervals.iter().collect::<Vec<_>>(), vec![&Interval::closed_open(1, 5)]);
//!
//! let mut ranges = CountableRangeMap::new();
//! ranges.insert(5);
//! ranges.insert(7);
//! ranges.insert(6);
//! assert_eq!(ranges.ranges().collect::<Vec<_>>(), vec![5..=7]);
//! ```

#![forbid(unsafe_code)]

mod bucket;
mod dictionary;
mod error;
mod interval;
mod range_map;
mod set;
mod storage;

pub use bucket::{Bucket, BucketMap};
pub use dictionary::sorted::SortedDictionary;
pub use dictionary::{IntoIter, Iter, Keys, OrderedDictionary, Values, ValuesMut};
pub use error::{Error, Result};
pub use interval::{Endpoint, EndpointKind, Interval, IntervalMap, SearchIndex, Side};
pub use range_map::{CountableRangeMap, CoveredValues, Ranges, Strideable};
pub use set::OrderedSet;

// =============================================================================
// Configuration
// =============================================================================

/// Maximum load factor of a hashed storage block, as `NUM / DEN`.
pub const MAX_LOAD_FACTOR_NUM: usize = 3;
pub const MAX_LOAD_FACTOR_DEN: usize = 4;

/// Smallest bucket array ever allocated (a power of two).
pub const MIN_BUCKET_COUNT: usize = 8;

#[cfg(test)]
mod proptests;
