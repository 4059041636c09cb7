use thiserror::Error;

/// Errors reported by the checked (`try_*`) entry points.
///
/// The panicking API treats the same conditions as broken preconditions. The
/// checked variants validate first and never leave a collection half-mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A logical position lies outside the collection.
    #[error("index out of bounds: index {index} is beyond length {len}")]
    IndexOutOfBounds {
        /// Position that was requested
        index: usize,
        /// Current number of elements
        len: usize,
    },
    /// The endpoints describe an interval containing no values.
    #[error("empty interval: lower endpoint lies after upper endpoint")]
    EmptyInterval,
    /// A closed range whose lower bound exceeds its upper bound.
    #[error("inverted bounds: lower bound exceeds upper bound")]
    InvertedBounds,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
