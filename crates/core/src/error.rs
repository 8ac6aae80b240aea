//! Error types for the packing engine.

use crate::item::Size;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while validating input or running a packing algorithm.
///
/// Everything except [`Error::Unsatisfiable`] is a configuration error: the
/// input was rejected before any bin was touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An algorithm name did not match any known algorithm.
    #[error("unknown algorithm: {0:?}")]
    UnknownAlgorithm(String),

    /// Bin capacity must be strictly positive.
    #[error("invalid bin capacity: {0}")]
    InvalidCapacity(Size),

    /// Item sizes must be strictly positive.
    #[error("item {index} has invalid size {size}")]
    InvalidItem {
        /// Position of the item in the input list.
        index: usize,
        /// Offending size.
        size: Size,
    },

    /// An item can never be placed because it exceeds the bin capacity.
    #[error("item {index} of size {size} exceeds bin capacity {capacity}")]
    ItemTooLarge {
        /// Position of the item in the input list.
        index: usize,
        /// Offending size.
        size: Size,
        /// Bin capacity of the instance.
        capacity: Size,
    },

    /// The declared item count disagrees with the supplied items.
    #[error("packing list declares {declared} items but contains {actual}")]
    ItemCountMismatch {
        /// Count declared in the packing list.
        declared: usize,
        /// Number of items actually present.
        actual: usize,
    },

    /// The constraint programming algorithm needs a precomputed lower bound.
    #[error("constraint programming requires a lower bound in the packing list")]
    MissingLowerBound,

    /// A lower bound of zero was supplied for a non-empty item list.
    #[error("lower bound {0} cannot hold a non-empty item list")]
    InvalidLowerBound(usize),

    /// A deserialized bin or bin collection breaks its own invariants.
    #[error("corrupt bin collection: {0}")]
    CorruptCollection(String),

    /// The constraint model has no solution with the available bins, or the
    /// search was stopped before one was found.
    #[error("no packing found using {bins} bins")]
    Unsatisfiable {
        /// Number of bins the model was built with.
        bins: usize,
    },
}

impl Error {
    /// Returns true for errors caused by invalid input or configuration.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Unsatisfiable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::ItemTooLarge {
            index: 3,
            size: 12,
            capacity: 10,
        };
        assert_eq!(
            err.to_string(),
            "item 3 of size 12 exceeds bin capacity 10"
        );
        assert_eq!(
            Error::UnknownAlgorithm("Worst".into()).to_string(),
            "unknown algorithm: \"Worst\""
        );
    }

    #[test]
    fn test_configuration_classification() {
        assert!(Error::MissingLowerBound.is_configuration());
        assert!(Error::InvalidCapacity(0).is_configuration());
        assert!(Error::CorruptCollection("count".into()).is_configuration());
        assert!(Error::InvalidLowerBound(0).is_configuration());
        assert!(!Error::Unsatisfiable { bins: 2 }.is_configuration());
    }
}
