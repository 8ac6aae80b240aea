//! Summary statistics of a finished packing.

use crate::algorithm::Algorithm;
use crate::collection::BinCollection;
use crate::item::Size;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Statistics derived from a packed [`BinCollection`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackingSummary {
    /// Algorithm that produced the packing.
    pub algorithm: Algorithm,

    /// Bin capacity.
    pub capacity: Size,

    /// Number of bins in the collection.
    pub bins: usize,

    /// Number of bins holding at least one item.
    pub used_bins: usize,

    /// Number of packed items.
    pub items: usize,

    /// Sum of the sizes of all packed items.
    pub total_usage: Size,

    /// Mean usage of the non-empty bins relative to capacity (0.0 - 1.0).
    pub average_fill: f64,

    /// Lower bound the packing is compared against.
    pub lower_bound: Option<usize>,

    /// Bins used above the lower bound.
    pub gap: Option<usize>,

    /// Solution time in nanoseconds, if the caller recorded one.
    pub solution_time_ns: Option<u64>,
}

impl PackingSummary {
    /// Summarizes `collection`, comparing against `lower_bound` if given.
    pub fn new(collection: &BinCollection, lower_bound: Option<usize>) -> Self {
        let used_bins = collection.used_bins();
        let total_usage = collection.total_usage();
        let average_fill = if used_bins == 0 || collection.capacity() == 0 {
            0.0
        } else {
            total_usage as f64 / (used_bins as f64 * collection.capacity() as f64)
        };

        Self {
            algorithm: collection.algorithm(),
            capacity: collection.capacity(),
            bins: collection.total_bins(),
            used_bins,
            items: collection.item_count(),
            total_usage,
            average_fill,
            lower_bound,
            gap: lower_bound.map(|bound| used_bins.saturating_sub(bound)),
            solution_time_ns: collection.solution_time_ns(),
        }
    }

    /// Returns true if the packing reaches the lower bound.
    pub fn meets_lower_bound(&self) -> bool {
        self.gap == Some(0)
    }

    /// Gap relative to the lower bound, e.g. `0.05` for 5% more bins.
    pub fn relative_gap(&self) -> Option<f64> {
        match (self.gap, self.lower_bound) {
            (Some(gap), Some(bound)) if bound > 0 => Some(gap as f64 / bound as f64),
            _ => None,
        }
    }

    /// Solution time in milliseconds.
    pub fn solution_time_ms(&self) -> Option<f64> {
        self.solution_time_ns.map(|ns| ns as f64 / 1_000_000.0)
    }
}

impl std::fmt::Display for PackingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} bins, {} items, fill {:.1}%",
            self.algorithm,
            self.used_bins,
            self.items,
            self.average_fill * 100.0
        )?;
        if let (Some(bound), Some(gap)) = (self.lower_bound, self.gap) {
            write!(f, ", lower bound {bound} (+{gap})")?;
        }
        Ok(())
    }
}
