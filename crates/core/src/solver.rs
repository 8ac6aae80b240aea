//! Solver facade and configuration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::algorithm::Algorithm;
use crate::collection::BinCollection;
use crate::constraint::CspConfig;
use crate::error::Result;
use crate::item::{Item, Size};
use crate::packing_list::PackingList;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Common configuration for packing runs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Drop bins left empty after packing.
    pub compact_bins: bool,

    /// Constraint programming settings.
    pub csp: CspConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compact_bins: true,
            csp: CspConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables compaction of empty bins.
    pub fn with_compact_bins(mut self, compact: bool) -> Self {
        self.compact_bins = compact;
        self
    }

    /// Sets the constraint programming settings.
    pub fn with_csp(mut self, csp: CspConfig) -> Self {
        self.csp = csp;
        self
    }

    /// Sets the constraint search time limit in milliseconds.
    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.csp.time_limit_ms = ms;
        self
    }
}

/// Runs packing lists through the configured algorithm.
///
/// A packer can be shared between threads; [`BinPacker::cancel`] stops a
/// running constraint search, which then reports
/// [`Error::Unsatisfiable`](crate::Error::Unsatisfiable). The heuristics
/// finish too quickly to need cancellation.
///
/// ```rust
/// use binpack_core::{Algorithm, BinPacker, PackingList};
///
/// let list = PackingList::from_sizes(10, [6, 5, 4, 3, 2, 2, 1], Algorithm::BestFit);
/// let bins = BinPacker::default().solve(&list).unwrap();
/// assert_eq!(bins.total_bins(), 3);
/// ```
#[derive(Debug, Default)]
pub struct BinPacker {
    config: Config,
    cancelled: Arc<AtomicBool>,
}

impl BinPacker {
    /// Creates a packer with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validates `list`, builds its bin collection and packs every item.
    pub fn solve(&self, list: &PackingList) -> Result<BinCollection> {
        let mut collection = BinCollection::from_packing_list_with(list, &self.config)?;

        // Reset cancellation flag
        self.cancelled.store(false, Ordering::Relaxed);

        collection.pack_all_inner(&list.items, &self.config, Some(Arc::clone(&self.cancelled)))?;
        Ok(collection)
    }

    /// Packs raw items without a packing list.
    ///
    /// Constraint programming computes the lower bound itself.
    pub fn pack(&self, capacity: Size, items: &[Item], algorithm: Algorithm) -> Result<BinCollection> {
        let mut list = PackingList::new(capacity, items.to_vec(), algorithm);
        if algorithm == Algorithm::ConstraintProgramming {
            list = list.with_computed_lower_bound()?;
        }
        self.solve(&list)
    }

    /// Requests cancellation of the running search.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns true if cancellation was requested since the last solve
    /// started.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::CspEncoding;
    use crate::error::Error;
    use crate::item::items_from_sizes;

    fn usages(collection: &BinCollection) -> Vec<Size> {
        collection.bins().iter().map(|bin| bin.usage()).collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.compact_bins);
        assert_eq!(config.csp, CspConfig::default());

        let config = Config::new().with_compact_bins(false).with_time_limit(500);
        assert!(!config.compact_bins);
        assert_eq!(config.csp.time_limit_ms, 500);
    }

    #[test]
    fn test_solve_validates_list() {
        let list = PackingList::from_sizes(10, [3, 0], Algorithm::FirstFit);
        assert_eq!(
            BinPacker::default().solve(&list),
            Err(Error::InvalidItem { index: 1, size: 0 })
        );
    }

    #[test]
    fn test_solve_first_fit_decreasing() {
        let list = PackingList::from_sizes(10, [2, 6, 1, 5, 3, 4, 2], Algorithm::FirstFitDecreasing);
        let bins = BinPacker::default().solve(&list).unwrap();
        assert_eq!(usages(&bins), vec![9, 9, 5]);
    }

    #[test]
    fn test_pack_constraint_programming_computes_bound() {
        let items = items_from_sizes([7, 5, 4, 4, 3, 3, 2, 2]);
        let packer = BinPacker::new(
            Config::new().with_csp(CspConfig::new().with_encoding(CspEncoding::Indicator)),
        );
        let bins = packer
            .pack(10, &items, Algorithm::ConstraintProgramming)
            .unwrap();
        assert_eq!(bins.total_bins(), 3);
        assert!(bins.is_valid_packing_of(&items));
    }

    #[test]
    fn test_compaction_can_be_disabled() {
        // one pre-allocated bin more than needed
        let list = PackingList::from_sizes(10, [5, 5], Algorithm::ConstraintProgramming)
            .with_lower_bound(1);
        let csp = CspConfig::new().with_bin_slack(2.0);
        let kept = BinPacker::new(Config::new().with_csp(csp.clone()).with_compact_bins(false))
            .solve(&list)
            .unwrap();
        assert_eq!(usages(&kept), vec![10, 0]);

        let compacted = BinPacker::new(Config::new().with_csp(csp)).solve(&list).unwrap();
        assert_eq!(usages(&compacted), vec![10]);
    }

    #[test]
    fn test_solve_resets_cancellation() {
        let packer = BinPacker::default();
        packer.cancel();
        assert!(packer.is_cancelled());

        let list = PackingList::from_sizes(10, [4, 4], Algorithm::ConstraintProgramming)
            .with_lower_bound(1);
        assert!(packer.solve(&list).is_ok());
        assert!(!packer.is_cancelled());
    }
}
