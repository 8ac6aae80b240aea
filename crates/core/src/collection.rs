//! Mutable packing state shared by every algorithm.

use crate::algorithm::Algorithm;
use crate::bin::Bin;
use crate::constraint;
use crate::error::{Error, Result};
use crate::heuristics;
use crate::item::{sort_descending, Item, Size};
use crate::mffd;
use crate::packing_list::PackingList;
use crate::solver::Config;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered set of equally sized bins being filled by one algorithm.
///
/// A collection is created once per run, mutated only by the packing
/// algorithm and then handed back to the caller as the result.
/// `total_bins()` always equals the number of bins held; deserialization
/// rejects files where the stored count or a bin's capacity disagrees.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawCollection"))]
pub struct BinCollection {
    capacity: Size,
    count: usize,
    bins: Vec<Bin>,
    algorithm: Algorithm,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    solution_time: Option<u64>,
}

impl BinCollection {
    /// Creates a collection without any bins.
    pub fn new(capacity: Size, algorithm: Algorithm) -> Self {
        Self {
            capacity,
            count: 0,
            bins: Vec::new(),
            algorithm,
            solution_time: None,
        }
    }

    /// Creates the collection for a packing list using the default
    /// configuration.
    pub fn from_packing_list(list: &PackingList) -> Result<Self> {
        Self::from_packing_list_with(list, &Config::default())
    }

    /// Creates the collection for a packing list and pre-allocates the bins
    /// the algorithm starts from.
    ///
    /// Item-by-item heuristics start with one bin, MFFD with none and
    /// constraint programming with `round(lower_bound * bin_slack)` bins.
    /// A constraint programming list must carry a lower bound, and that
    /// bound may only be zero when the list has no items.
    pub fn from_packing_list_with(list: &PackingList, config: &Config) -> Result<Self> {
        list.validate()?;
        let mut collection = Self::new(list.capacity, list.algorithm);
        let initial = match list.algorithm {
            Algorithm::ModifiedFirstFitDecreasing => 0,
            Algorithm::ConstraintProgramming => {
                let lower_bound = list.lower_bound.ok_or(Error::MissingLowerBound)?;
                config.csp.bins_for(lower_bound)
            }
            _ => 1,
        };
        for _ in 0..initial {
            collection.allocate_bin();
        }
        Ok(collection)
    }

    /// Bin capacity.
    pub fn capacity(&self) -> Size {
        self.capacity
    }

    /// Algorithm the collection is packed with.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Number of bins.
    pub fn total_bins(&self) -> usize {
        self.count
    }

    /// All bins in index order.
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Returns the bin at `index`.
    pub fn bin(&self, index: usize) -> Option<&Bin> {
        self.bins.get(index)
    }

    /// Number of packed items across all bins.
    pub fn item_count(&self) -> usize {
        self.bins.iter().map(|bin| bin.items().len()).sum()
    }

    /// Sum of the usage of all bins.
    pub fn total_usage(&self) -> Size {
        self.bins
            .iter()
            .fold(0, |total: Size, bin| total.saturating_add(bin.usage()))
    }

    /// Number of bins holding at least one item.
    pub fn used_bins(&self) -> usize {
        self.bins.iter().filter(|bin| !bin.is_empty()).count()
    }

    /// Records the wall-clock time the caller measured for the run.
    pub fn set_solution_time(&mut self, nanoseconds: u64) {
        self.solution_time = Some(nanoseconds);
    }

    /// Solution time set by the caller, in nanoseconds.
    pub fn solution_time_ns(&self) -> Option<u64> {
        self.solution_time
    }

    /// Appends an empty bin and returns its index.
    pub fn allocate_bin(&mut self) -> usize {
        self.bins.push(Bin::new(self.capacity));
        self.count += 1;
        self.count - 1
    }

    /// Returns the index of the **last** bin matching `predicate`.
    ///
    /// First-Fit relies on this ordering to choose among several bins the
    /// item fits into.
    pub fn find_bin<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(&Bin) -> bool,
    {
        self.bins.iter().rposition(predicate)
    }

    /// Packs all items with the configured algorithm and default settings.
    pub fn pack_all(&mut self, items: &[Item]) -> Result<()> {
        self.pack_all_with(items, &Config::default())
    }

    /// Packs all items with the configured algorithm.
    ///
    /// Decreasing variants, MFFD and constraint programming sort a copy of
    /// the items by decreasing size first.
    pub fn pack_all_with(&mut self, items: &[Item], config: &Config) -> Result<()> {
        self.pack_all_inner(items, config, None)
    }

    pub(crate) fn pack_all_inner(
        &mut self,
        items: &[Item],
        config: &Config,
        interrupt: Option<Arc<AtomicBool>>,
    ) -> Result<()> {
        self.check_items(items)?;

        let mut items = items.to_vec();
        if self.algorithm.is_decreasing() {
            sort_descending(&mut items);
        }

        match self.algorithm {
            Algorithm::NextFit => {
                for &item in &items {
                    heuristics::next_fit(self, item);
                }
            }
            Algorithm::FirstFit | Algorithm::FirstFitDecreasing => {
                for &item in &items {
                    heuristics::first_fit(self, item);
                }
            }
            Algorithm::BestFit | Algorithm::BestFitDecreasing => {
                for &item in &items {
                    heuristics::best_fit(self, item);
                }
            }
            Algorithm::ModifiedFirstFitDecreasing => mffd::pack(self, &items),
            Algorithm::ConstraintProgramming => {
                constraint::pack(self, &items, &config.csp, interrupt)?;
            }
        }

        if config.compact_bins {
            self.compact();
        }

        log::debug!(
            "{} packed {} items into {} bins",
            self.algorithm,
            items.len(),
            self.count
        );
        Ok(())
    }

    /// Drops empty bins. Survivors keep their relative order and are
    /// renumbered from zero.
    pub fn compact(&mut self) {
        self.bins.retain(|bin| !bin.is_empty());
        self.count = self.bins.len();
    }

    /// Checks that the bins hold exactly `items` (as a multiset) and that no
    /// bin exceeds its capacity.
    pub fn is_valid_packing_of(&self, items: &[Item]) -> bool {
        let capacity_ok = self.bins.iter().all(|bin| {
            let sum: Size = bin.items().iter().map(|item| item.size()).sum();
            sum == bin.usage() && bin.usage() <= self.capacity
        });
        if !capacity_ok || self.count != self.bins.len() {
            return false;
        }

        let mut packed: Vec<Item> = self
            .bins
            .iter()
            .flat_map(|bin| bin.items().iter().copied())
            .collect();
        let mut expected = items.to_vec();
        packed.sort_unstable();
        expected.sort_unstable();
        packed == expected
    }

    pub(crate) fn bin_mut(&mut self, index: usize) -> &mut Bin {
        &mut self.bins[index]
    }

    pub(crate) fn pack_into(&mut self, index: usize, item: Item) {
        self.bins[index].pack(item);
    }

    fn check_items(&self, items: &[Item]) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidCapacity(self.capacity));
        }
        for (index, item) in items.iter().enumerate() {
            if item.size() == 0 {
                return Err(Error::InvalidItem {
                    index,
                    size: item.size(),
                });
            }
            if item.size() > self.capacity {
                return Err(Error::ItemTooLarge {
                    index,
                    size: item.size(),
                    capacity: self.capacity,
                });
            }
        }
        Ok(())
    }
}

/// Unchecked field layout of a serialized [`BinCollection`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawCollection {
    capacity: Size,
    count: usize,
    bins: Vec<Bin>,
    algorithm: Algorithm,
    #[serde(default)]
    solution_time: Option<u64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCollection> for BinCollection {
    type Error = Error;

    fn try_from(raw: RawCollection) -> Result<Self> {
        if raw.count != raw.bins.len() {
            return Err(Error::CorruptCollection(format!(
                "count {} but {} bins",
                raw.count,
                raw.bins.len()
            )));
        }
        if let Some(index) = raw.bins.iter().position(|bin| bin.capacity() != raw.capacity) {
            return Err(Error::CorruptCollection(format!(
                "bin {} has capacity {}, collection {}",
                index,
                raw.bins[index].capacity(),
                raw.capacity
            )));
        }
        Ok(Self {
            capacity: raw.capacity,
            count: raw.count,
            bins: raw.bins,
            algorithm: raw.algorithm,
            solution_time: raw.solution_time,
        })
    }
}

impl std::fmt::Display for BinCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{}: {} bins of capacity {}",
            self.algorithm, self.count, self.capacity
        )?;
        for (index, bin) in self.bins.iter().enumerate() {
            write!(f, "  bin {index:>3} [{:>3}/{}]:", bin.usage(), bin.capacity())?;
            for item in bin.items() {
                write!(f, " {item}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
