//! Modified First-Fit-Decreasing.
//!
//! Johnson and Garey's MFFD groups items by size relative to the capacity
//! `C` and packs them in five phases:
//!
//! 1. every item larger than `C/2` (category A) opens its own bin;
//! 2. each A-bin, in creation order, receives the largest B item that fits;
//! 3. A-bins without a B item, scanned from the last to the first, are
//!    backfilled from the C/D/E items when the two smallest of them fit
//!    together;
//! 4. all A-bins are topped up with whatever B, C/D/E and F/G items fit,
//!    repeating until a pass places nothing;
//! 5. the rest goes into fresh bins, First-Fit style over the non-A bins.
//!
//! Worklists keep every item at a fixed position for the whole run and mark
//! placement with an explicit flag instead of overwriting the size.

use crate::bin::Bin;
use crate::collection::BinCollection;
use crate::item::{Item, Size};

/// MFFD size category, from largest (`A`) to smallest (`G`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Larger than `C/2`.
    A,
    /// Larger than `C/3`.
    B,
    /// Larger than `C/4`.
    C,
    /// Larger than `C/5`.
    D,
    /// Larger than `C/6`.
    E,
    /// Larger than `11C/71`.
    F,
    /// Everything else.
    G,
}

/// Categorizes an item of `size` for bins of `capacity`.
///
/// Comparisons are strict and exact: an item of exactly `C/2` is a B item,
/// exactly `C/3` a C item, and so on.
pub fn categorize(size: Size, capacity: Size) -> Category {
    let size = u128::from(size);
    let capacity = u128::from(capacity);
    if 2 * size > capacity {
        Category::A
    } else if 3 * size > capacity {
        Category::B
    } else if 4 * size > capacity {
        Category::C
    } else if 5 * size > capacity {
        Category::D
    } else if 6 * size > capacity {
        Category::E
    } else if 71 * size > 11 * capacity {
        Category::F
    } else {
        Category::G
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    item: Item,
    placed: bool,
}

/// Items of one category group, in decreasing size order.
#[derive(Debug, Default)]
struct Worklist {
    entries: Vec<Entry>,
}

impl Worklist {
    fn push(&mut self, item: Item) {
        self.entries.push(Entry {
            item,
            placed: false,
        });
    }

    fn unplaced(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.placed).count()
    }

    /// Packs the first unplaced entry that fits. Returns true on success.
    fn pack_first_fitting(&mut self, bin: &mut Bin) -> bool {
        let found = self
            .entries
            .iter_mut()
            .find(|entry| !entry.placed && bin.can_fit(entry.item));
        match found {
            Some(entry) => {
                bin.pack(entry.item);
                entry.placed = true;
                true
            }
            None => false,
        }
    }

    /// Packs every unplaced entry that still fits, largest first.
    fn pack_all_fitting(&mut self, bin: &mut Bin) -> bool {
        let mut packed = false;
        for entry in self.entries.iter_mut().filter(|entry| !entry.placed) {
            if bin.can_fit(entry.item) {
                bin.pack(entry.item);
                entry.placed = true;
                packed = true;
            }
        }
        packed
    }

    /// Positions of the smallest and second smallest unplaced entries.
    fn two_smallest(&self) -> Option<(usize, usize)> {
        let mut unplaced = self
            .entries
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, entry)| !entry.placed)
            .map(|(position, _)| position);
        let smallest = unplaced.next()?;
        let second = unplaced.next()?;
        Some((smallest, second))
    }
}

/// The three worklists MFFD draws from after seeding the A-bins.
#[derive(Debug, Default)]
struct Worklists {
    b: Worklist,
    cde: Worklist,
    fg: Worklist,
}

impl Worklists {
    fn unplaced(&self) -> usize {
        self.b.unplaced() + self.cde.unplaced() + self.fg.unplaced()
    }

    /// Tries B, then C/D/E, then F/G items on one bin.
    fn fill(&mut self, bin: &mut Bin) -> bool {
        let b = self.b.pack_all_fitting(bin);
        let cde = self.cde.pack_all_fitting(bin);
        let fg = self.fg.pack_all_fitting(bin);
        b || cde || fg
    }
}

/// Packs `items` (already sorted by decreasing size) with MFFD.
///
/// Bins are only allocated for items: an empty input leaves the collection
/// without bins even when compaction is disabled.
pub(crate) fn pack(collection: &mut BinCollection, items: &[Item]) {
    let capacity = collection.capacity();
    let first_a = collection.total_bins();
    let mut lists = Worklists::default();

    // Phase 1: one bin per A item, bucket the rest.
    for &item in items {
        match categorize(item.size(), capacity) {
            Category::A => {
                let index = collection.allocate_bin();
                collection.pack_into(index, item);
            }
            Category::B => lists.b.push(item),
            Category::C | Category::D | Category::E => lists.cde.push(item),
            Category::F | Category::G => lists.fg.push(item),
        }
    }
    let a_bins = first_a..collection.total_bins();
    log::debug!(
        "MFFD seeded {} A-bins, {} B, {} C/D/E, {} F/G items",
        a_bins.len(),
        lists.b.entries.len(),
        lists.cde.entries.len(),
        lists.fg.entries.len()
    );

    // Phase 2: at most one B item per A-bin.
    let mut has_b = vec![false; a_bins.len()];
    for (offset, index) in a_bins.clone().enumerate() {
        has_b[offset] = lists.b.pack_first_fitting(collection.bin_mut(index));
    }

    // Phase 3: backfill B-less A-bins with C/D/E items, last bin first.
    for (offset, index) in a_bins.clone().enumerate().rev() {
        if has_b[offset] {
            continue;
        }
        let Some((smallest, second)) = lists.cde.two_smallest() else {
            continue;
        };
        let bin = collection.bin_mut(index);
        let pair = lists.cde.entries[smallest].item.size() + lists.cde.entries[second].item.size();
        if bin.remaining() < pair {
            continue;
        }
        let entry = &mut lists.cde.entries[smallest];
        bin.pack(entry.item);
        entry.placed = true;
        lists.cde.pack_all_fitting(bin);
    }

    // Phase 4: saturate the A-bins.
    loop {
        let mut placed = false;
        for index in a_bins.clone() {
            placed |= lists.fill(collection.bin_mut(index));
        }
        if !placed {
            break;
        }
    }

    // Phase 5: everything left goes into new bins.
    if lists.unplaced() == 0 {
        return;
    }
    let first_overflow = a_bins.end;
    collection.allocate_bin();
    loop {
        let mut placed = false;
        for index in first_overflow..collection.total_bins() {
            placed |= lists.fill(collection.bin_mut(index));
        }
        if lists.unplaced() == 0 {
            break;
        }
        if !placed {
            collection.allocate_bin();
        }
    }
    log::debug!(
        "MFFD used {} overflow bins",
        collection.total_bins() - first_overflow
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Algorithm;
    use crate::item::{items_from_sizes, sort_descending};

    fn run(capacity: Size, sizes: &[Size]) -> Vec<Vec<Size>> {
        let mut items = items_from_sizes(sizes.iter().copied());
        sort_descending(&mut items);
        let mut collection = BinCollection::new(capacity, Algorithm::ModifiedFirstFitDecreasing);
        pack(&mut collection, &items);
        assert!(collection.is_valid_packing_of(&items));
        collection
            .bins()
            .iter()
            .map(|bin| bin.items().iter().map(|item| item.size()).collect())
            .collect()
    }

    #[test]
    fn test_categorize_boundaries_fall_into_smaller_category() {
        assert_eq!(categorize(61, 120), Category::A);
        assert_eq!(categorize(60, 120), Category::B);
        assert_eq!(categorize(41, 120), Category::B);
        assert_eq!(categorize(40, 120), Category::C);
        assert_eq!(categorize(31, 120), Category::C);
        assert_eq!(categorize(30, 120), Category::D);
        assert_eq!(categorize(25, 120), Category::D);
        assert_eq!(categorize(24, 120), Category::E);
        assert_eq!(categorize(21, 120), Category::E);
        assert_eq!(categorize(20, 120), Category::F);
        assert_eq!(categorize(19, 120), Category::F);
        assert_eq!(categorize(18, 120), Category::G);
    }

    #[test]
    fn test_categorize_f_threshold() {
        // 11 * 71 / 71 = 11 exactly is not above the threshold
        assert_eq!(categorize(11, 71), Category::G);
        assert_eq!(categorize(12, 71), Category::E);
        // 11C/71 for C = 142 is 22; 23 lies between 22 and C/6 = 23.67
        assert_eq!(categorize(22, 142), Category::G);
        assert_eq!(categorize(23, 142), Category::F);
    }

    #[test]
    fn test_categorize_small_capacity() {
        assert_eq!(categorize(6, 10), Category::A);
        assert_eq!(categorize(5, 10), Category::B);
        assert_eq!(categorize(4, 10), Category::B);
        assert_eq!(categorize(3, 10), Category::C);
        assert_eq!(categorize(2, 10), Category::E);
        assert_eq!(categorize(1, 10), Category::G);
    }

    #[test]
    fn test_phase_two_pairs_largest_fitting_b() {
        // 55 has room for 45 but not 48; 48 lands in the second A-bin
        assert_eq!(run(100, &[60, 55, 48, 45]), vec![vec![60], vec![55, 45], vec![48]]);
    }

    #[test]
    fn test_phase_three_backfills_with_cde_pair() {
        // 18 + 20 fit into the 40 left next to 60: the smaller goes in first,
        // then the largest C/D/E items that still fit
        let bins = run(100, &[60, 25, 20, 18]);
        assert_eq!(bins, vec![vec![60, 18, 20], vec![25]]);
    }

    #[test]
    fn test_phase_three_skips_bins_that_cannot_take_two() {
        // two smallest C/D/E items are 20 + 25 = 45 > 35 free
        let bins = run(100, &[65, 25, 20]);
        // phase 4 still tops the bin up with a single item
        assert_eq!(bins, vec![vec![65, 25], vec![20]]);
    }

    #[test]
    fn test_phase_five_without_a_items() {
        let bins = run(10, &[4, 4, 3, 2, 1]);
        assert_eq!(bins, vec![vec![4, 4, 2], vec![3, 1]]);
    }

    #[test]
    fn test_empty_input_allocates_nothing() {
        assert!(run(10, &[]).is_empty());
    }

    #[test]
    fn test_only_a_items() {
        assert_eq!(run(10, &[9, 8, 6]), vec![vec![9], vec![8], vec![6]]);
    }
}
