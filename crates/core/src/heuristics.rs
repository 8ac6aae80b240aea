//! Item-by-item fitting rules.
//!
//! Each function places exactly one item and never fails: when no existing
//! bin can take the item a new one is allocated. The Decreasing variants
//! reuse these rules unchanged; [`BinCollection::pack_all`] sorts the items
//! beforehand.
//!
//! First-Fit picks the **last** bin that fits (see
//! [`BinCollection::find_bin`]) while Best-Fit keeps the **first** bin among
//! equally tight candidates. The asymmetry is intentional; both rules change
//! their output on tied inputs if unified.

use crate::collection::BinCollection;
use crate::item::{Item, Size};

/// Next-Fit: only the most recently allocated bin is considered.
pub fn next_fit(collection: &mut BinCollection, item: Item) {
    let last = collection.total_bins().checked_sub(1);
    let index = match last {
        Some(index) if collection.bins()[index].can_fit(item) => index,
        _ => collection.allocate_bin(),
    };
    collection.pack_into(index, item);
}

/// First-Fit: the last bin in index order with enough room.
pub fn first_fit(collection: &mut BinCollection, item: Item) {
    let index = collection
        .find_bin(|bin| bin.can_fit(item))
        .unwrap_or_else(|| collection.allocate_bin());
    collection.pack_into(index, item);
}

/// Best-Fit: the bin left with the least free space after placement.
pub fn best_fit(collection: &mut BinCollection, item: Item) {
    let mut best: Option<(usize, Size)> = None;
    for (index, bin) in collection.bins().iter().enumerate() {
        if !bin.can_fit(item) {
            continue;
        }
        let leftover = bin.remaining() - item.size();
        // strict comparison keeps the first minimizer
        if best.map_or(true, |(_, smallest)| leftover < smallest) {
            best = Some((index, leftover));
        }
    }

    let index = match best {
        Some((index, _)) => index,
        None => collection.allocate_bin(),
    };
    collection.pack_into(index, item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Algorithm;

    fn collection_with_usage(usages: &[Size]) -> BinCollection {
        let mut collection = BinCollection::new(10, Algorithm::BestFit);
        for &usage in usages {
            let index = collection.allocate_bin();
            if usage > 0 {
                collection.pack_into(index, Item::new(usage));
            }
        }
        collection
    }

    fn usages(collection: &BinCollection) -> Vec<Size> {
        collection.bins().iter().map(|bin| bin.usage()).collect()
    }

    #[test]
    fn test_next_fit_only_looks_at_last_bin() {
        let mut collection = collection_with_usage(&[2, 9]);
        next_fit(&mut collection, Item::new(3));
        // bin 0 had room but Next-Fit never goes back
        assert_eq!(usages(&collection), vec![2, 9, 3]);
    }

    #[test]
    fn test_next_fit_allocates_first_bin() {
        let mut collection = BinCollection::new(10, Algorithm::NextFit);
        next_fit(&mut collection, Item::new(4));
        assert_eq!(usages(&collection), vec![4]);
    }

    #[test]
    fn test_first_fit_prefers_last_fitting_bin() {
        let mut collection = collection_with_usage(&[5, 8, 5]);
        first_fit(&mut collection, Item::new(2));
        assert_eq!(usages(&collection), vec![5, 8, 7]);
    }

    #[test]
    fn test_first_fit_allocates_when_nothing_fits() {
        let mut collection = collection_with_usage(&[8, 9]);
        first_fit(&mut collection, Item::new(3));
        assert_eq!(usages(&collection), vec![8, 9, 3]);
    }

    #[test]
    fn test_best_fit_chooses_tightest_bin() {
        let mut collection = collection_with_usage(&[2, 6, 4]);
        best_fit(&mut collection, Item::new(3));
        assert_eq!(usages(&collection), vec![2, 9, 4]);
    }

    #[test]
    fn test_best_fit_keeps_first_minimizer() {
        let mut collection = collection_with_usage(&[9, 5, 5]);
        best_fit(&mut collection, Item::new(4));
        assert_eq!(usages(&collection), vec![9, 9, 5]);
    }

    #[test]
    fn test_best_fit_skips_overflowing_first_bin() {
        let mut collection = collection_with_usage(&[8, 1]);
        best_fit(&mut collection, Item::new(5));
        assert_eq!(usages(&collection), vec![8, 6]);
    }

    #[test]
    fn test_best_fit_allocates_when_nothing_fits() {
        let mut collection = collection_with_usage(&[7, 7]);
        best_fit(&mut collection, Item::new(4));
        assert_eq!(usages(&collection), vec![7, 7, 4]);
    }
}
