//! Analytic lower bound on the number of bins.
//!
//! Implements the bin-completion bound from Korf's first bin completion
//! paper. Items are swept from largest to smallest. Each item opens a
//! virtual bin with `r = C - size` free space, which is completed with the
//! smallest still-unconsumed items that individually fit into `r`. Space
//! left unused is counted as waste; overfill is carried into the next bin.
//! The bound is `round((sum + waste) / C)`.
//!
//! The estimate only looks at the item sizes. It is independent of any
//! packing decision, which makes it usable both to size the constraint
//! model and to score heuristics.

use crate::error::{Error, Result};
use crate::item::{Item, Size};

/// Computes the lower bound on the number of bins needed for `items`.
///
/// An empty item list needs zero bins. A zero capacity or an item larger
/// than the capacity is rejected.
///
/// # Example
///
/// ```rust
/// use binpack_core::{items_from_sizes, lower_bound};
///
/// let items = items_from_sizes([60, 60, 60, 40]);
/// assert_eq!(lower_bound(&items, 100).unwrap(), 3);
/// ```
pub fn lower_bound(items: &[Item], capacity: Size) -> Result<usize> {
    if capacity == 0 {
        return Err(Error::InvalidCapacity(capacity));
    }
    if let Some((index, item)) = items
        .iter()
        .enumerate()
        .find(|(_, item)| item.size() > capacity)
    {
        return Err(Error::ItemTooLarge {
            index,
            size: item.size(),
            capacity,
        });
    }
    if items.is_empty() {
        return Ok(0);
    }

    let mut sizes: Vec<Size> = items.iter().map(|item| item.size()).collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));

    // sizes[end..] have been consumed to complete earlier bins
    let mut end = sizes.len();
    // sums of u64 sizes only fit in u128
    let mut waste: u128 = 0;
    let mut carry: u128 = 0;
    let mut total: u128 = 0;

    let mut i = 0;
    while i < end {
        let size = sizes[i];
        total += u128::from(size);
        let r = capacity - size;

        // Smallest items are at the tail; walk back while they fit into r.
        let mut start = end;
        while start > i + 1 && sizes[start - 1] <= r {
            start -= 1;
        }

        let r = u128::from(r);
        let mut filled: u128 = 0;
        if r >= carry {
            filled = sizes[start..end].iter().map(|&s| u128::from(s)).sum();
            total += filled;
            end = start;
        }
        filled += carry;

        if filled <= r {
            waste += r - filled;
            carry = 0;
        } else {
            carry = filled - r;
        }
        i += 1;
    }

    Ok(round_div(total + waste, u128::from(capacity)))
}

/// `round(numerator / denominator)` with halves rounded up.
fn round_div(numerator: u128, denominator: u128) -> usize {
    let rounded = (2 * numerator + denominator) / (2 * denominator);
    usize::try_from(rounded).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::items_from_sizes;

    #[test]
    fn test_empty_items() {
        assert_eq!(lower_bound(&[], 10), Ok(0));
    }

    #[test]
    fn test_invalid_capacity() {
        let items = items_from_sizes([1, 2]);
        assert_eq!(lower_bound(&items, 0), Err(Error::InvalidCapacity(0)));
    }

    #[test]
    fn test_oversized_item() {
        let items = items_from_sizes([4, 12]);
        assert_eq!(
            lower_bound(&items, 10),
            Err(Error::ItemTooLarge {
                index: 1,
                size: 12,
                capacity: 10
            })
        );
    }

    #[test]
    fn test_large_items_waste_space() {
        // Nothing pairs with a 6, so each one wastes 4.
        let items = items_from_sizes([6, 6, 6]);
        assert_eq!(lower_bound(&items, 10), Ok(3));
    }

    #[test]
    fn test_perfect_pairs() {
        let items = items_from_sizes([7, 3, 6, 4, 5, 5]);
        assert_eq!(lower_bound(&items, 10), Ok(3));
    }

    #[test]
    fn test_bound_rounds_rather_than_ceils() {
        // sum 23, no waste: 2.3 rounds down even though 3 bins are needed
        let items = items_from_sizes([6, 5, 4, 3, 2, 2, 1]);
        assert_eq!(lower_bound(&items, 10), Ok(2));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = items_from_sizes([7, 5, 4, 4, 3, 3, 2, 2]);
        let b = items_from_sizes([2, 3, 4, 7, 2, 5, 3, 4]);
        assert_eq!(lower_bound(&a, 10), lower_bound(&b, 10));
        assert_eq!(lower_bound(&a, 10), Ok(3));
    }

    #[test]
    fn test_sizes_near_size_max() {
        let items = items_from_sizes([1 << 62; 3]);
        assert_eq!(lower_bound(&items, 1 << 62), Ok(3));

        // the item sum exceeds Size::MAX
        let items = items_from_sizes([Size::MAX; 3]);
        assert_eq!(lower_bound(&items, Size::MAX), Ok(3));

        let half = Size::MAX / 2;
        let items = items_from_sizes([half, half, half, half]);
        assert_eq!(lower_bound(&items, Size::MAX), Ok(2));
    }

    #[test]
    fn test_does_not_reorder_input() {
        let items = items_from_sizes([1, 9, 5]);
        let before = items.clone();
        let _ = lower_bound(&items, 10);
        assert_eq!(items, before);
    }
}
