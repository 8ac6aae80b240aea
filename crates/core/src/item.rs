//! Item representation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scalar used for capacities, sizes and usage.
pub type Size = u64;

/// A single item to be packed.
///
/// Items are immutable values; two items of the same size are
/// interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Item(Size);

impl Item {
    /// Creates an item of the given size.
    #[inline]
    pub const fn new(size: Size) -> Self {
        Self(size)
    }

    /// Returns the size of the item.
    #[inline]
    pub const fn size(self) -> Size {
        self.0
    }
}

impl From<Size> for Item {
    fn from(size: Size) -> Self {
        Self(size)
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds a list of items from raw sizes.
pub fn items_from_sizes<I>(sizes: I) -> Vec<Item>
where
    I: IntoIterator<Item = Size>,
{
    sizes.into_iter().map(Item::new).collect()
}

/// Sum of all item sizes.
pub fn total_size(items: &[Item]) -> Size {
    items
        .iter()
        .fold(0, |total: Size, item| total.saturating_add(item.size()))
}

/// Sorts items in place, largest first.
///
/// The sort is stable so equal sizes keep their input order.
pub fn sort_descending(items: &mut [Item]) {
    items.sort_by(|a, b| b.cmp(a));
}
