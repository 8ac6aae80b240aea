//! A single fixed-capacity bin.

#[cfg(feature = "serde")]
use crate::error::Error;
use crate::item::{Item, Size};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A bin accumulating items up to a fixed capacity.
///
/// Items are kept in the order they were packed. `usage` is maintained
/// incrementally and never exceeds `capacity`. Deserialization rejects bins
/// whose stored usage disagrees with their items.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawBin"))]
pub struct Bin {
    capacity: Size,
    items: Vec<Item>,
    usage: Size,
}

impl Bin {
    /// Creates an empty bin.
    pub fn new(capacity: Size) -> Self {
        Self {
            capacity,
            items: Vec::new(),
            usage: 0,
        }
    }

    /// Bin capacity.
    #[inline]
    pub fn capacity(&self) -> Size {
        self.capacity
    }

    /// Sum of the sizes of the packed items.
    #[inline]
    pub fn usage(&self) -> Size {
        self.usage
    }

    /// Free space left in the bin.
    #[inline]
    pub fn remaining(&self) -> Size {
        self.capacity - self.usage
    }

    /// Returns true if `item` fits into the remaining space.
    #[inline]
    pub fn can_fit(&self, item: Item) -> bool {
        self.remaining() >= item.size()
    }

    /// Items in pack order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns true if nothing has been packed.
    pub fn is_empty(&self) -> bool {
        self.usage == 0 && self.items.is_empty()
    }

    /// Fraction of the capacity in use (0.0 - 1.0).
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.usage as f64 / self.capacity as f64
        }
    }

    /// Packs `item` if it fits. Returns false and leaves the bin untouched
    /// otherwise.
    pub fn try_pack(&mut self, item: Item) -> bool {
        if self.can_fit(item) {
            self.pack(item);
            true
        } else {
            false
        }
    }

    /// Packs an item the caller has already checked with [`Bin::can_fit`].
    pub(crate) fn pack(&mut self, item: Item) {
        debug_assert!(self.can_fit(item), "item {item} overflows bin");
        self.items.push(item);
        self.usage += item.size();
    }
}

/// Unchecked field layout of a serialized [`Bin`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawBin {
    capacity: Size,
    items: Vec<Item>,
    usage: Size,
}

#[cfg(feature = "serde")]
impl TryFrom<RawBin> for Bin {
    type Error = Error;

    fn try_from(raw: RawBin) -> Result<Self, Self::Error> {
        let sum: u128 = raw.items.iter().map(|item| u128::from(item.size())).sum();
        if sum != u128::from(raw.usage) {
            return Err(Error::CorruptCollection(format!(
                "bin usage {} but items sum to {}",
                raw.usage, sum
            )));
        }
        if raw.usage > raw.capacity {
            return Err(Error::CorruptCollection(format!(
                "bin usage {} exceeds capacity {}",
                raw.usage, raw.capacity
            )));
        }
        Ok(Self {
            capacity: raw.capacity,
            items: raw.items,
            usage: raw.usage,
        })
    }
}
