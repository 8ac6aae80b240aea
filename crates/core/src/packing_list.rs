//! Input description of a packing problem.

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::item::{Item, Size};
use crate::lower_bound::lower_bound;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A bin packing instance together with the algorithm used to solve it.
///
/// The packing list is read-only once a run starts. `variability` and
/// `center` describe how a generated instance was produced and are ignored
/// by every algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackingList {
    /// Capacity shared by every bin.
    pub capacity: Size,
    /// Declared number of items.
    pub count: usize,
    /// Algorithm used to pack the items.
    pub algorithm: Algorithm,
    /// Items to pack.
    pub items: Vec<Item>,
    /// Variability level used by the generator.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub variability: Option<u32>,
    /// Center of the generated size distribution.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub center: Option<Size>,
    /// Precomputed lower bound; sizes the constraint programming model.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub lower_bound: Option<usize>,
}

impl PackingList {
    /// Creates a packing list. The declared count is taken from `items`.
    pub fn new(capacity: Size, items: Vec<Item>, algorithm: Algorithm) -> Self {
        Self {
            capacity,
            count: items.len(),
            algorithm,
            items,
            variability: None,
            center: None,
            lower_bound: None,
        }
    }

    /// Creates a packing list from raw sizes.
    pub fn from_sizes<I>(capacity: Size, sizes: I, algorithm: Algorithm) -> Self
    where
        I: IntoIterator<Item = Size>,
    {
        Self::new(capacity, sizes.into_iter().map(Item::new).collect(), algorithm)
    }

    /// Sets the algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the lower bound explicitly.
    pub fn with_lower_bound(mut self, lower_bound: usize) -> Self {
        self.lower_bound = Some(lower_bound);
        self
    }

    /// Records generator metadata.
    pub fn with_generation(mut self, center: Size, variability: u32) -> Self {
        self.center = Some(center);
        self.variability = Some(variability);
        self
    }

    /// Computes and stores the lower bound of the items.
    pub fn with_computed_lower_bound(mut self) -> Result<Self> {
        self.lower_bound = Some(lower_bound(&self.items, self.capacity)?);
        Ok(self)
    }

    /// Sum of all item sizes.
    pub fn total_size(&self) -> Size {
        crate::item::total_size(&self.items)
    }

    /// Checks the packing list before a run.
    ///
    /// Every failure here is a configuration error.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidCapacity(self.capacity));
        }
        if self.count != self.items.len() {
            return Err(Error::ItemCountMismatch {
                declared: self.count,
                actual: self.items.len(),
            });
        }
        for (index, item) in self.items.iter().enumerate() {
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
        if self.algorithm == Algorithm::ConstraintProgramming {
            match self.lower_bound {
                None => return Err(Error::MissingLowerBound),
                Some(0) if !self.items.is_empty() => return Err(Error::InvalidLowerBound(0)),
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_count() {
        let list = PackingList::from_sizes(10, [3, 4, 5], Algorithm::FirstFit);
        assert_eq!(list.count, 3);
        assert_eq!(list.total_size(), 12);
        assert!(list.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let list = PackingList::from_sizes(0, [1], Algorithm::NextFit);
        assert_eq!(list.validate(), Err(Error::InvalidCapacity(0)));
    }

    #[test]
    fn test_validate_rejects_bad_items() {
        let list = PackingList::from_sizes(10, [3, 0], Algorithm::NextFit);
        assert_eq!(
            list.validate(),
            Err(Error::InvalidItem { index: 1, size: 0 })
        );

        let list = PackingList::from_sizes(10, [11], Algorithm::NextFit);
        assert_eq!(
            list.validate(),
            Err(Error::ItemTooLarge {
                index: 0,
                size: 11,
                capacity: 10
            })
        );
    }

    #[test]
    fn test_validate_rejects_count_mismatch() {
        let mut list = PackingList::from_sizes(10, [1, 2], Algorithm::BestFit);
        list.count = 5;
        assert_eq!(
            list.validate(),
            Err(Error::ItemCountMismatch {
                declared: 5,
                actual: 2
            })
        );
    }

    #[test]
    fn test_constraint_programming_needs_lower_bound() {
        let list = PackingList::from_sizes(10, [6, 6], Algorithm::ConstraintProgramming);
        assert_eq!(list.validate(), Err(Error::MissingLowerBound));

        let list = list.with_computed_lower_bound().unwrap();
        assert_eq!(list.lower_bound, Some(2));
        assert!(list.validate().is_ok());
    }

    #[test]
    fn test_zero_lower_bound_only_for_empty_list() {
        let list = PackingList::from_sizes(10, [6, 6], Algorithm::ConstraintProgramming)
            .with_lower_bound(0);
        assert_eq!(list.validate(), Err(Error::InvalidLowerBound(0)));

        let empty = PackingList::from_sizes(10, [], Algorithm::ConstraintProgramming)
            .with_lower_bound(0);
        assert!(empty.validate().is_ok());

        let heuristic = list.with_algorithm(Algorithm::FirstFit);
        assert!(heuristic.validate().is_ok());
    }
}
