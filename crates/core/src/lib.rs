//! # Binpack Core
//!
//! One-dimensional bin packing: heuristics, a lower bound and an exact
//! constraint programming search.
//!
//! Items of positive integer size are packed into bins of a fixed capacity
//! so that no bin overflows, using as few bins as possible.
//!
//! ## Core Components
//!
//! - **Data model**: [`Item`], [`Bin`], [`PackingList`], [`BinCollection`]
//! - **Algorithms**: [`Algorithm`] selects one of the packers below
//! - **Lower bound**: [`lower_bound`] estimates the minimum number of bins
//! - **CSP engine**: [`CspEngine`] trait and [`BacktrackingSolver`]
//! - **CSP encoding**: [`PackingModel`] with [`CspConfig`]
//! - **Facade**: [`BinPacker`] with [`Config`], summarized by [`PackingSummary`]
//!
//! ## Algorithms
//!
//! | Algorithm | Speed | Quality | Description |
//! |-----------|-------|---------|-------------|
//! | `NextFit` | Fast | Basic | Only the most recent bin is considered |
//! | `FirstFit` | Fast | Good | Last bin with enough room |
//! | `FirstFitDecreasing` | Fast | Good | First-Fit on sorted items |
//! | `BestFit` | Fast | Good | Tightest bin after placement |
//! | `BestFitDecreasing` | Fast | Good | Best-Fit on sorted items |
//! | `ModifiedFirstFitDecreasing` | Fast | High | Johnson & Garey's five phases |
//! | `ConstraintProgramming` | Slow | Exact | Backtracking search with propagation |
//!
//! ## Usage
//!
//! ```rust
//! use binpack_core::{Algorithm, BinPacker, Config, CspConfig, PackingList};
//!
//! let list = PackingList::from_sizes(10, [7, 5, 4, 4, 3, 3, 2, 2], Algorithm::ConstraintProgramming)
//!     .with_computed_lower_bound()
//!     .unwrap();
//!
//! let config = Config::new().with_csp(CspConfig::new().with_time_limit_ms(1_000));
//! let bins = BinPacker::new(config).solve(&list).unwrap();
//! assert_eq!(bins.total_bins(), 3);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod algorithm;
pub mod bin;
pub mod collection;
pub mod constraint;
pub mod csp;
pub mod error;
pub mod heuristics;
pub mod item;
pub mod lower_bound;
pub mod mffd;
pub mod packing_list;
pub mod result;
pub mod solver;

// Re-exports
pub use algorithm::Algorithm;
pub use bin::Bin;
pub use collection::BinCollection;
pub use constraint::{CspConfig, CspEncoding, PackingModel};
pub use csp::{
    Assignment, BacktrackingSolver, CspEngine, SearchLimits, SearchOutcome, SearchStats,
    VariableSelection,
};
pub use error::{Error, Result};
pub use item::{items_from_sizes, sort_descending, total_size, Item, Size};
pub use lower_bound::lower_bound;
pub use mffd::{categorize, Category};
pub use packing_list::PackingList;
pub use result::PackingSummary;
pub use solver::{BinPacker, Config};
