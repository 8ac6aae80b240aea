//! Packing algorithm selector.

use crate::error::Error;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Packing algorithm.
///
/// | Algorithm | Order | Placement rule |
/// |-----------|-------|----------------|
/// | `NextFit` | input | most recent bin only |
/// | `FirstFit` | input | last bin that fits |
/// | `FirstFitDecreasing` | descending | last bin that fits |
/// | `BestFit` | input | tightest bin, first on ties |
/// | `BestFitDecreasing` | descending | tightest bin, first on ties |
/// | `ModifiedFirstFitDecreasing` | descending | five-phase batch (MFFD) |
/// | `ConstraintProgramming` | descending | exact backtracking search |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Algorithm {
    /// Next-Fit.
    NextFit,
    /// First-Fit.
    FirstFit,
    /// First-Fit on items sorted by decreasing size.
    FirstFitDecreasing,
    /// Best-Fit.
    BestFit,
    /// Best-Fit on items sorted by decreasing size.
    BestFitDecreasing,
    /// Modified First-Fit-Decreasing (Johnson & Garey).
    ModifiedFirstFitDecreasing,
    /// Exact constraint satisfaction search.
    ConstraintProgramming,
}

impl Algorithm {
    /// Every algorithm, in declaration order.
    pub const ALL: [Algorithm; 7] = [
        Algorithm::NextFit,
        Algorithm::FirstFit,
        Algorithm::FirstFitDecreasing,
        Algorithm::BestFit,
        Algorithm::BestFitDecreasing,
        Algorithm::ModifiedFirstFitDecreasing,
        Algorithm::ConstraintProgramming,
    ];

    /// The heuristic algorithms (everything except constraint programming).
    pub const HEURISTICS: [Algorithm; 6] = [
        Algorithm::NextFit,
        Algorithm::FirstFit,
        Algorithm::FirstFitDecreasing,
        Algorithm::BestFit,
        Algorithm::BestFitDecreasing,
        Algorithm::ModifiedFirstFitDecreasing,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::NextFit => "NextFit",
            Self::FirstFit => "FirstFit",
            Self::FirstFitDecreasing => "FirstFitDecreasing",
            Self::BestFit => "BestFit",
            Self::BestFitDecreasing => "BestFitDecreasing",
            Self::ModifiedFirstFitDecreasing => "ModifiedFirstFitDecreasing",
            Self::ConstraintProgramming => "ConstraintProgramming",
        }
    }

    /// Short lowercase alias accepted by [`FromStr`].
    pub fn short_name(self) -> &'static str {
        match self {
            Self::NextFit => "nf",
            Self::FirstFit => "ff",
            Self::FirstFitDecreasing => "ffd",
            Self::BestFit => "bf",
            Self::BestFitDecreasing => "bfd",
            Self::ModifiedFirstFitDecreasing => "mffd",
            Self::ConstraintProgramming => "cp",
        }
    }

    /// Returns true if items are sorted by decreasing size before packing.
    pub fn is_decreasing(self) -> bool {
        matches!(
            self,
            Self::FirstFitDecreasing
                | Self::BestFitDecreasing
                | Self::ModifiedFirstFitDecreasing
                | Self::ConstraintProgramming
        )
    }

    /// Returns true if items are placed one at a time.
    pub fn is_online_rule(self) -> bool {
        !matches!(
            self,
            Self::ModifiedFirstFitDecreasing | Self::ConstraintProgramming
        )
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|algorithm| {
                algorithm.name().eq_ignore_ascii_case(trimmed)
                    || algorithm.short_name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.name().parse::<Algorithm>(), Ok(algorithm));
            assert_eq!(algorithm.short_name().parse::<Algorithm>(), Ok(algorithm));
            assert_eq!(algorithm.to_string(), algorithm.name());
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("bestfit".parse(), Ok(Algorithm::BestFit));
        assert_eq!("MFFD".parse(), Ok(Algorithm::ModifiedFirstFitDecreasing));
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        assert_eq!(
            "WorstFit".parse::<Algorithm>(),
            Err(Error::UnknownAlgorithm("WorstFit".to_string()))
        );
        assert!("".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_decreasing_variants() {
        assert!(!Algorithm::NextFit.is_decreasing());
        assert!(!Algorithm::FirstFit.is_decreasing());
        assert!(!Algorithm::BestFit.is_decreasing());
        assert!(Algorithm::FirstFitDecreasing.is_decreasing());
        assert!(Algorithm::BestFitDecreasing.is_decreasing());
        assert!(Algorithm::ModifiedFirstFitDecreasing.is_decreasing());
        assert!(Algorithm::ConstraintProgramming.is_decreasing());
    }
}
