//! Random instance generator.
//!
//! Item sizes are drawn from a normal distribution concentrated around a
//! center value, rounded and clamped to `[1, max - 1]`. The spread is
//! derived from the distance between the center and the nearer end of the
//! size range, divided by the variability level.

use binpack_core::{Algorithm, Item, PackingList, Size};
use rand::prelude::*;
use rand_distr::Normal;

use crate::error::{BenchmarkError, Result};

/// Spread of the generated sizes. Higher levels give tighter clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variability {
    /// `sigma = distance / 1`.
    High = 1,
    /// `sigma = distance / 2`.
    Medium = 2,
    /// `sigma = distance / 3`.
    Low = 3,
}

impl Variability {
    /// All levels, from widest to tightest.
    pub const ALL: [Variability; 3] = [Variability::High, Variability::Medium, Variability::Low];

    /// Numeric level stored in packing lists.
    pub fn level(self) -> u32 {
        self as u32
    }

    /// Level from its numeric value.
    pub fn from_level(level: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.level() == level)
    }
}

impl std::fmt::Display for Variability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variability::High => write!(f, "high"),
            Variability::Medium => write!(f, "medium"),
            Variability::Low => write!(f, "low"),
        }
    }
}

/// Parameters of one generated instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Number of items.
    pub count: usize,
    /// Bin capacity; every item is strictly smaller.
    pub max: Size,
    /// Center of the size distribution.
    pub center: Size,
    /// Spread of the size distribution.
    pub variability: Variability,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 100,
            max: 100,
            center: 50,
            variability: Variability::Low,
        }
    }
}

impl GeneratorConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the item count.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Sets the bin capacity.
    pub fn with_max(mut self, max: Size) -> Self {
        self.max = max;
        self
    }

    /// Sets the distribution center.
    pub fn with_center(mut self, center: Size) -> Self {
        self.center = center;
        self
    }

    /// Sets the variability.
    pub fn with_variability(mut self, variability: Variability) -> Self {
        self.variability = variability;
        self
    }

    /// Checks that the configuration can produce valid items.
    pub fn validate(&self) -> Result<()> {
        if self.max < 2 {
            return Err(BenchmarkError::InvalidConfig(format!(
                "max must be at least 2, got {}",
                self.max
            )));
        }
        if self.center == 0 || self.center >= self.max {
            return Err(BenchmarkError::InvalidConfig(format!(
                "center must lie in 1..{}, got {}",
                self.max, self.center
            )));
        }
        Ok(())
    }

    /// Standard deviation of the size distribution.
    pub fn sigma(&self) -> f64 {
        let distance = if self.max / 2 >= self.center {
            // most items take less than half a bin
            self.center
        } else {
            self.max - self.center
        };
        distance as f64 / f64::from(self.variability.level())
    }

    /// The standard experiment grid for one capacity: centers at 25%, 50%
    /// and 75% of `max`, 50, 100 and 500 items, every variability.
    pub fn grid(max: Size) -> Vec<GeneratorConfig> {
        let mut grid = Vec::with_capacity(27);
        for percent in [25, 50, 75] {
            for count in [50, 100, 500] {
                for variability in Variability::ALL {
                    grid.push(GeneratorConfig {
                        count,
                        max,
                        center: max * percent / 100,
                        variability,
                    });
                }
            }
        }
        grid
    }
}

/// Generator for random packing lists.
#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    rng: StdRng,
}

impl Default for InstanceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceGenerator {
    /// Creates a new generator with a random seed.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new generator with a specific seed for reproducibility.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws the item sizes of one instance.
    pub fn generate_items(&mut self, config: &GeneratorConfig) -> Result<Vec<Item>> {
        config.validate()?;
        let normal = Normal::new(config.center as f64, config.sigma())
            .map_err(|e| BenchmarkError::InvalidConfig(format!("size distribution: {e}")))?;

        let items = (0..config.count)
            .map(|_| {
                let sample = normal.sample(&mut self.rng).round();
                let size = if sample <= 0.0 {
                    1
                } else if sample >= config.max as f64 {
                    config.max - 1
                } else {
                    sample as Size
                };
                Item::new(size)
            })
            .collect();
        Ok(items)
    }

    /// Generates a packing list with its lower bound precomputed.
    pub fn generate(&mut self, config: &GeneratorConfig, algorithm: Algorithm) -> Result<PackingList> {
        let items = self.generate_items(config)?;
        let list = PackingList::new(config.max, items, algorithm)
            .with_generation(config.center, config.variability.level())
            .with_computed_lower_bound()?;
        log::debug!(
            "generated {} items around {} (sigma {:.2}), lower bound {:?}",
            config.count,
            config.center,
            config.sigma(),
            list.lower_bound
        );
        Ok(list)
    }
}

/// Rescales `x` from the range `[x_min, x_max]` to `[a, b]`.
pub fn unity_based_normalization(x: f64, x_min: f64, x_max: f64, a: f64, b: f64) -> f64 {
    a + ((x - x_min) * (b - a)) / (x_max - x_min)
}
