//! Constraint programming encoding of bin packing.
//!
//! A [`PackingModel`] turns a list of items and a fixed set of bins into
//! variables, constraints and propagators of any [`CspEngine`], runs the
//! search and decodes the assignment back into a [`BinCollection`].
//!
//! Two encodings are available:
//!
//! - [`CspEncoding::Placement`] uses one variable per item whose value is
//!   the bin index. A single capacity constraint covers all bins and a
//!   propagator removes a bin from every open item that no longer fits.
//! - [`CspEncoding::Indicator`] uses one 0/1 variable per item and bin,
//!   with an exactly-one constraint per item and a capacity constraint per
//!   bin. It is much larger and mostly useful for comparison.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::collection::BinCollection;
use crate::csp::{
    Assignment, BacktrackingSolver, CspEngine, SearchLimits, Value, VarId, VariableSelection,
};
use crate::error::{Error, Result};
use crate::item::{Item, Size};
use crate::lower_bound::lower_bound;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Variable layout of the constraint model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CspEncoding {
    /// One integer variable per item holding its bin index.
    #[default]
    Placement,
    /// One 0/1 variable per item and bin.
    Indicator,
}

/// Configuration of the constraint programming algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CspConfig {
    /// Variable layout.
    pub encoding: CspEncoding,

    /// Multiplier applied to the lower bound to size the bin set.
    /// Values below 1.0 are treated as 1.0.
    pub bin_slack: f64,

    /// Restrict item `i` of the descending list to bins `0..=i`.
    pub symmetry_breaking: bool,

    /// Branching variable order.
    pub variable_selection: VariableSelection,

    /// Search time limit in milliseconds (0 = unlimited).
    pub time_limit_ms: u64,

    /// Search node limit (0 = unlimited).
    pub node_limit: u64,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            encoding: CspEncoding::Placement,
            bin_slack: 1.0,
            symmetry_breaking: true,
            variable_selection: VariableSelection::InputOrder,
            time_limit_ms: 0,
            node_limit: 0,
        }
    }
}

impl CspConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encoding.
    pub fn with_encoding(mut self, encoding: CspEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the bin slack multiplier.
    pub fn with_bin_slack(mut self, slack: f64) -> Self {
        self.bin_slack = slack.max(1.0);
        self
    }

    /// Enables or disables symmetry breaking.
    pub fn with_symmetry_breaking(mut self, enabled: bool) -> Self {
        self.symmetry_breaking = enabled;
        self
    }

    /// Sets the variable selection rule.
    pub fn with_variable_selection(mut self, selection: VariableSelection) -> Self {
        self.variable_selection = selection;
        self
    }

    /// Sets the time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Sets the node limit.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = nodes;
        self
    }

    /// Number of bins the model is built with for a given lower bound:
    /// `round(lower_bound * bin_slack)`.
    pub fn bins_for(&self, lower_bound: usize) -> usize {
        let slack = if self.bin_slack.is_finite() {
            self.bin_slack.max(1.0)
        } else {
            1.0
        };
        (lower_bound as f64 * slack).round() as usize
    }

    /// Search limits for one run, with an optional interrupt flag.
    pub fn search_limits(&self, interrupt: Option<Arc<AtomicBool>>) -> SearchLimits {
        SearchLimits {
            time_limit: (self.time_limit_ms > 0).then(|| Duration::from_millis(self.time_limit_ms)),
            node_limit: (self.node_limit > 0).then_some(self.node_limit),
            interrupt,
        }
    }
}

/// Bin packing model loaded into a constraint engine.
///
/// Items are expected in decreasing size order when symmetry breaking is
/// enabled; the model is still correct otherwise, only the pruning is
/// weaker.
pub struct PackingModel<E> {
    engine: E,
    encoding: CspEncoding,
    capacity: Size,
    bins: usize,
    items: usize,
    vars: Vec<VarId>,
}

impl<E: CspEngine> PackingModel<E> {
    /// Builds a model over `bins` empty bins.
    pub fn build(
        engine: E,
        items: &[Item],
        capacity: Size,
        bins: usize,
        config: &CspConfig,
    ) -> Self {
        Self::build_with_loads(engine, items, capacity, &vec![0; bins], config)
    }

    /// Builds a model over bins that already hold `loads[j]` units.
    ///
    /// Symmetry breaking is only applied when every bin starts empty.
    pub fn build_with_loads(
        mut engine: E,
        items: &[Item],
        capacity: Size,
        loads: &[Size],
        config: &CspConfig,
    ) -> Self {
        let sizes: Arc<[Size]> = items.iter().map(|item| item.size()).collect();
        let loads: Arc<[Size]> = loads.into();
        let symmetric = config.symmetry_breaking && loads.iter().all(|&load| load == 0);

        let vars = match config.encoding {
            CspEncoding::Placement => {
                encode_placement(&mut engine, &sizes, &loads, capacity, symmetric)
            }
            CspEncoding::Indicator => {
                encode_indicator(&mut engine, &sizes, &loads, capacity, symmetric)
            }
        };

        Self {
            engine,
            encoding: config.encoding,
            capacity,
            bins: loads.len(),
            items: sizes.len(),
            vars,
        }
    }

    /// Encoding the model was built with.
    pub fn encoding(&self) -> CspEncoding {
        self.encoding
    }

    /// Number of bins in the model.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Number of variables the model registered.
    pub fn variable_count(&self) -> usize {
        self.vars.len()
    }

    /// Underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Runs the engine.
    pub fn solve(&mut self) -> bool {
        self.engine.solve()
    }

    /// Bin index of every item, or `None` if the engine holds no complete
    /// assignment.
    pub fn assignment(&self) -> Option<Vec<usize>> {
        match self.encoding {
            CspEncoding::Placement => self
                .vars
                .iter()
                .map(|&var| {
                    let bin = usize::try_from(self.engine.value(var)?).ok()?;
                    (bin < self.bins).then_some(bin)
                })
                .collect(),
            CspEncoding::Indicator => self
                .vars
                .chunks(self.bins.max(1))
                .take(self.items)
                .map(|row| {
                    let mut chosen = None;
                    for (bin, &var) in row.iter().enumerate() {
                        match self.engine.value(var)? {
                            1 if chosen.is_none() => chosen = Some(bin),
                            0 => {}
                            _ => return None,
                        }
                    }
                    chosen
                })
                .collect(),
        }
    }

    /// Packs `items` into `collection` according to the assignment.
    ///
    /// The whole assignment is checked before the first item is placed, so
    /// a failed decode leaves the collection untouched.
    pub fn decode_into(&self, collection: &mut BinCollection, items: &[Item]) -> Result<()> {
        let unsatisfiable = Error::Unsatisfiable { bins: self.bins };
        let targets = self.assignment().ok_or_else(|| unsatisfiable.clone())?;
        if targets.len() != items.len() || collection.total_bins() < self.bins {
            return Err(unsatisfiable);
        }

        let mut loads: Vec<u128> = collection.bins()[..self.bins]
            .iter()
            .map(|bin| u128::from(bin.usage()))
            .collect();
        for (item, &bin) in items.iter().zip(&targets) {
            loads[bin] += u128::from(item.size());
            if loads[bin] > u128::from(self.capacity) {
                return Err(unsatisfiable);
            }
        }

        for (&item, &bin) in items.iter().zip(&targets) {
            collection.pack_into(bin, item);
        }
        Ok(())
    }
}

impl<E> std::fmt::Debug for PackingModel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackingModel")
            .field("encoding", &self.encoding)
            .field("capacity", &self.capacity)
            .field("bins", &self.bins)
            .field("items", &self.items)
            .field("variables", &self.vars.len())
            .finish()
    }
}

fn bin_value(bin: usize) -> Value {
    bin as Value
}

fn encode_placement<E: CspEngine>(
    engine: &mut E,
    sizes: &Arc<[Size]>,
    loads: &Arc<[Size]>,
    capacity: Size,
    symmetric: bool,
) -> Vec<VarId> {
    let bins = loads.len();
    let vars: Vec<VarId> = sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            let reachable = if symmetric { bins.min(i + 1) } else { bins };
            let domain = (0..reachable)
                .filter(|&bin| fits(loads[bin], size, capacity))
                .map(bin_value)
                .collect();
            engine.add_variable(format!("item_{i}"), domain)
        })
        .collect();
    let vars: Arc<[VarId]> = vars.into();

    {
        let (sizes, loads, vars) = (Arc::clone(sizes), Arc::clone(loads), Arc::clone(&vars));
        engine.add_constraint(
            vars.to_vec(),
            Box::new(move |a: &Assignment<'_>| {
                let mut used: Vec<u128> = loads.iter().map(|&load| u128::from(load)).collect();
                for (k, &var) in vars.iter().enumerate() {
                    let Some(bin) = a.value(var) else { continue };
                    let Some(load) = usize::try_from(bin).ok().and_then(|b| used.get_mut(b))
                    else {
                        return false;
                    };
                    *load += u128::from(sizes[k]);
                    if *load > u128::from(capacity) {
                        return false;
                    }
                }
                true
            }),
        );
    }

    {
        let (sizes, loads, watched) = (Arc::clone(sizes), Arc::clone(loads), Arc::clone(&vars));
        engine.add_propagator(
            vars.to_vec(),
            Box::new(move |fixed: VarId, a: &Assignment<'_>| {
                let Some(bin) = a.value(fixed) else {
                    return Vec::new();
                };
                let Some(&base) = usize::try_from(bin).ok().and_then(|b| loads.get(b)) else {
                    return Vec::new();
                };
                let load = u128::from(base) + load_of(&watched, &sizes, a, |v| v == bin);
                overflowing(&watched, &sizes, a, load, capacity, bin)
            }),
        );
    }

    vars.to_vec()
}

fn encode_indicator<E: CspEngine>(
    engine: &mut E,
    sizes: &Arc<[Size]>,
    loads: &Arc<[Size]>,
    capacity: Size,
    symmetric: bool,
) -> Vec<VarId> {
    let bins = loads.len();
    let mut vars = Vec::with_capacity(sizes.len() * bins);
    for (i, &size) in sizes.iter().enumerate() {
        for (j, &load) in loads.iter().enumerate() {
            let allowed = (!symmetric || j <= i) && fits(load, size, capacity);
            let domain = if allowed { vec![1, 0] } else { vec![0] };
            vars.push(engine.add_variable(format!("x_{i}_{j}"), domain));
        }
    }

    let row = |i: usize| -> Vec<VarId> { vars[i * bins..(i + 1) * bins].to_vec() };
    let column = |j: usize| -> Vec<VarId> { (0..sizes.len()).map(|i| vars[i * bins + j]).collect() };

    for i in 0..sizes.len() {
        let watched = row(i);

        let scope = watched.clone();
        engine.add_constraint(
            watched.clone(),
            Box::new(move |a: &Assignment<'_>| {
                let ones = scope.iter().filter(|&&var| a.value(var) == Some(1)).count();
                let complete = scope.iter().all(|&var| a.is_assigned(var));
                ones <= 1 && (!complete || ones == 1)
            }),
        );

        let scope = watched.clone();
        engine.add_propagator(
            watched,
            Box::new(move |fixed: VarId, a: &Assignment<'_>| {
                if a.value(fixed) == Some(1) {
                    return scope
                        .iter()
                        .filter(|&&var| var != fixed && !a.is_assigned(var) && a.can_take(var, 1))
                        .map(|&var| (var, 1))
                        .collect();
                }
                if scope.iter().any(|&var| a.value(var) == Some(1)) {
                    return Vec::new();
                }
                // the last open indicator of an item must fire
                let mut open = scope.iter().filter(|&&var| !a.is_assigned(var));
                match (open.next(), open.next()) {
                    (Some(&last), None) if a.can_take(last, 0) => vec![(last, 0)],
                    _ => Vec::new(),
                }
            }),
        );
    }

    for (j, &base) in loads.iter().enumerate() {
        let watched: Arc<[VarId]> = column(j).into();

        let (scope, weights) = (Arc::clone(&watched), Arc::clone(sizes));
        engine.add_constraint(
            watched.to_vec(),
            Box::new(move |a: &Assignment<'_>| {
                u128::from(base) + load_of(&scope, &weights, a, |v| v == 1)
                    <= u128::from(capacity)
            }),
        );

        let (scope, weights) = (Arc::clone(&watched), Arc::clone(sizes));
        engine.add_propagator(
            watched.to_vec(),
            Box::new(move |fixed: VarId, a: &Assignment<'_>| {
                if a.value(fixed) != Some(1) {
                    return Vec::new();
                }
                let load = u128::from(base) + load_of(&scope, &weights, a, |v| v == 1);
                overflowing(&scope, &weights, a, load, capacity, 1)
            }),
        );
    }

    vars
}

/// Returns true if `size` fits on top of `load` without overflowing `capacity`.
fn fits(load: Size, size: Size, capacity: Size) -> bool {
    load.checked_add(size).map_or(false, |total| total <= capacity)
}

/// Summed size of the items whose variable is assigned a matching value.
/// Widened so that sums of sizes near `Size::MAX` stay exact.
fn load_of<F>(vars: &[VarId], sizes: &[Size], a: &Assignment<'_>, matches: F) -> u128
where
    F: Fn(Value) -> bool,
{
    vars.iter()
        .zip(sizes)
        .filter(|(&var, _)| a.value(var).map_or(false, &matches))
        .map(|(_, &size)| u128::from(size))
        .sum()
}

/// Removals of `value` from every open variable whose item would push
/// `load` over `capacity`.
fn overflowing(
    vars: &[VarId],
    sizes: &[Size],
    a: &Assignment<'_>,
    load: u128,
    capacity: Size,
    value: Value,
) -> Vec<(VarId, Value)> {
    vars.iter()
        .zip(sizes)
        .filter(|(&var, &size)| {
            !a.is_assigned(var)
                && a.can_take(var, value)
                && load + u128::from(size) > u128::from(capacity)
        })
        .map(|(&var, _)| (var, value))
        .collect()
}

/// Packs `items` (sorted by decreasing size) into the bins of `collection`.
///
/// A collection without bins is first given `bins_for(lower_bound)` bins.
/// Fails with [`Error::Unsatisfiable`] when the search ends without a
/// solution for any reason.
pub(crate) fn pack(
    collection: &mut BinCollection,
    items: &[Item],
    config: &CspConfig,
    interrupt: Option<Arc<AtomicBool>>,
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let capacity = collection.capacity();
    if collection.total_bins() == 0 {
        let bound = lower_bound(items, capacity)?;
        for _ in 0..config.bins_for(bound) {
            collection.allocate_bin();
        }
    }

    let loads: Vec<Size> = collection.bins().iter().map(|bin| bin.usage()).collect();
    let engine = BacktrackingSolver::new()
        .with_limits(config.search_limits(interrupt))
        .with_variable_selection(config.variable_selection);
    let mut model = PackingModel::build_with_loads(engine, items, capacity, &loads, config);
    log::debug!(
        "CSP model ({:?}): {} items, {} bins, {} variables, {} constraints, {} propagators",
        config.encoding,
        items.len(),
        loads.len(),
        model.engine().variable_count(),
        model.engine().constraint_count(),
        model.engine().propagator_count()
    );

    if !model.solve() {
        let reason = model
            .engine()
            .outcome()
            .map_or_else(|| "unknown".to_string(), |outcome| outcome.to_string());
        log::warn!(
            "CSP search found no packing into {} bins: {}",
            loads.len(),
            reason
        );
        return Err(Error::Unsatisfiable { bins: loads.len() });
    }

    log::info!(
        "CSP search packed {} items into {} bins after {} nodes",
        items.len(),
        loads.len(),
        model.engine().stats().nodes
    );
    model.decode_into(collection, items)
}
