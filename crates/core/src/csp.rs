//! Backtracking constraint satisfaction solver with propagation.
//!
//! The [`CspEngine`] trait is the boundary between a constraint model and
//! the search that solves it. Models register variables with finite integer
//! domains, constraints over (possibly partial) assignments and propagators
//! that prune domains after a variable is fixed.
//!
//! [`BacktrackingSolver`] is a depth-first implementation:
//!
//! - variables are chosen in input order or by minimum remaining values;
//! - values are tried in the order the domain was registered;
//! - after each assignment the constraints watching the variable are
//!   checked, then its propagators run and their removals are applied;
//! - every assignment and removal is recorded on a trail so that a
//!   backtrack restores the previous state in time linear in the undone
//!   changes.
//!
//! The search stops at the first complete consistent assignment. A time
//! limit, a node limit and an external interrupt flag can end it early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a variable inside an engine.
pub type VarId = usize;

/// Value of a variable.
pub type Value = i64;

/// Constraint predicate. Must return `false` only when the assignment
/// definitely violates the constraint; unassigned variables are unknowns.
pub type ConstraintFn = Box<dyn Fn(&Assignment<'_>) -> bool + Send + Sync>;

/// Propagator invoked with the variable that was just fixed. Returns the
/// `(variable, value)` pairs to remove from domains.
pub type PropagatorFn = Box<dyn Fn(VarId, &Assignment<'_>) -> Vec<(VarId, Value)> + Send + Sync>;

/// Interface of a constraint satisfaction engine.
pub trait CspEngine {
    /// Registers a variable with the given domain, in value order.
    fn add_variable(&mut self, name: String, domain: Vec<Value>) -> VarId;

    /// Registers a constraint that is re-checked whenever one of the
    /// variables in `scope` is assigned.
    fn add_constraint(&mut self, scope: Vec<VarId>, constraint: ConstraintFn);

    /// Registers a propagator that runs whenever one of the variables in
    /// `scope` is assigned.
    fn add_propagator(&mut self, scope: Vec<VarId>, propagator: PropagatorFn);

    /// Searches for a complete assignment satisfying every constraint.
    fn solve(&mut self) -> bool;

    /// Value of `var` after a successful solve, `None` if unassigned.
    fn value(&self, var: VarId) -> Option<Value>;
}

/// Read-only view of the search state.
#[derive(Debug, Clone, Copy)]
pub struct Assignment<'a> {
    values: &'a [Option<Value>],
    domains: &'a [Domain],
}

impl<'a> Assignment<'a> {
    /// Value of `var`, if assigned.
    #[inline]
    pub fn value(&self, var: VarId) -> Option<Value> {
        self.values[var]
    }

    /// Returns true if `var` has been assigned.
    #[inline]
    pub fn is_assigned(&self, var: VarId) -> bool {
        self.values[var].is_some()
    }

    /// Returns true if `value` is still in the domain of `var`.
    #[inline]
    pub fn can_take(&self, var: VarId, value: Value) -> bool {
        self.domains[var].contains(value)
    }

    /// Remaining domain size of `var`.
    #[inline]
    pub fn domain_size(&self, var: VarId) -> usize {
        self.domains[var].len()
    }
}

/// Finite domain that supports removal and trail-based restoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    values: Vec<Value>,
    active: Vec<bool>,
    len: usize,
}

impl Domain {
    /// Creates a domain; duplicate values are dropped.
    pub fn new(values: Vec<Value>) -> Self {
        let mut unique = Vec::with_capacity(values.len());
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        let len = unique.len();
        Self {
            active: vec![true; len],
            values: unique,
            len,
        }
    }

    /// Number of values still available.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no value is left.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `value` is available.
    pub fn contains(&self, value: Value) -> bool {
        self.slot_of(value).is_some()
    }

    /// Available values in order.
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.values
            .iter()
            .zip(&self.active)
            .filter(|(_, &active)| active)
            .map(|(&value, _)| value)
    }

    fn slot_of(&self, value: Value) -> Option<usize> {
        self.values
            .iter()
            .zip(&self.active)
            .position(|(&candidate, &active)| active && candidate == value)
    }

    fn next_active(&self, from: usize) -> Option<usize> {
        (from..self.values.len()).find(|&slot| self.active[slot])
    }

    fn deactivate(&mut self, slot: usize) {
        self.active[slot] = false;
        self.len -= 1;
    }

    fn reactivate(&mut self, slot: usize) {
        self.active[slot] = true;
        self.len += 1;
    }
}

/// How the next variable to branch on is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VariableSelection {
    /// First unassigned variable in registration order.
    #[default]
    InputOrder,
    /// Unassigned variable with the fewest remaining values; ties go to the
    /// earliest registered.
    MinimumRemainingValues,
}

/// Limits that end a search early.
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    /// Wall-clock budget for one `solve` call.
    pub time_limit: Option<Duration>,
    /// Maximum number of search nodes (value assignments).
    pub node_limit: Option<u64>,
    /// External cancellation flag.
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl SearchLimits {
    /// No limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets the node limit.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    /// Sets the interrupt flag.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }
}

/// Why a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A complete consistent assignment was found.
    Satisfied,
    /// The whole search space was explored without a solution.
    Exhausted,
    /// The time limit was reached.
    TimeLimit,
    /// The node limit was reached.
    NodeLimit,
    /// The interrupt flag was raised.
    Interrupted,
}

impl std::fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Satisfied => write!(f, "Satisfied"),
            Self::Exhausted => write!(f, "Exhausted"),
            Self::TimeLimit => write!(f, "TimeLimit"),
            Self::NodeLimit => write!(f, "NodeLimit"),
            Self::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// Search counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Value assignments tried.
    pub nodes: u64,
    /// Assignments rejected by a constraint or a wiped-out domain.
    pub failures: u64,
    /// Values removed by propagators.
    pub prunings: u64,
    /// Deepest level reached.
    pub max_depth: usize,
    /// Wall-clock time of the last `solve`.
    pub elapsed: Duration,
}

/// Undoable change to the search state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrailEntry {
    Assigned { var: VarId },
    Removed { var: VarId, slot: usize },
}

/// One decision level of the depth-first search.
#[derive(Debug, Clone, Copy)]
struct Frame {
    var: VarId,
    next_slot: usize,
    trail_start: usize,
}

/// Depth-first backtracking solver.
///
/// ```rust
/// use binpack_core::csp::{Assignment, BacktrackingSolver, CspEngine};
///
/// let mut solver = BacktrackingSolver::new();
/// let x = solver.add_variable("x".into(), vec![1, 2, 3]);
/// let y = solver.add_variable("y".into(), vec![1, 2, 3]);
/// solver.add_constraint(
///     vec![x, y],
///     Box::new(move |a: &Assignment<'_>| match (a.value(x), a.value(y)) {
///         (Some(x), Some(y)) => x + y == 5 && x > y,
///         _ => true,
///     }),
/// );
/// assert!(solver.solve());
/// assert_eq!(solver.value(x), Some(3));
/// assert_eq!(solver.value(y), Some(2));
/// ```
pub struct BacktrackingSolver {
    names: Vec<String>,
    domains: Vec<Domain>,
    values: Vec<Option<Value>>,
    constraints: Vec<ConstraintFn>,
    propagators: Vec<PropagatorFn>,
    constraints_of: Vec<Vec<usize>>,
    propagators_of: Vec<Vec<usize>>,
    trail: Vec<TrailEntry>,
    selection: VariableSelection,
    limits: SearchLimits,
    outcome: Option<SearchOutcome>,
    stats: SearchStats,
}

impl Default for BacktrackingSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BacktrackingSolver {
    /// Nodes between two clock reads.
    const CLOCK_INTERVAL: u64 = 256;

    /// Creates an empty solver without limits.
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            domains: Vec::new(),
            values: Vec::new(),
            constraints: Vec::new(),
            propagators: Vec::new(),
            constraints_of: Vec::new(),
            propagators_of: Vec::new(),
            trail: Vec::new(),
            selection: VariableSelection::default(),
            limits: SearchLimits::default(),
            outcome: None,
            stats: SearchStats::default(),
        }
    }

    /// Sets the search limits.
    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the variable selection rule.
    pub fn with_variable_selection(mut self, selection: VariableSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Number of registered variables.
    pub fn variable_count(&self) -> usize {
        self.domains.len()
    }

    /// Number of registered constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Number of registered propagators.
    pub fn propagator_count(&self) -> usize {
        self.propagators.len()
    }

    /// Name given to `var`.
    pub fn name(&self, var: VarId) -> Option<&str> {
        self.names.get(var).map(String::as_str)
    }

    /// Looks a variable up by name.
    pub fn find(&self, name: &str) -> Option<VarId> {
        self.names.iter().position(|candidate| candidate == name)
    }

    /// Current domain of `var`.
    pub fn domain(&self, var: VarId) -> Option<&Domain> {
        self.domains.get(var)
    }

    /// Why the last search ended.
    pub fn outcome(&self) -> Option<SearchOutcome> {
        self.outcome
    }

    /// Counters of the last search.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    fn view(&self) -> Assignment<'_> {
        Assignment {
            values: &self.values,
            domains: &self.domains,
        }
    }

    fn select_variable(&self) -> Option<VarId> {
        let mut unassigned = (0..self.values.len()).filter(|&var| self.values[var].is_none());
        match self.selection {
            VariableSelection::InputOrder => unassigned.next(),
            VariableSelection::MinimumRemainingValues => {
                unassigned.min_by_key(|&var| (self.domains[var].len(), var))
            }
        }
    }

    fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            match self.trail.pop() {
                Some(TrailEntry::Assigned { var }) => self.values[var] = None,
                Some(TrailEntry::Removed { var, slot }) => self.domains[var].reactivate(slot),
                None => break,
            }
        }
    }

    fn remove(&mut self, var: VarId, value: Value) -> bool {
        match self.domains[var].slot_of(value) {
            Some(slot) => {
                self.domains[var].deactivate(slot);
                self.trail.push(TrailEntry::Removed { var, slot });
                true
            }
            None => false,
        }
    }

    fn consistent(&self, var: VarId) -> bool {
        let view = self.view();
        self.constraints_of[var]
            .iter()
            .all(|&index| (self.constraints[index])(&view))
    }

    /// Assigns `value` to `var`, checks its constraints and runs its
    /// propagators. Returns false on failure; the caller undoes the trail.
    fn assign(&mut self, var: VarId, value: Value) -> bool {
        self.values[var] = Some(value);
        self.trail.push(TrailEntry::Assigned { var });

        if !self.consistent(var) {
            return false;
        }

        for position in 0..self.propagators_of[var].len() {
            let index = self.propagators_of[var][position];
            let removals = (self.propagators[index])(var, &self.view());
            for (target, removed) in removals {
                if self.values[target].is_some() {
                    continue;
                }
                if self.remove(target, removed) {
                    self.stats.prunings += 1;
                    if self.domains[target].is_empty() {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn limit_reached(&self, started: Instant) -> Option<SearchOutcome> {
        if let Some(flag) = &self.limits.interrupt {
            if flag.load(Ordering::Relaxed) {
                return Some(SearchOutcome::Interrupted);
            }
        }
        if let Some(limit) = self.limits.node_limit {
            if self.stats.nodes >= limit {
                return Some(SearchOutcome::NodeLimit);
            }
        }
        if let Some(limit) = self.limits.time_limit {
            if self.stats.nodes % Self::CLOCK_INTERVAL == 0 && started.elapsed() >= limit {
                return Some(SearchOutcome::TimeLimit);
            }
        }
        None
    }

    fn search(&mut self, started: Instant) -> SearchOutcome {
        let mut stack: Vec<Frame> = Vec::with_capacity(self.values.len());
        match self.select_variable() {
            Some(var) => stack.push(Frame {
                var,
                next_slot: 0,
                trail_start: self.trail.len(),
            }),
            None => return SearchOutcome::Satisfied,
        }

        while let Some(frame) = stack.last_mut() {
            self.undo_to(frame.trail_start);

            let var = frame.var;
            let Some(slot) = self.domains[var].next_active(frame.next_slot) else {
                stack.pop();
                continue;
            };
            frame.next_slot = slot + 1;

            if let Some(outcome) = self.limit_reached(started) {
                return outcome;
            }
            self.stats.nodes += 1;

            let value = self.domains[var].values[slot];
            if !self.assign(var, value) {
                self.stats.failures += 1;
                continue;
            }

            match self.select_variable() {
                Some(next) => {
                    stack.push(Frame {
                        var: next,
                        next_slot: 0,
                        trail_start: self.trail.len(),
                    });
                    self.stats.max_depth = self.stats.max_depth.max(stack.len());
                }
                None => return SearchOutcome::Satisfied,
            }
        }
        SearchOutcome::Exhausted
    }
}

impl CspEngine for BacktrackingSolver {
    fn add_variable(&mut self, name: String, domain: Vec<Value>) -> VarId {
        self.names.push(name);
        self.domains.push(Domain::new(domain));
        self.values.push(None);
        self.constraints_of.push(Vec::new());
        self.propagators_of.push(Vec::new());
        self.domains.len() - 1
    }

    fn add_constraint(&mut self, scope: Vec<VarId>, constraint: ConstraintFn) {
        let index = self.constraints.len();
        for &var in &scope {
            self.constraints_of[var].push(index);
        }
        self.constraints.push(constraint);
    }

    fn add_propagator(&mut self, scope: Vec<VarId>, propagator: PropagatorFn) {
        let index = self.propagators.len();
        for &var in &scope {
            self.propagators_of[var].push(index);
        }
        self.propagators.push(propagator);
    }

    fn solve(&mut self) -> bool {
        self.undo_to(0);
        self.stats = SearchStats::default();

        let started = Instant::now();
        let outcome = self.search(started);
        self.stats.elapsed = started.elapsed();
        self.outcome = Some(outcome);

        if outcome != SearchOutcome::Satisfied {
            // leave no partial assignment behind
            self.undo_to(0);
        }
        log::debug!(
            "CSP search {} after {} nodes ({} failures, {} prunings) in {:?}",
            outcome,
            self.stats.nodes,
            self.stats.failures,
            self.stats.prunings,
            self.stats.elapsed
        );
        outcome == SearchOutcome::Satisfied
    }

    fn value(&self, var: VarId) -> Option<Value> {
        self.values.get(var).copied().flatten()
    }
}

impl std::fmt::Debug for BacktrackingSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktrackingSolver")
            .field("variables", &self.domains.len())
            .field("constraints", &self.constraints.len())
            .field("propagators", &self.propagators.len())
            .field("selection", &self.selection)
            .field("outcome", &self.outcome)
            .finish()
    }
}
