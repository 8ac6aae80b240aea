//! Benchmark runner for packing list datasets.

use binpack_core::{lower_bound, Algorithm, BinPacker, Config, CspConfig, PackingList, PackingSummary};
use rayon::prelude::*;
use std::time::Instant;

use crate::result::{BenchmarkResult, RunResult};

/// Configuration for benchmark runs.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Algorithms to benchmark.
    pub algorithms: Vec<Algorithm>,
    /// Number of runs per instance and algorithm.
    pub repeats: usize,
    /// Time limit of the constraint search in milliseconds (0 = unlimited).
    pub time_limit_ms: u64,
    /// Whether instances are processed in parallel.
    pub parallel: bool,
    /// Whether to show progress.
    pub show_progress: bool,
    /// Constraint model settings.
    pub csp: CspConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            algorithms: Algorithm::HEURISTICS.to_vec(),
            repeats: 1,
            time_limit_ms: 10_000,
            parallel: true,
            show_progress: true,
            csp: CspConfig::default(),
        }
    }
}

impl BenchmarkConfig {
    /// Creates a new benchmark configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the algorithms to benchmark.
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Sets the number of runs per instance and algorithm.
    pub fn with_repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats.max(1);
        self
    }

    /// Sets the constraint search time limit.
    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Enables or disables parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enables or disables progress output.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Sets the constraint model settings.
    pub fn with_csp(mut self, csp: CspConfig) -> Self {
        self.csp = csp;
        self
    }

    /// Quick preset: heuristics only.
    pub fn quick() -> Self {
        Self {
            algorithms: Algorithm::HEURISTICS.to_vec(),
            repeats: 1,
            time_limit_ms: 1_000,
            ..Self::default()
        }
    }

    /// Standard preset: every algorithm, three repeats.
    pub fn standard() -> Self {
        Self {
            algorithms: Algorithm::ALL.to_vec(),
            repeats: 3,
            time_limit_ms: 10_000,
            ..Self::default()
        }
    }

    fn packer_config(&self) -> Config {
        Config::new()
            .with_csp(self.csp.clone())
            .with_time_limit(self.time_limit_ms)
    }

    fn describe(&self) -> String {
        let names: Vec<&str> = self.algorithms.iter().map(|a| a.short_name()).collect();
        format!(
            "algorithms={} repeats={} time_limit_ms={}",
            names.join(","),
            self.repeats,
            self.time_limit_ms
        )
    }
}

/// Benchmark runner.
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
}

impl BenchmarkRunner {
    /// Creates a new benchmark runner.
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Runs every configured algorithm on one packing list.
    ///
    /// The list's own algorithm is ignored. A missing lower bound is
    /// computed once up front.
    pub fn run_list(&self, name: &str, list: &PackingList) -> Vec<RunResult> {
        let mut runs = Vec::with_capacity(self.config.algorithms.len() * self.config.repeats);

        let mut list = list.clone();
        if list.lower_bound.is_none() {
            match lower_bound(&list.items, list.capacity) {
                Ok(bound) => list.lower_bound = Some(bound),
                Err(e) => log::warn!("{}: no lower bound: {}", name, e),
            }
        }

        if self.config.show_progress {
            println!(
                "\nBenchmarking {}: {} items, capacity {}, lower bound {}",
                name,
                list.items.len(),
                list.capacity,
                list.lower_bound.map_or("-".to_string(), |b| b.to_string())
            );
        }

        for &algorithm in &self.config.algorithms {
            let prepared = list.clone().with_algorithm(algorithm);
            for repeat in 1..=self.config.repeats {
                let run = self.run_once(name, repeat, &prepared);
                if self.config.show_progress {
                    match (&run.bins, &run.error) {
                        (Some(bins), _) => println!(
                            "  {:<28} run {}: bins={}, time={:.3}ms",
                            algorithm,
                            repeat,
                            bins,
                            run.time_ms()
                        ),
                        (None, Some(error)) => {
                            println!("  {:<28} run {}: FAILED: {}", algorithm, repeat, error)
                        }
                        (None, None) => {}
                    }
                }
                runs.push(run);
            }
        }

        runs
    }

    fn run_once(&self, name: &str, repeat: usize, list: &PackingList) -> RunResult {
        let packer = BinPacker::new(self.config.packer_config());

        let start = Instant::now();
        let result = packer.solve(list);
        let elapsed = start.elapsed().as_nanos() as u64;

        match result {
            Ok(mut collection) => {
                collection.set_solution_time(elapsed);
                if !collection.is_valid_packing_of(&list.items) {
                    log::error!("{}: {} produced an invalid packing", name, list.algorithm);
                    return RunResult::failed(
                        name,
                        repeat,
                        list,
                        list.algorithm,
                        elapsed,
                        "invalid packing",
                    );
                }
                let summary = PackingSummary::new(&collection, list.lower_bound);
                log::debug!("{}: {}", name, summary);
                RunResult::solved(name, repeat, list, &summary, elapsed)
            }
            Err(e) => {
                log::warn!("{}: {} failed: {}", name, list.algorithm, e);
                RunResult::failed(name, repeat, list, list.algorithm, elapsed, e)
            }
        }
    }

    /// Runs every instance, in parallel if configured.
    ///
    /// Runs are reported in instance order either way.
    pub fn run_all(&self, instances: &[(String, PackingList)]) -> BenchmarkResult {
        let mut results = BenchmarkResult::new().with_config(self.config.describe());

        let per_instance: Vec<Vec<RunResult>> = if self.config.parallel {
            instances
                .par_iter()
                .map(|(name, list)| self.run_list(name, list))
                .collect()
        } else {
            instances
                .iter()
                .map(|(name, list)| self.run_list(name, list))
                .collect()
        };

        for run in per_instance.into_iter().flatten() {
            results.add_run(run);
        }
        log::info!(
            "benchmark finished: {} runs over {} instances",
            results.runs.len(),
            instances.len()
        );
        results
    }
}
