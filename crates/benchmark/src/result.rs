//! Benchmark result types and recording.

use binpack_core::{Algorithm, PackingList, PackingSummary, Size};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;

/// Result of a single benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Instance name
    pub instance: String,
    /// Algorithm used
    pub algorithm: String,
    /// Repetition index, starting at 1
    pub repeat: usize,
    /// Number of items in the instance
    pub items: usize,
    /// Bin capacity
    pub capacity: Size,
    /// Generator center, if known
    pub center: Option<Size>,
    /// Generator variability, if known
    pub variability: Option<u32>,
    /// Bins used (None if the run failed)
    pub bins: Option<usize>,
    /// Lower bound of the instance
    pub lower_bound: Option<usize>,
    /// Bins above the lower bound
    pub gap: Option<usize>,
    /// Bins divided by lower bound (1.0 = provably optimal)
    pub optimality: Option<f64>,
    /// Mean fill ratio of the used bins
    pub average_fill: Option<f64>,
    /// Wall-clock time in nanoseconds
    pub time_ns: u64,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    /// Creates the result of a successful run.
    pub fn solved(
        instance: impl Into<String>,
        repeat: usize,
        list: &PackingList,
        summary: &PackingSummary,
        time_ns: u64,
    ) -> Self {
        let optimality = summary
            .lower_bound
            .filter(|&bound| bound > 0)
            .map(|bound| round5(summary.used_bins as f64 / bound as f64));
        Self {
            instance: instance.into(),
            algorithm: summary.algorithm.to_string(),
            repeat,
            items: list.items.len(),
            capacity: list.capacity,
            center: list.center,
            variability: list.variability,
            bins: Some(summary.used_bins),
            lower_bound: summary.lower_bound,
            gap: summary.gap,
            optimality,
            average_fill: Some(summary.average_fill),
            time_ns,
            error: None,
        }
    }

    /// Creates the result of a failed run.
    pub fn failed(
        instance: impl Into<String>,
        repeat: usize,
        list: &PackingList,
        algorithm: Algorithm,
        time_ns: u64,
        error: impl ToString,
    ) -> Self {
        Self {
            instance: instance.into(),
            algorithm: algorithm.to_string(),
            repeat,
            items: list.items.len(),
            capacity: list.capacity,
            center: list.center,
            variability: list.variability,
            bins: None,
            lower_bound: list.lower_bound,
            gap: None,
            optimality: None,
            average_fill: None,
            time_ns,
            error: Some(error.to_string()),
        }
    }

    /// Returns true if the run produced a packing.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Wall-clock time in milliseconds.
    pub fn time_ms(&self) -> f64 {
        self.time_ns as f64 / 1_000_000.0
    }
}

fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

/// Collection of benchmark results.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Individual run results
    pub runs: Vec<RunResult>,
    /// Seconds since the Unix epoch when the benchmark started
    pub timestamp: u64,
    /// Additional metadata
    pub metadata: BenchmarkMetadata,
}

/// Metadata about the benchmark run.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BenchmarkMetadata {
    /// Crate version
    pub version: String,
    /// Configuration used
    pub config: String,
}

impl BenchmarkResult {
    /// Creates a new benchmark result.
    pub fn new() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self {
            runs: Vec::new(),
            timestamp,
            metadata: BenchmarkMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                config: String::new(),
            },
        }
    }

    /// Records the configuration description.
    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.metadata.config = config.into();
        self
    }

    /// Adds a run result.
    pub fn add_run(&mut self, result: RunResult) {
        self.runs.push(result);
    }

    /// Saves results to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Saves results to a CSV file.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.write_csv(&mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Writes results as CSV.
    pub fn write_csv<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(
            out,
            "instance,algorithm,repeat,items,capacity,center,variability,bins,lower_bound,gap,optimality,average_fill,time_ns,error"
        )?;

        for run in &self.runs {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                run.instance,
                run.algorithm,
                run.repeat,
                run.items,
                run.capacity,
                optional(run.center),
                optional(run.variability),
                optional(run.bins),
                optional(run.lower_bound),
                optional(run.gap),
                run.optimality.map_or(String::new(), |o| format!("{:.5}", o)),
                run.average_fill
                    .map_or(String::new(), |f| format!("{:.4}", f)),
                run.time_ns,
                run.error.as_deref().unwrap_or_default().replace(',', ";"),
            )?;
        }

        Ok(())
    }

    /// Computes summary statistics per algorithm, in declaration order.
    pub fn summary_by_algorithm(&self) -> Vec<AlgorithmSummary> {
        Algorithm::ALL
            .into_iter()
            .filter_map(|algorithm| {
                let name = algorithm.name();
                let runs: Vec<&RunResult> =
                    self.runs.iter().filter(|run| run.algorithm == name).collect();
                if runs.is_empty() {
                    return None;
                }

                let solved: Vec<&RunResult> =
                    runs.iter().copied().filter(|run| run.is_success()).collect();
                let avg_bins = mean(solved.iter().filter_map(|run| run.bins.map(|b| b as f64)));
                let avg_optimality = mean(solved.iter().filter_map(|run| run.optimality));
                let lower_bound_hits = solved
                    .iter()
                    .filter(|run| run.gap == Some(0))
                    .count();
                let avg_time_ms = mean(runs.iter().map(|run| run.time_ms())).unwrap_or(0.0);

                Some(AlgorithmSummary {
                    algorithm: name.to_string(),
                    run_count: runs.len(),
                    failures: runs.len() - solved.len(),
                    avg_bins,
                    avg_optimality,
                    lower_bound_hits,
                    avg_time_ms,
                })
            })
            .collect()
    }

    /// Prints a summary table to stdout.
    pub fn print_summary(&self) {
        println!("\n{:=<100}", "");
        println!("BENCHMARK RESULTS");
        println!("{:=<100}", "");
        println!(
            "{:<30} {:>6} {:>8} {:>10} {:>10} {:>8} {:>12}",
            "Algorithm", "Runs", "Failed", "Bins", "Bins/LB", "LB hits", "Time(ms)"
        );
        println!("{:-<100}", "");

        for summary in self.summary_by_algorithm() {
            println!(
                "{:<30} {:>6} {:>8} {:>10} {:>10} {:>8} {:>12.3}",
                summary.algorithm,
                summary.run_count,
                summary.failures,
                summary
                    .avg_bins
                    .map_or("-".to_string(), |b| format!("{:.2}", b)),
                summary
                    .avg_optimality
                    .map_or("-".to_string(), |o| format!("{:.4}", o)),
                summary.lower_bound_hits,
                summary.avg_time_ms
            );
        }

        println!("{:=<100}\n", "");
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or(String::new(), |v| v.to_string())
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Summary statistics for an algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSummary {
    pub algorithm: String,
    pub run_count: usize,
    pub failures: usize,
    pub avg_bins: Option<f64>,
    pub avg_optimality: Option<f64>,
    pub lower_bound_hits: usize,
    pub avg_time_ms: f64,
}
