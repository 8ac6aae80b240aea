//! Benchmark Suite for Binpack
//!
//! This crate provides:
//! - Random instance generation around a center size
//! - Packing list and result files in JSON
//! - Benchmark runner over every algorithm, optionally in parallel
//! - Result recording with JSON/CSV export and per-algorithm summaries

mod dataset;
mod error;
mod generator;
mod result;
mod runner;

pub use dataset::{
    instance_file_name, load_collection, load_instances, load_packing_list, results_path,
    save_collection, save_instances, save_packing_list,
};
pub use error::{BenchmarkError, Result};
pub use generator::{unity_based_normalization, GeneratorConfig, InstanceGenerator, Variability};
pub use result::{AlgorithmSummary, BenchmarkMetadata, BenchmarkResult, RunResult};
pub use runner::{BenchmarkConfig, BenchmarkRunner};
