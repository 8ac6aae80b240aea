//! Error types for the benchmark tools.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchmarkError>;

/// Errors that can occur while generating, loading or running instances.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Packing(#[from] binpack_core::Error),

    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),

    #[error("not a dataset file or directory: {}", .0.display())]
    NotFound(PathBuf),
}
