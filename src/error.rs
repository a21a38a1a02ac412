//! Error types for dataset loading and analytics.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the loader and the analytics agent.
///
/// The KPI analyzer never returns these: it degrades to skipping a column.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// File extension the loader does not know how to read.
    #[error("unsupported file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Failed to open or read a file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// Contamination must be a fraction in (0, 0.5].
    #[error("contamination must be in (0, 0.5], got {value}")]
    InvalidContamination { value: f64 },

    /// Models only accept finite numbers.
    #[error("non-finite value {value} in column '{column}' at row {row}")]
    NonFiniteValue {
        column: String,
        row: usize,
        value: f64,
    },

    /// Zero clusters requested.
    #[error("number of clusters must be at least 1, got {n_clusters}")]
    InvalidClusterCount { n_clusters: usize },

    /// Fewer rows than requested clusters.
    #[error("number of rows ({rows}) must be at least equal to number of clusters ({n_clusters})")]
    TooFewRows { rows: usize, n_clusters: usize },

    /// K-Means fitting failed.
    #[error("k-means fitting failed: {0}")]
    KMeans(#[from] linfa_clustering::KMeansError),

    /// Drawing the chart failed.
    #[error("chart rendering failed: {message}")]
    Plot { message: String },

    /// Encoding the rendered chart failed.
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    /// Embedded rule book is malformed.
    #[error("invalid KPI rule book: {0}")]
    Rules(#[from] serde_json::Error),
}

impl From<polars::prelude::PolarsError> for ExplorerError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for explorer operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExplorerError::TooFewRows {
            rows: 1,
            n_clusters: 3,
        };
        assert_eq!(
            err.to_string(),
            "number of rows (1) must be at least equal to number of clusters (3)"
        );
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let err: ExplorerError = polars_err.into();
        assert!(matches!(err, ExplorerError::DataFrame { .. }));
    }
}
