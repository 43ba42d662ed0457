use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to access config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Why a graph metric could not be produced. Callers treat every variant as
/// "metric unavailable" and carry on with the rest of the report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("graph has no edges")]
    NoEdges,

    #[error("power iteration did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("non-finite score produced")]
    NonFinite,
}

pub type Result<T> = std::result::Result<T, DataError>;
