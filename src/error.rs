//! Error types shared across the updater.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing the ignored-versions file
#[derive(Error, Debug)]
pub enum IgnoreStoreError {
    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Ignored versions file {path} is not a JSON array of strings: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that stop the updater from starting
#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("Failed to load ignored versions: {0}")]
    IgnoreStore(#[from] IgnoreStoreError),

    #[error("Invalid release URL '{url}': {reason}")]
    InvalidReleaseUrl { url: String, reason: String },
}
