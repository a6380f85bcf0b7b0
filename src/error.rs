//! Error types for the rewrite engine.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rewrite operations.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO failure on {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Conflicting transform spec: {0}")]
    SpecConflict(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Rule '{rule}' failed: {message}")]
    TransformFailed { rule: String, message: String },
}

impl RewriteError {
    /// Wraps an IO error with the path it happened on.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RewriteError::IoFailure {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors that must abort a run before any file is touched.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RewriteError::SpecConflict(_) | RewriteError::InvalidConfig(_)
        )
    }
}

/// A specialized Result type for rewrite operations.
pub type Result<T> = std::result::Result<T, RewriteError>;
