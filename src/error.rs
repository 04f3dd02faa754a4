//! Error types for intent-bench.
//!
//! All fallible operations return [`BenchError`]. Errors fall into three
//! families:
//!
//! - configuration errors ([`BenchError::Config`], [`BenchError::Dataset`]),
//!   raised during pre-flight validation before any remote call is made;
//! - backend errors ([`BenchError::Backend`], [`BenchError::Decode`],
//!   [`BenchError::Training`], [`BenchError::Http`]), raised by a vendor
//!   adapter while talking to its remote service;
//! - plumbing errors (I/O, JSON, CSV).
//!
//! A backend error inside a scoring run aborts the whole run.
//!
//! # Examples
//!
//! ```
//! use intent_bench::error::{BenchError, Result};
//!
//! fn check_folds(folds: usize) -> Result<()> {
//!     if folds == 0 {
//!         return Err(BenchError::config("folds", "must be at least 1"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_folds(0).is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for intent-bench operations.
#[derive(Error, Debug)]
pub enum BenchError {
    /// I/O errors (dataset files, logs, result artifacts).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tab-separated dataset parsing errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Transport-level HTTP failures (connection refused, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration, always naming the offending field.
    #[error("Invalid configuration for '{field}': {message}")]
    Config { field: String, message: String },

    /// Missing or malformed dataset.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Non-success response returned by a remote backend.
    #[error("Backend error [{backend}/{status}]: {message}")]
    Backend {
        backend: String,
        status: u16,
        message: String,
    },

    /// Backend answered with a body that could not be decoded.
    #[error("Decode error [{backend}]: {message}")]
    Decode { backend: String, message: String },

    /// Remote training reported failure or exceeded its poll bound.
    #[error("Training error [{backend}]: {message}")]
    Training { backend: String, message: String },

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with [`BenchError`].
pub type Result<T> = std::result::Result<T, BenchError>;

impl BenchError {
    /// Create a new configuration error for `field`.
    pub fn config<F: Into<String>, S: Into<String>>(field: F, msg: S) -> Self {
        BenchError::Config {
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Create a new dataset error.
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        BenchError::Dataset(msg.into())
    }

    /// Create a new backend error carrying the remote status code.
    pub fn backend<B: Into<String>, S: Into<String>>(backend: B, status: u16, msg: S) -> Self {
        BenchError::Backend {
            backend: backend.into(),
            status,
            message: msg.into(),
        }
    }

    /// Create a new decode error.
    pub fn decode<B: Into<String>, S: Into<String>>(backend: B, msg: S) -> Self {
        BenchError::Decode {
            backend: backend.into(),
            message: msg.into(),
        }
    }

    /// Create a new training error.
    pub fn training<B: Into<String>, S: Into<String>>(backend: B, msg: S) -> Self {
        BenchError::Training {
            backend: backend.into(),
            message: msg.into(),
        }
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        BenchError::Other(msg.into())
    }

    /// Whether the error is a transient decode failure that adapters may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, BenchError::Decode { .. })
    }

    /// Whether the error was raised during pre-flight validation.
    pub fn is_config(&self) -> bool {
        matches!(self, BenchError::Config { .. } | BenchError::Dataset(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = BenchError::config("metrics", "unknown metric 'f1'");
        assert_eq!(
            error.to_string(),
            "Invalid configuration for 'metrics': unknown metric 'f1'"
        );

        let error = BenchError::backend("apiai", 401, "unauthorized");
        assert_eq!(error.to_string(), "Backend error [apiai/401]: unauthorized");

        let error = BenchError::dataset("criterion smalltalk_en of language en does not exist");
        assert!(error.to_string().starts_with("Dataset error:"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(BenchError::decode("luis", "expected value").is_transient());
        assert!(!BenchError::backend("luis", 500, "boom").is_transient());
        assert!(!BenchError::config("api", "unknown").is_transient());
    }

    #[test]
    fn test_config_classification() {
        assert!(BenchError::config("reduction_mode", "median").is_config());
        assert!(BenchError::dataset("missing").is_config());
        assert!(!BenchError::training("luis", "failed").is_config());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let bench_error = BenchError::from(io_error);

        match bench_error {
            BenchError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
