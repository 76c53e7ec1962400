//! This module defines the error types for phonescout.
//!
//! # Rust vs .NET Error Handling
//!
//! .NET code would typically let an `IOException` bubble out of a worker task and
//! surface as an `AggregateException` once the parallel loop joins:
//! ```csharp
//! try {
//!     Parallel.ForEach(blocks, block => Extract(block));
//! } catch (AggregateException ex) {
//!     // Which block failed? Only the inner exceptions know.
//! }
//! ```
//!
//! Here every fallible step returns a `Result`, and a failure inside a worker
//! carries the position of the block that produced it:
//! ```rust,ignore
//! match extract(&config) {
//!     Ok(output) => // Write output.numbers,
//!     Err(ExtractError::BlockFailed { sequence, offset, .. }) => // Report the block,
//!     Err(e) => // Everything else is fatal too
//! }
//! ```
//!
//! Decoding problems never show up here: invalid UTF-8 is replaced while
//! reading and only counted in the pipeline metrics.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that can occur while extracting phone numbers
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Block {sequence} at byte offset {offset} failed: {message}")]
    BlockFailed {
        sequence: u64,
        offset: u64,
        message: String,
    },
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
    #[error("Failed to write output to {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ExtractError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn block_failed(sequence: u64, offset: u64, message: impl Into<String>) -> Self {
        Self::BlockFailed {
            sequence,
            offset,
            message: message.into(),
        }
    }

    pub fn worker_pool(msg: impl Into<String>) -> Self {
        Self::WorkerPool(msg.into())
    }

    pub fn output_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputWrite {
            path: path.into(),
            source,
        }
    }

    /// Maps an error from opening `path` onto the matching variant.
    pub fn from_open(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}

impl From<config::ConfigError> for ExtractError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
