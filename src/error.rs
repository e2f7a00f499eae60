//! Error handling for pcb-offset
//!
//! Application flow uses anyhow for context-rich propagation, while the
//! engine reports its recoverable failures through [`OffsetError`].

use anyhow::Context;
use std::path::Path;

pub type Result<T> = anyhow::Result<T>;

/// Extension trait for Results to add context with file paths
pub trait ResultExt<T> {
    /// Add context with file path information
    fn with_path_context<P: AsRef<Path>>(self, operation: &str, path: P) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error> + Send + Sync + 'static,
{
    fn with_path_context<P: AsRef<Path>>(self, operation: &str, path: P) -> Result<T> {
        self.map_err(|e| e.into())
            .with_context(|| format!("Failed to {} file: {}", operation, path.as_ref().display()))
    }
}

/// Specific error types for offset operations
#[derive(Debug, thiserror::Error)]
pub enum OffsetError {
    #[error("No candidate character encoding decoded the input")]
    DecodeFailure,

    #[error("Invalid format header: {reason}")]
    FormatSniffFailure { reason: String },

    #[error("Line {line}: {reason}")]
    LineParseFailure { line: usize, reason: String },

    #[error("I/O failure on {path}: {reason}")]
    FileIoFailure { path: String, reason: String },

    #[error("No Gerber or drill files found in {path}")]
    NoInputFiles { path: String },

    #[error("Unsupported unit: {unit} (expected MM or IN)")]
    InvalidUnit { unit: String },
}
