//! Error types for the development tools.

use std::path::PathBuf;

use starhold_core::error::GameError;
use thiserror::Error;

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors raised by the tools before or around the core.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Error from the economy core.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Path given for a data directory is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Command-line value outside its valid range.
    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument {
        /// Argument name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Failed to serialize JSON output.
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}
