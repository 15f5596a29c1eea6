//! Error types for mirrorq
//!
//! Defines crate-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for the mirrorq crate
#[derive(Error, Debug)]
pub enum Error {
    /// Logical queue index outside the valid range
    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    /// Structurally impossible request (e.g. move on an empty queue)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Incremental insert precondition violated (reference not in mirror)
    ///
    /// Internal signal: the synchronizer converts this into a rebuild,
    /// it never reaches the application.
    #[error("Cannot insert incrementally: {0}")]
    CannotInsertIncrementally(String),

    /// Item conversion to an engine source failed
    #[error("Unsupported item: {0}")]
    UnsupportedItem(String),

    /// Mirror future-list disagrees with the logical queue at or after the cursor
    #[error("Engine desync detected: {0}")]
    EngineDesyncDetected(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using mirrorq Error
pub type Result<T> = std::result::Result<T, Error>;
