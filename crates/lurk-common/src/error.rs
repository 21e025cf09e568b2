//! Error types shared by the Lurk crates.

use thiserror::Error;

/// Top-level error type for Lurk operations outside the AI core.
#[derive(Debug, Error)]
pub enum LurkError {
    /// Scenario or archetype configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scenario file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Result type alias for Lurk operations.
pub type LurkResult<T> = Result<T, LurkError>;
