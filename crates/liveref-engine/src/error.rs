//! Error types for scan invocations.
//!
//! Nothing read from the live graph produces an error; these cover only
//! arguments rejected before traversal starts.

use thiserror::Error;

/// Errors that can occur when starting a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// An argument or configuration value is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Scan configuration text could not be parsed.
    #[error("config parse error: {0}")]
    Config(String),
}

/// Convenience type alias for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;
