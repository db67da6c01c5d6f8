use thiserror::Error;

use liveref_engine::ScanError;

/// A failed leak or footprint assertion.
#[derive(Debug, Error)]
pub enum AssertError {
    /// The object is still strongly reachable. `paths` lists how.
    #[error("{message}:\n{paths}")]
    NotReleased { message: String, paths: String },

    /// The reachable set is larger than allowed.
    #[error("{message}: leak {excess} bytes over limit of {limit} bytes{breakdown}")]
    SizeExceeded {
        message: String,
        total: usize,
        limit: usize,
        excess: usize,
        breakdown: String,
    },

    /// The scan itself could not run.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Convenience type alias for assertion helpers.
pub type Result<T> = std::result::Result<T, AssertError>;
