//! Error types for governor operations.

use cadence_common::ConfigError;
use cadence_store::StoreError;
use thiserror::Error;

/// Top-level governor error type.
///
/// The governor has no failure modes of its own beyond storage and input
/// validation. Storage errors are never swallowed: a campaign whose records
/// cannot be read is not treated as a fresh campaign.
#[derive(Debug, Error)]
pub enum GovernorError {
    /// Reading or writing a campaign record failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A configuration update was rejected.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An event kind outside the known set was supplied.
    #[error("Unknown event kind: {0:?}")]
    UnknownEvent(String),
}

/// Specialized `Result` type for governor operations.
pub type Result<T> = std::result::Result<T, GovernorError>;

impl GovernorError {
    /// Returns `true` if the caller supplied invalid input.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::Config(_) | Self::UnknownEvent(_))
    }
}
