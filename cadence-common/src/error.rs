//! Validation errors for the shared data model.

use thiserror::Error;

/// Rejections produced when parsing a campaign identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CampaignIdError {
    /// The identifier was empty.
    #[error("Campaign id cannot be empty")]
    Empty,

    /// The identifier exceeded the maximum length.
    #[error("Campaign id is {len} characters long, the maximum is {max}")]
    TooLong { len: usize, max: usize },

    /// The identifier contained a character outside `[A-Za-z0-9._-]`.
    #[error("Campaign id contains invalid character {0:?}")]
    InvalidCharacter(char),

    /// The identifier starts with `.` or contains `..`.
    #[error("Campaign id cannot start with '.' or contain '..': {0}")]
    Traversal(String),
}

/// Rejections produced when validating a configuration update.
///
/// An update that fails validation is never partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A cap or delay was negative.
    #[error("{field} cannot be negative (got {value})")]
    Negative { field: String, value: i64 },

    /// A cap or delay does not fit the counter width.
    #[error("{field} is too large (got {value}, maximum is {max})")]
    OutOfRange { field: String, value: i64, max: u32 },
}
