//! Error types for the cadence-store crate.
//!
//! Every storage failure is surfaced to the caller. A record that cannot be
//! read or decoded is an error, never an empty campaign, because silently
//! starting from fresh counters would reset the caps.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Top-level store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O operation failed (file read/write/rename).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Store location validation failed.
    #[error("Store validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The store refused to create records for another campaign.
    #[error("Store capacity exceeded: {len}/{capacity} campaigns")]
    CapacityExceeded { len: usize, capacity: usize },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Record encoding and decoding errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// A record could not be encoded.
    #[error("JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// A stored record could not be decoded.
    #[error("Corrupted record {}: {source}", path.display())]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Store directory validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Path contains a `..` component.
    #[error("Store path cannot contain '..' components: {0}")]
    ParentDir(String),

    /// Path is relative.
    #[error("Store path must be absolute: {0}")]
    NotAbsolute(String),

    /// Path points into a protected system directory.
    #[error("Store path cannot be in system directory {prefix}: {path}")]
    SystemDirectory { prefix: String, path: String },

    /// Path exists but is not a directory.
    #[error("Store path is not a directory: {0}")]
    NotDirectory(String),
}

/// Specialized `Result` type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }

    #[test]
    fn test_error_chain() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let store_err = StoreError::from(io_err);

        assert!(matches!(store_err, StoreError::Io(_)));
        assert!(store_err.to_string().contains("access denied"));
    }

    #[test]
    fn test_corrupted_names_file() {
        let source = serde_json::from_str::<u32>("{").unwrap_err();
        let err = StoreError::from(SerializationError::Corrupted {
            path: PathBuf::from("/srv/cadence/q3_state.json"),
            source,
        });
        assert!(err.to_string().contains("q3_state.json"));
    }
}
