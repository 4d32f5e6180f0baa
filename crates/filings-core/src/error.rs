//! Error types for filing operations.
//!
//! This module defines [`FilingsError`] which covers all error cases that can occur
//! when resolving, fetching, inspecting, or renaming filing bundles.

use thiserror::Error;

/// Errors that can occur during filing operations.
#[derive(Error, Debug)]
pub enum FilingsError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by the archive.
    #[error("Rate limited by {archive}: retry after {retry_after:?}")]
    RateLimited {
        /// The archive that rate limited the request.
        archive: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested symbol or identifier was not found.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// A requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error parsing data returned by the archive or read from disk.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The run cannot proceed (misconfiguration, archive unreachable at startup).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl FilingsError {
    /// Returns true if this error must abort the whole run.
    ///
    /// Everything else is an expected per-item failure that gets recorded
    /// while the remaining roster is processed.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<std::io::Error> for FilingsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Result type alias using [`FilingsError`].
pub type Result<T> = std::result::Result<T, FilingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(FilingsError::Configuration("archive unreachable".into()).is_fatal());
        assert!(!FilingsError::Network("timeout".into()).is_fatal());
        assert!(!FilingsError::SymbolNotFound("XYZ".into()).is_fatal());
        assert!(!FilingsError::Io("permission denied".into()).is_fatal());
    }

    #[test]
    fn test_io_conversion() {
        let err: FilingsError = std::io::Error::other("disk full").into();
        assert!(matches!(err, FilingsError::Io(ref msg) if msg.contains("disk full")));
    }
}
