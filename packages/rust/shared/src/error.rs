//! Error types for Rolodex.
//!
//! Library crates use [`RolodexError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Rolodex operations.
#[derive(Debug, thiserror::Error)]
pub enum RolodexError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to a collaborator.
    #[error("network error: {0}")]
    Network(String),

    /// The enrichment source could not serve a request.
    #[error("enrichment source unavailable: {0}")]
    SourceUnavailable(String),

    /// Writing back to the system of record failed.
    #[error("record write failure for account {account}: {message}")]
    RecordWriteFailure { account: String, message: String },

    /// A candidate contact is missing a field required for write-back.
    #[error("malformed candidate: {message}")]
    MalformedCandidate { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad thresholds, bad URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Response or file parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RolodexError>;

impl RolodexError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a malformed-candidate error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedCandidate {
            message: msg.into(),
        }
    }

    /// Create a write-back failure for the named account.
    pub fn record_write(account: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::RecordWriteFailure {
            account: account.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = RolodexError::config("missing partner key");
        assert_eq!(err.to_string(), "config error: missing partner key");

        let err = RolodexError::validation("hard_cap must be positive");
        assert!(err.to_string().contains("hard_cap"));
    }

    #[test]
    fn record_write_names_account() {
        let err = RolodexError::record_write("Acme", "bulk insert rejected");
        assert_eq!(
            err.to_string(),
            "record write failure for account Acme: bulk insert rejected"
        );
    }
}
