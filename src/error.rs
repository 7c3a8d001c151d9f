//! Error types for vault-sync
//!
//! Provides structured error types with context for better debugging
//! and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for vault-sync operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    #[error("Setting '{field}' must be filled in before this operation")]
    MissingSetting { field: &'static str },

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidSetting {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Unknown setting '{name}'")]
    UnknownSetting { name: String },

    // ==========================================================================
    // Transport Errors
    // ==========================================================================
    /// An HTTP failure with a known status code, for engines that talk HTTP
    /// themselves. libgit2 reports these as `Git` errors whose message is
    /// parsed by `classify`.
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    // ==========================================================================
    // Git Errors
    // ==========================================================================
    #[error("Git operation failed: {message}")]
    GitError {
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    #[error("Push was rejected: {}", errors.join(", "))]
    PushRejected { errors: Vec<String> },

    #[error("Merge produced conflicts in: {}", paths.join(", "))]
    MergeConflict { paths: Vec<String> },

    #[error("Branch '{branch}' does not exist on the remote")]
    RemoteBranchNotFound { branch: String },

    // ==========================================================================
    // IO Errors
    // ==========================================================================
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==========================================================================
    // Serialization Errors
    // ==========================================================================
    #[error("Failed to parse YAML: {message}")]
    YamlParseError { message: String },

    #[error("Failed to serialize to YAML: {message}")]
    YamlSerializeError { message: String },

    #[error("Failed to serialize JSON: {message}")]
    JsonError { message: String },

    // ==========================================================================
    // Catch-all
    // ==========================================================================
    #[error("{0}")]
    Other(String),
}

/// Result type alias for vault-sync operations
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::GitError {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::YamlParseError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Other(format!("background task failed: {}", err))
    }
}

impl From<crate::validation::ValidationError> for Error {
    fn from(err: crate::validation::ValidationError) -> Self {
        match err {
            crate::validation::ValidationError::Empty(field) => Error::MissingSetting { field },
            crate::validation::ValidationError::InvalidBranch(value, reason) => {
                Error::InvalidSetting {
                    field: "branch name",
                    value,
                    reason,
                }
            }
            crate::validation::ValidationError::InvalidUrl(value, reason) => {
                Error::InvalidSetting {
                    field: "remote URL",
                    value,
                    reason,
                }
            }
        }
    }
}

// =============================================================================
// Error Inspection Helpers
// =============================================================================

impl Error {
    /// The underlying libgit2 error, if any
    pub fn git_source(&self) -> Option<&git2::Error> {
        match self {
            Error::GitError { source, .. } => source.as_ref(),
            _ => None,
        }
    }

    /// Returns true if the error was raised before any engine call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingSetting { .. }
                | Error::InvalidSetting { .. }
                | Error::UnknownSetting { .. }
        )
    }

    /// Returns a user-friendly suggestion for fixing the error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::MissingSetting { .. } => {
                Some("Set it with: vault-sync config set <field> <value>")
            }
            Error::UnknownSetting { .. } => Some("Run 'vault-sync config show' to list the fields"),
            Error::MergeConflict { .. } => {
                Some("Resolve the conflicts with a git client, then commit and push again")
            }
            Error::PushRejected { .. } => Some("Pull the latest changes first, then push again"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingSetting { field: "remote_url" };
        assert_eq!(
            err.to_string(),
            "Setting 'remote_url' must be filled in before this operation"
        );
    }

    #[test]
    fn test_push_rejected_joins_errors() {
        let err = Error::PushRejected {
            errors: vec!["ref rejected".into(), "hook declined".into()],
        };
        assert_eq!(err.to_string(), "Push was rejected: ref rejected, hook declined");
    }

    #[test]
    fn test_error_suggestion() {
        let err = Error::MissingSetting { field: "access_token" };
        assert!(err.suggestion().is_some());
        assert!(err.is_validation());
        assert!(!Error::Other("boom".into()).is_validation());
    }
}
