//! Input validation for vault-sync
//!
//! Checks the configuration a remote operation depends on before any
//! network call is made.

use crate::settings::SyncConfiguration;
use thiserror::Error;

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("'{0}' cannot be empty")]
    Empty(&'static str),

    #[error("Invalid branch name '{0}': {1}")]
    InvalidBranch(String, &'static str),

    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, &'static str),
}

/// Maximum length for branch names
pub const MAX_BRANCH_LENGTH: usize = 255;

/// Characters git refuses inside a ref name
const FORBIDDEN_REF_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\', ' '];

/// Validate everything a remote operation needs
///
/// Rules:
/// - Remote URL and access token must both be non-empty
/// - Remote URL and proxy URL must be well formed
/// - Branch name must be a legal git ref name
pub fn validate_remote(config: &SyncConfiguration) -> Result<(), ValidationError> {
    if config.remote_url.trim().is_empty() {
        return Err(ValidationError::Empty("remote_url"));
    }
    if config.access_token.trim().is_empty() {
        return Err(ValidationError::Empty("access_token"));
    }

    validate_remote_url(&config.remote_url)?;
    if !config.cors_proxy_url.is_empty() {
        validate_proxy_url(&config.cors_proxy_url)?;
    }
    validate_branch_name(config.branch())
}

/// Validate a remote repository URL
pub fn validate_remote_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::Empty("remote_url"));
    }

    if url.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidUrl(
            url.to_string(),
            "contains whitespace",
        ));
    }

    Ok(())
}

/// Validate a CORS relay prefix
///
/// The relay is an HTTP intermediary, so only http(s) URLs make sense.
pub fn validate_proxy_url(url: &str) -> Result<(), ValidationError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::InvalidUrl(
            url.to_string(),
            "proxy must start with http:// or https://",
        ));
    }

    if url.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidUrl(
            url.to_string(),
            "contains whitespace",
        ));
    }

    Ok(())
}

/// Validate a branch name
///
/// Follows the subset of `git check-ref-format` rules that matter for a
/// single branch component or path.
pub fn validate_branch_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty("branch_name"));
    }

    if name.len() > MAX_BRANCH_LENGTH {
        return Err(ValidationError::InvalidBranch(
            name.to_string(),
            "exceeds maximum length",
        ));
    }

    if name == "@" || name.contains("@{") {
        return Err(ValidationError::InvalidBranch(
            name.to_string(),
            "cannot contain '@{' or be '@'",
        ));
    }

    if name.contains("..") || name.contains("//") {
        return Err(ValidationError::InvalidBranch(
            name.to_string(),
            "cannot contain '..' or '//'",
        ));
    }

    if name.starts_with('-') || name.starts_with('/') || name.starts_with('.') {
        return Err(ValidationError::InvalidBranch(
            name.to_string(),
            "cannot start with '-', '/' or '.'",
        ));
    }

    if name.ends_with('/') || name.ends_with('.') || name.ends_with(".lock") {
        return Err(ValidationError::InvalidBranch(
            name.to_string(),
            "cannot end with '/', '.' or '.lock'",
        ));
    }

    if name
        .chars()
        .any(|c| c.is_control() || FORBIDDEN_REF_CHARS.contains(&c))
    {
        return Err(ValidationError::InvalidBranch(
            name.to_string(),
            "contains characters git does not allow in ref names",
        ));
    }

    Ok(())
}
