//! Settings store for vault-sync
//!
//! The configuration is a flat YAML record. Missing or unknown keys fall
//! back to defaults, so files written by older versions keep loading.
//!
//! Settings live outside the vault by default
//! (`<config dir>/vault-sync/settings.yaml`) so the access token never ends
//! up in a commit.

use crate::error::{Error, Result};
use crate::git::Author;
use crate::messages::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Branch used when the configured one is blank
pub const DEFAULT_BRANCH: &str = "main";

/// Commit message used when the configured template is blank
pub const DEFAULT_COMMIT_TEMPLATE: &str = "Vault updated - {date} {time}";

/// User-provided synchronization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfiguration {
    pub remote_url: String,
    pub access_token: String,
    pub branch_name: String,
    pub commit_message_template: String,
    pub author_name: String,
    pub author_email: String,
    pub cors_proxy_url: String,
    pub first_run_warning_shown: bool,
    pub language: Language,
}

impl Default for SyncConfiguration {
    fn default() -> Self {
        Self {
            remote_url: String::new(),
            access_token: String::new(),
            branch_name: DEFAULT_BRANCH.to_string(),
            commit_message_template: DEFAULT_COMMIT_TEMPLATE.to_string(),
            author_name: "Vault Sync".to_string(),
            author_email: "vault-sync@example.com".to_string(),
            cors_proxy_url: String::new(),
            first_run_warning_shown: false,
            language: Language::default(),
        }
    }
}

impl SyncConfiguration {
    /// The branch to operate on, never blank
    pub fn branch(&self) -> &str {
        let branch = self.branch_name.trim();
        if branch.is_empty() {
            DEFAULT_BRANCH
        } else {
            branch
        }
    }

    /// The commit message template, never blank
    pub fn commit_template(&self) -> &str {
        if self.commit_message_template.trim().is_empty() {
            DEFAULT_COMMIT_TEMPLATE
        } else {
            &self.commit_message_template
        }
    }

    /// Author identity used for commits and merge commits
    pub fn author(&self) -> Author {
        Author {
            name: self.author_name.clone(),
            email: self.author_email.clone(),
        }
    }

    /// Apply a single field edit, normalizing the value the way the
    /// settings form does
    pub fn apply(&mut self, field: SettingField, value: &str) -> Result<()> {
        match field {
            SettingField::RemoteUrl => self.remote_url = value.trim().to_string(),
            SettingField::AccessToken => self.access_token = value.trim().to_string(),
            SettingField::CorsProxyUrl => self.cors_proxy_url = value.trim().to_string(),
            SettingField::BranchName => {
                let branch = value.trim();
                self.branch_name = if branch.is_empty() {
                    DEFAULT_BRANCH.to_string()
                } else {
                    branch.to_string()
                };
            }
            SettingField::CommitMessageTemplate => {
                self.commit_message_template = if value.is_empty() {
                    DEFAULT_COMMIT_TEMPLATE.to_string()
                } else {
                    value.to_string()
                };
            }
            SettingField::AuthorName => self.author_name = value.trim().to_string(),
            SettingField::AuthorEmail => self.author_email = value.trim().to_string(),
            SettingField::FirstRunWarningShown => {
                self.first_run_warning_shown =
                    value.trim().parse().map_err(|_| Error::InvalidSetting {
                        field: "first_run_warning_shown",
                        value: value.to_string(),
                        reason: "expected 'true' or 'false'",
                    })?;
            }
            SettingField::Language => {
                self.language = value.trim().parse().map_err(|_| Error::InvalidSetting {
                    field: "language",
                    value: value.to_string(),
                    reason: "expected 'en' or 'tr'",
                })?;
            }
        }
        Ok(())
    }

    /// Current value of a field as shown to the user
    pub fn value_of(&self, field: SettingField) -> String {
        match field {
            SettingField::RemoteUrl => self.remote_url.clone(),
            SettingField::AccessToken => self.access_token.clone(),
            SettingField::BranchName => self.branch_name.clone(),
            SettingField::CommitMessageTemplate => self.commit_message_template.clone(),
            SettingField::AuthorName => self.author_name.clone(),
            SettingField::AuthorEmail => self.author_email.clone(),
            SettingField::CorsProxyUrl => self.cors_proxy_url.clone(),
            SettingField::FirstRunWarningShown => self.first_run_warning_shown.to_string(),
            SettingField::Language => self.language.to_string(),
        }
    }
}

/// An editable settings field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    RemoteUrl,
    AccessToken,
    BranchName,
    CommitMessageTemplate,
    AuthorName,
    AuthorEmail,
    CorsProxyUrl,
    FirstRunWarningShown,
    Language,
}

impl SettingField {
    /// All fields, in settings-form order
    pub const ALL: [SettingField; 9] = [
        SettingField::RemoteUrl,
        SettingField::AccessToken,
        SettingField::CorsProxyUrl,
        SettingField::BranchName,
        SettingField::CommitMessageTemplate,
        SettingField::AuthorName,
        SettingField::AuthorEmail,
        SettingField::Language,
        SettingField::FirstRunWarningShown,
    ];

    /// Key used in the settings file and on the command line
    pub fn key(self) -> &'static str {
        match self {
            SettingField::RemoteUrl => "remote_url",
            SettingField::AccessToken => "access_token",
            SettingField::BranchName => "branch_name",
            SettingField::CommitMessageTemplate => "commit_message_template",
            SettingField::AuthorName => "author_name",
            SettingField::AuthorEmail => "author_email",
            SettingField::CorsProxyUrl => "cors_proxy_url",
            SettingField::FirstRunWarningShown => "first_run_warning_shown",
            SettingField::Language => "language",
        }
    }

    /// Whether the value must be masked when displayed
    pub fn is_secret(self) -> bool {
        matches!(self, SettingField::AccessToken)
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SettingField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        SettingField::ALL
            .into_iter()
            .find(|field| field.key() == normalized)
            .ok_or_else(|| Error::UnknownSetting { name: s.to_string() })
    }
}

/// File-backed settings store
///
/// Every read goes to disk, so each operation sees the latest saved values.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The platform default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vault-sync").join("settings.yaml"))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings merged over the defaults
    pub fn load(&self) -> Result<SyncConfiguration> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "settings file missing, using defaults");
            return Ok(SyncConfiguration::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            Error::FileReadError {
                path: self.path.clone(),
                source,
            }
        })?;

        if content.trim().is_empty() {
            return Ok(SyncConfiguration::default());
        }

        Ok(serde_yaml::from_str(&content)?)
    }

    /// Persist the full configuration
    pub fn save(&self, config: &SyncConfiguration) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::FileWriteError {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_yaml::to_string(config).map_err(|e| Error::YamlSerializeError {
            message: e.to_string(),
        })?;

        std::fs::write(&self.path, content).map_err(|source| Error::FileWriteError {
            path: self.path.clone(),
            source,
        })?;

        Ok(())
    }

    /// Edit one field and save immediately
    pub fn set(&self, field: SettingField, value: &str) -> Result<SyncConfiguration> {
        let mut config = self.load()?;
        config.apply(field, value)?;
        self.save(&config)?;
        tracing::info!(field = %field, "setting updated");
        Ok(config)
    }
}
