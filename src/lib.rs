//! vault-sync - keep a note vault in a remote git repository
//!
//! A thin orchestration layer over libgit2: it decides which git operations
//! to run, in which order, with which credentials, and how to explain their
//! failures to the user.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Front end (CLI / panels)                    │
//! │   StatusPanel · SettingsPanel · Notifier                        │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                │ actions
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Sync Orchestrator                        │
//! │  init · clone · commit-all · push · pull · test-connection      │
//! │  ┌───────────────┐  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │ Settings      │  │ Transport    │  │ Error Classifier     │  │
//! │  │ Store         │  │ Resolver     │  │ (network/auth/404)   │  │
//! │  └───────────────┘  └──────────────┘  └──────────────────────┘  │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                │ Engine trait
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Git Backend (libgit2)                        │
//! │  status matrix · index · commits · fetch/merge · push           │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            Vault directory  (notes + .git metadata)             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod classify;
pub mod error;
pub mod git;
pub mod messages;
pub mod notice;
pub mod settings;
pub mod sync;
pub mod transport;
pub mod validation;
pub mod view;

pub use classify::ErrorCategory;
pub use error::{Error, Result};
pub use messages::Language;
pub use settings::{SettingField, SettingsStore, SyncConfiguration};
pub use sync::Vault;

use serde::Serialize;

/// The user-facing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Init,
    Clone,
    Commit,
    Push,
    Pull,
    TestConnection,
}

impl Operation {
    /// Name used in failure notices
    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Operation::Init, Language::En) => "Init",
            (Operation::Clone, Language::En) => "Clone",
            (Operation::Commit, Language::En) => "Commit",
            (Operation::Push, Language::En) => "Push",
            (Operation::Pull, Language::En) => "Pull",
            (Operation::TestConnection, Language::En) => "Connection test",
            (Operation::Init, Language::Tr) => "Başlatma",
            (Operation::Clone, Language::Tr) => "Klonlama",
            (Operation::Commit, Language::Tr) => "Commit",
            (Operation::Push, Language::Tr) => "Push",
            (Operation::Pull, Language::Tr) => "Pull",
            (Operation::TestConnection, Language::Tr) => "Bağlantı testi",
        }
    }
}

/// Result of a sync operation, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    pub operation: Operation,
    pub success: bool,
    pub message: String,
    pub error_category: ErrorCategory,
    /// Abbreviated id of the commit created, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl OperationOutcome {
    pub fn success(
        operation: Operation,
        message: impl Into<String>,
        commit: Option<String>,
    ) -> Self {
        Self {
            operation,
            success: true,
            message: message.into(),
            error_category: ErrorCategory::None,
            commit,
        }
    }

    pub fn failure(
        operation: Operation,
        message: impl Into<String>,
        category: ErrorCategory,
    ) -> Self {
        Self {
            operation,
            success: false,
            message: message.into(),
            error_category: category,
            commit: None,
        }
    }
}
