//! Declarative view descriptions
//!
//! Panels are plain data: the orchestrator decides what to show, and the
//! front end only renders it.

use crate::git::METADATA_DIR;
use crate::messages::{Language, Message};
use crate::settings::{SettingField, SyncConfiguration};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Whether the working directory holds repository metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoPresence {
    Present,
    Absent,
}

/// Check for repository metadata in `dir`
///
/// Advisory only: the answer can be stale by the time an action runs.
pub fn detect_presence(dir: &Path) -> RepoPresence {
    match std::fs::metadata(dir.join(METADATA_DIR)) {
        Ok(_) => RepoPresence::Present,
        Err(_) => RepoPresence::Absent,
    }
}

/// A user action offered by the status panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Clone,
    Initialize,
    Commit,
    Push,
    Pull,
}

impl Action {
    /// Command-line spelling of the action
    pub fn command(self) -> &'static str {
        match self {
            Action::Clone => "clone",
            Action::Initialize => "init",
            Action::Commit => "commit",
            Action::Push => "push",
            Action::Pull => "pull",
        }
    }

    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Action::Clone, Language::En) => "Clone remote repository",
            (Action::Initialize, Language::En) => "Initialize new local repository",
            (Action::Commit, Language::En) => "Commit changes",
            (Action::Push, Language::En) => "Push",
            (Action::Pull, Language::En) => "Pull",
            (Action::Clone, Language::Tr) => "Uzak Depoyu Klonla",
            (Action::Initialize, Language::Tr) => "Yeni Yerel Depo Başlat",
            (Action::Commit, Language::Tr) => "Değişiklikleri Kaydet (Commit)",
            (Action::Push, Language::Tr) => "Gönder (Push)",
            (Action::Pull, Language::Tr) => "Çek (Pull)",
        }
    }
}

/// The two mutually exclusive action sets
pub fn available_actions(presence: RepoPresence) -> &'static [Action] {
    match presence {
        RepoPresence::Absent => &[Action::Clone, Action::Initialize],
        RepoPresence::Present => &[Action::Commit, Action::Push, Action::Pull],
    }
}

/// Repository status and the actions that apply to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPanel {
    pub presence: RepoPresence,
    pub description: String,
    pub actions: Vec<Action>,
}

impl StatusPanel {
    pub fn detect(dir: &Path, lang: Language) -> Self {
        Self::for_presence(detect_presence(dir), lang)
    }

    pub fn for_presence(presence: RepoPresence, lang: Language) -> Self {
        let description = match presence {
            RepoPresence::Present => Message::RepositoryPresent.render(lang),
            RepoPresence::Absent => Message::RepositoryAbsent.render(lang),
        };

        Self {
            presence,
            description,
            actions: available_actions(presence).to_vec(),
        }
    }

    pub fn render(&self, lang: Language) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.description);
        for action in &self.actions {
            let _ = writeln!(out, "  {:<8} {}", action.command(), action.label(lang));
        }
        out
    }
}

/// One row of the settings panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub value: String,
}

/// Every editable setting with its current value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsPanel {
    pub fields: Vec<FieldView>,
}

impl SettingsPanel {
    pub fn new(config: &SyncConfiguration) -> Self {
        let fields = SettingField::ALL
            .into_iter()
            .map(|field| {
                let (label, description) = field_text(field);
                let raw = config.value_of(field);
                let value = if field.is_secret() && !raw.is_empty() {
                    mask(&raw)
                } else {
                    raw
                };
                FieldView {
                    key: field.key(),
                    label,
                    description,
                    value,
                }
            })
            .collect();

        Self { fields }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for field in &self.fields {
            let value = if field.value.is_empty() {
                "(not set)"
            } else {
                field.value.as_str()
            };
            let _ = writeln!(out, "{} [{}]: {}", field.label, field.key, value);
            let _ = writeln!(out, "    {}", field.description);
        }
        out
    }
}

/// Hide a secret, keeping the last four characters for recognition
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(8);
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(8), tail)
}

fn field_text(field: SettingField) -> (&'static str, &'static str) {
    match field {
        SettingField::RemoteUrl => (
            "Repository URL",
            "Full URL of the remote git repository your notes are backed up to.",
        ),
        SettingField::AccessToken => (
            "Access token",
            "Personal access token created on your git host (GitHub, GitLab, ...).",
        ),
        SettingField::CorsProxyUrl => (
            "CORS proxy",
            "Optional relay for environments that block cross-origin requests, e.g. https://cors.isomorphic-git.org",
        ),
        SettingField::BranchName => ("Branch", "Branch every operation works on."),
        SettingField::CommitMessageTemplate => (
            "Commit message",
            "Default commit message. {date} and {time} are replaced with the current date and time.",
        ),
        SettingField::AuthorName => ("Author name", "Name recorded on commits."),
        SettingField::AuthorEmail => ("Author email", "Email recorded on commits."),
        SettingField::Language => ("Language", "Language of notices: en or tr."),
        SettingField::FirstRunWarningShown => (
            "Backup warning shown",
            "Set to false to see the first-run backup warning again.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_presence_follows_metadata_dir() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(detect_presence(tmp.path()), RepoPresence::Absent);

        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        assert_eq!(detect_presence(tmp.path()), RepoPresence::Present);
    }

    #[test]
    fn test_action_sets_are_exclusive() {
        let absent = available_actions(RepoPresence::Absent);
        let present = available_actions(RepoPresence::Present);
        assert_eq!(absent, &[Action::Clone, Action::Initialize]);
        assert_eq!(present, &[Action::Commit, Action::Push, Action::Pull]);
        assert!(absent.iter().all(|a| !present.contains(a)));
    }

    #[test]
    fn test_token_is_masked() {
        let config = SyncConfiguration {
            access_token: "ghp_abcdefghijklmnop".into(),
            ..Default::default()
        };
        let panel = SettingsPanel::new(&config);
        let token = panel.fields.iter().find(|f| f.key == "access_token").unwrap();
        assert_eq!(token.value, "********mnop");
        assert!(!panel.render().contains("ghp_"));
    }

    #[test]
    fn test_status_panel_render() {
        let panel = StatusPanel::for_presence(RepoPresence::Absent, Language::En);
        let text = panel.render(Language::En);
        assert!(text.contains("clone"));
        assert!(text.contains("init"));
        assert!(!text.contains("push"));
    }
}
