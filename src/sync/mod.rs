//! Sync orchestration for vault-sync
//!
//! Sequences engine calls into the user-facing operations and turns every
//! failure into an [`OperationOutcome`].
//!
//! # Operation Model
//!
//! 1. **Fresh settings**: each operation re-reads the settings store, so an
//!    edited token applies to the very next call.
//! 2. **Validation first**: remote operations check URL, token and branch
//!    before any engine call.
//! 3. **Contained failures**: nothing escapes an operation boundary; every
//!    error is classified, shown as a notice and returned as an outcome.
//! 4. **No transactions**: commit-and-push is two operations. A failed push
//!    leaves the commit in place.
//!
//! Operations are not serialized against each other. Running two at once
//! on the same vault is the caller's responsibility to avoid.

pub mod policy;

use crate::classify::{classify, ErrorCategory};
use crate::error::{Error, Result};
use crate::git::{CloneOptions, Engine, Git2Engine, StatusEntry};
use crate::messages::{Language, Message};
use crate::notice::{Notice, Notifier, TerminalNotifier};
use crate::settings::{SettingsStore, SyncConfiguration};
use crate::transport::ResolvedTransport;
use crate::validation::{validate_remote, ValidationError};
use crate::view::StatusPanel;
use crate::{Operation, OperationOutcome};
use policy::{DirectoryListing, PostCloneAction};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// History depth requested when cloning
pub const CLONE_DEPTH: u32 = 1;

/// A vault directory bound to its settings, engine and notice sink
pub struct Vault {
    root: PathBuf,
    settings: SettingsStore,
    engine: Arc<dyn Engine>,
    notifier: Arc<dyn Notifier>,
}

impl Vault {
    /// Create a vault handle with explicit collaborators
    pub fn new(
        root: impl Into<PathBuf>,
        settings: SettingsStore,
        engine: Arc<dyn Engine>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            root: root.into(),
            settings,
            engine,
            notifier,
        }
    }

    /// Open a vault using libgit2 and terminal notices
    pub fn open(root: impl Into<PathBuf>, settings: SettingsStore) -> Self {
        Self::new(
            root,
            settings,
            Arc::new(Git2Engine::new()),
            Arc::new(TerminalNotifier),
        )
    }

    /// Working directory being synchronized
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Show the backup warning once, then remember that it was shown
    pub fn check_first_run_warning(&self) -> Result<bool> {
        let mut config = self.settings.load()?;
        if config.first_run_warning_shown {
            return Ok(false);
        }

        let lang = config.language;
        let text = format!(
            "{}\n{}",
            Message::FirstRunTitle.render(lang),
            Message::FirstRunBody.render(lang)
        );
        self.notifier.notify(Notice::warning(text).persistent());

        config.first_run_warning_shown = true;
        self.settings.save(&config)?;
        Ok(true)
    }

    /// Repository status and the actions currently available
    pub fn status_panel(&self) -> StatusPanel {
        let lang = self.settings.load().map(|c| c.language).unwrap_or_default();
        StatusPanel::detect(&self.root, lang)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Create repository metadata in the vault
    pub async fn init(&self) -> OperationOutcome {
        let op = Operation::Init;
        let config = match self.prepare(op, false) {
            Ok(config) => config,
            Err(outcome) => return outcome,
        };

        self.progress(&config, Message::InitStarted);
        let dir = self.root.clone();
        let branch = config.branch().to_string();
        match self.blocking(move |engine| engine.init(&dir, &branch)).await {
            Ok(()) => self.succeed(op, &config, Message::InitSucceeded, None),
            Err(e) => self.fail(op, &config, &e),
        }
    }

    /// Clone the configured remote into the vault
    ///
    /// An empty remote gets the vault contents as an initial backup right
    /// away.
    pub async fn clone_remote(&self) -> OperationOutcome {
        let op = Operation::Clone;
        let config = match self.prepare(op, true) {
            Ok(config) => config,
            Err(outcome) => return outcome,
        };

        self.progress(&config, Message::CloneStarted);
        let dir = self.root.clone();
        let transport = ResolvedTransport::resolve(&config);
        let opts = CloneOptions {
            branch: config.branch().to_string(),
            depth: Some(CLONE_DEPTH),
        };
        let cloned = self
            .blocking(move |engine| engine.clone_into(&dir, &transport, &opts))
            .await;

        if let Err(e) = cloned {
            return self.fail(op, &config, &e);
        }
        let outcome = self.succeed(op, &config, Message::CloneSucceeded, None);

        let listing = match DirectoryListing::read(&self.root) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(error = %e, "could not list vault after clone");
                return outcome;
            }
        };

        if policy::after_clone(&listing) == PostCloneAction::InitialBackup {
            self.progress(&config, Message::EmptyCloneDetected);
            let message = Message::InitialBackupCommit.render(config.language);
            self.commit_all(Some(&message)).await;
            self.push().await;
        }

        outcome
    }

    /// Stage every dirty file and commit them together
    ///
    /// `message` overrides the configured template; placeholders are filled
    /// either way.
    pub async fn commit_all(&self, message: Option<&str>) -> OperationOutcome {
        let op = Operation::Commit;
        let config = match self.prepare(op, false) {
            Ok(config) => config,
            Err(outcome) => return outcome,
        };

        self.progress(&config, Message::CommitStarted);
        match self.try_commit_all(&config, message).await {
            Ok(None) => self.succeed(op, &config, Message::NothingToCommit, None),
            Ok(Some(id)) => {
                let short = policy::short_id(&id).to_string();
                self.succeed(
                    op,
                    &config,
                    Message::CommitSucceeded { short_id: &short },
                    Some(short.clone()),
                )
            }
            Err(e) => self.fail(op, &config, &e),
        }
    }

    /// Push the configured branch
    pub async fn push(&self) -> OperationOutcome {
        let op = Operation::Push;
        let config = match self.prepare(op, true) {
            Ok(config) => config,
            Err(outcome) => return outcome,
        };

        self.progress(&config, Message::PushStarted);
        match self.try_push(&config).await {
            Ok(()) => self.succeed(op, &config, Message::PushSucceeded, None),
            Err(e) => self.fail(op, &config, &e),
        }
    }

    /// Pull the configured branch, merging as the configured author
    pub async fn pull(&self) -> OperationOutcome {
        let op = Operation::Pull;
        let config = match self.prepare(op, true) {
            Ok(config) => config,
            Err(outcome) => return outcome,
        };

        self.progress(&config, Message::PullStarted);
        let dir = self.root.clone();
        let transport = ResolvedTransport::resolve(&config);
        let branch = config.branch().to_string();
        let author = config.author();
        let pulled = self
            .blocking(move |engine| engine.pull(&dir, &transport, &branch, &author))
            .await;

        match pulled {
            Ok(result) => {
                tracing::info!(?result, "pull finished");
                self.succeed(op, &config, Message::PullSucceeded, None)
            }
            Err(e) => self.fail(op, &config, &e),
        }
    }

    /// Commit everything, then push; the commit stays if the push fails
    pub async fn commit_and_push(&self) -> Vec<OperationOutcome> {
        let lang = self.settings.load().map(|c| c.language).unwrap_or_default();
        let message = Message::ManualCommitAndPush.render(lang);

        let committed = self.commit_all(Some(&message)).await;
        let pushed = self.push().await;
        vec![committed, pushed]
    }

    /// Check the remote with the configured token and report whether our
    /// branch exists there
    pub async fn test_connection(&self) -> OperationOutcome {
        let op = Operation::TestConnection;
        let config = match self.prepare(op, true) {
            Ok(config) => config,
            Err(outcome) => return outcome,
        };

        self.progress(&config, Message::TestingConnection);
        let transport = ResolvedTransport::resolve(&config);
        let branch = config.branch();
        let wanted = branch.to_string();
        let lookup = self
            .blocking(move |engine| engine.remote_has_branch(&transport, &wanted))
            .await;
        let found = match lookup {
            Ok(found) => found,
            Err(e) => return self.fail(op, &config, &e),
        };

        let text = Message::ConnectionSucceeded {
            branch,
            branch_found: found,
        }
        .render(config.language);

        if found {
            self.notifier.notify(Notice::success(text.clone()));
        } else {
            self.notifier.notify(Notice::warning(text.clone()));
        }
        OperationOutcome::success(op, text, None)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn try_commit_all(
        &self,
        config: &SyncConfiguration,
        message: Option<&str>,
    ) -> Result<Option<String>> {
        let dir = self.root.clone();
        let matrix = self.blocking(move |engine| engine.status_matrix(&dir)).await?;

        let dirty: Vec<StatusEntry> = policy::dirty_entries(&matrix);
        if dirty.is_empty() {
            return Ok(None);
        }
        tracing::debug!(files = dirty.len(), "staging changes");

        let template = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| config.commit_template());
        let now = chrono::Local::now();
        let message = policy::render_commit_message(template, &now, config.language);
        let author = config.author();
        let dir = self.root.clone();

        let id = self
            .blocking(move |engine| {
                for entry in &dirty {
                    if entry.is_removal() {
                        engine.remove(&dir, &entry.path)?;
                    } else {
                        engine.add(&dir, &entry.path)?;
                    }
                }
                engine.commit(&dir, &message, &author)
            })
            .await?;

        Ok(Some(id))
    }

    async fn try_push(&self, config: &SyncConfiguration) -> Result<()> {
        let dir = self.root.clone();
        let transport = ResolvedTransport::resolve(config);
        let branch = config.branch().to_string();
        let report = self
            .blocking(move |engine| engine.push(&dir, &transport, &branch))
            .await?;

        // A push the remote did not accept is a failure even though the
        // transport itself succeeded.
        if !report.ok {
            let errors = if report.errors.is_empty() {
                vec!["unknown error".to_string()]
            } else {
                report.errors
            };
            return Err(Error::PushRejected { errors });
        }

        Ok(())
    }

    /// Run an engine call off the async runtime
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Engine) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || f(engine.as_ref())).await?
    }

    /// Load fresh settings and, for remote operations, validate them
    fn prepare(
        &self,
        op: Operation,
        remote: bool,
    ) -> std::result::Result<SyncConfiguration, OperationOutcome> {
        let config = match self.settings.load() {
            Ok(config) => config,
            Err(e) => return Err(self.fail(op, &SyncConfiguration::default(), &e)),
        };

        if !remote {
            return Ok(config);
        }

        match validate_remote(&config) {
            Ok(()) => Ok(config),
            Err(ValidationError::Empty(field)) if field != "branch_name" => {
                tracing::warn!(operation = ?op, field, "missing remote settings");
                let text = Message::MissingCredentials.render(config.language);
                self.notifier.notify(Notice::warning(text.clone()));
                Err(OperationOutcome::failure(op, text, ErrorCategory::Validation))
            }
            Err(e) => Err(self.fail(op, &config, &Error::from(e))),
        }
    }

    fn progress(&self, config: &SyncConfiguration, message: Message<'_>) {
        let text = message.render(config.language);
        tracing::info!("{}", text);
        self.notifier.notify(Notice::progress(text));
    }

    fn succeed(
        &self,
        op: Operation,
        config: &SyncConfiguration,
        message: Message<'_>,
        commit: Option<String>,
    ) -> OperationOutcome {
        let text = message.render(config.language);
        tracing::info!(operation = ?op, "{}", text);
        self.notifier.notify(Notice::success(text.clone()));
        OperationOutcome::success(op, text, commit)
    }

    fn fail(&self, op: Operation, config: &SyncConfiguration, err: &Error) -> OperationOutcome {
        let lang: Language = config.language;
        let classified = classify(err, lang);
        tracing::error!(
            operation = ?op,
            category = ?classified.category,
            error = %err,
            "operation failed"
        );
        if let Some(hint) = err.suggestion() {
            tracing::info!(operation = ?op, "{}", hint);
        }

        let text = Message::Failed {
            operation: op.label(lang),
            detail: &classified.message,
        }
        .render(lang);
        self.notifier.notify(Notice::failure(text.clone()));
        OperationOutcome::failure(op, text, classified.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{
        Author, HeadState, PullResult, PushReport, StageState, WorkdirState,
    };
    use crate::notice::{NoticeDuration, NoticeLevel, RecordingNotifier};
    use crate::settings::SettingField;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Engine double that records every call
    #[derive(Default)]
    struct FakeEngine {
        calls: Mutex<Vec<String>>,
        matrix: Mutex<Vec<StatusEntry>>,
        push_report: Mutex<Option<PushReport>>,
        push_status: Mutex<Option<u16>>,
        heads: Vec<String>,
        clone_files: Vec<&'static str>,
    }

    impl FakeEngine {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn called(&self, prefix: &str) -> bool {
            self.calls().iter().any(|c| c.starts_with(prefix))
        }
    }

    impl Engine for FakeEngine {
        fn init(&self, dir: &Path, branch: &str) -> Result<()> {
            std::fs::create_dir_all(dir.join(".git"))?;
            self.record(format!("init:{}", branch));
            Ok(())
        }

        fn clone_into(
            &self,
            dir: &Path,
            _transport: &ResolvedTransport,
            opts: &CloneOptions,
        ) -> Result<()> {
            std::fs::create_dir_all(dir.join(".git"))?;
            for file in &self.clone_files {
                std::fs::write(dir.join(file), "content")?;
            }
            self.record(format!("clone:{}:{:?}", opts.branch, opts.depth));
            Ok(())
        }

        fn status_matrix(&self, _dir: &Path) -> Result<Vec<StatusEntry>> {
            self.record("status");
            Ok(self.matrix.lock().unwrap().clone())
        }

        fn add(&self, _dir: &Path, path: &str) -> Result<()> {
            self.record(format!("add:{}", path));
            Ok(())
        }

        fn remove(&self, _dir: &Path, path: &str) -> Result<()> {
            self.record(format!("remove:{}", path));
            Ok(())
        }

        fn commit(&self, _dir: &Path, message: &str, author: &Author) -> Result<String> {
            self.record(format!("commit:{}:{}", author.name, message));
            Ok("0123456789abcdef0123456789abcdef01234567".into())
        }

        fn push(
            &self,
            _dir: &Path,
            transport: &ResolvedTransport,
            branch: &str,
        ) -> Result<PushReport> {
            self.record(format!("push:{}:{}", transport.effective_url, branch));
            if let Some(status) = *self.push_status.lock().unwrap() {
                return Err(Error::Http {
                    status,
                    message: "request failed".into(),
                });
            }
            Ok(self
                .push_report
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(PushReport::accepted))
        }

        fn pull(
            &self,
            _dir: &Path,
            _transport: &ResolvedTransport,
            branch: &str,
            author: &Author,
        ) -> Result<PullResult> {
            self.record(format!("pull:{}:{}", branch, author.email));
            Ok(PullResult::FastForward)
        }

        fn remote_has_branch(
            &self,
            _transport: &ResolvedTransport,
            branch: &str,
        ) -> Result<bool> {
            self.record(format!("lookup:{}", branch));
            Ok(self.heads.iter().any(|head| head == branch))
        }
    }

    struct Fixture {
        _tmp: TempDir,
        vault: Vault,
        engine: Arc<FakeEngine>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture_with(engine: FakeEngine, configured: bool) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let store = SettingsStore::new(tmp.path().join("settings.yaml"));
        if configured {
            store
                .set(SettingField::RemoteUrl, "https://github.com/user/notes.git")
                .unwrap();
            store.set(SettingField::AccessToken, "ghp_token").unwrap();
        }

        let engine = Arc::new(engine);
        let notifier = Arc::new(RecordingNotifier::new());
        let vault = Vault::new(
            tmp.path().join("vault"),
            store,
            engine.clone(),
            notifier.clone(),
        );

        Fixture {
            _tmp: tmp,
            vault,
            engine,
            notifier,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(FakeEngine::default(), true)
    }

    fn dirty(path: &str) -> StatusEntry {
        StatusEntry::new(
            path,
            HeadState::Present,
            WorkdirState::Modified,
            StageState::Unmodified,
        )
    }

    #[tokio::test]
    async fn test_commit_with_clean_tree_creates_nothing() {
        let fx = fixture();
        *fx.engine.matrix.lock().unwrap() = vec![StatusEntry::clean("a.md")];

        let outcome = fx.vault.commit_all(None).await;

        assert!(outcome.success);
        assert_eq!(outcome.commit, None);
        assert!(outcome.message.contains("No new changes"));
        assert!(!fx.engine.called("commit"));
        assert!(!fx.engine.called("add"));
    }

    #[tokio::test]
    async fn test_commit_stages_only_dirty_files() {
        let fx = fixture();
        *fx.engine.matrix.lock().unwrap() = vec![
            StatusEntry::clean("clean.md"),
            dirty("edited.md"),
            StatusEntry::new(
                "gone.md",
                HeadState::Present,
                WorkdirState::Absent,
                StageState::Unmodified,
            ),
        ];

        let outcome = fx.vault.commit_all(Some("Snapshot {date}")).await;

        assert!(outcome.success);
        assert_eq!(outcome.commit.as_deref(), Some("0123456"));

        let calls = fx.engine.calls();
        assert_eq!(calls[0], "status");
        assert_eq!(calls[1], "add:edited.md");
        assert_eq!(calls[2], "remove:gone.md");
        assert!(calls[3].starts_with("commit:Vault Sync:Snapshot "));
        assert!(!calls[3].contains("{date}"));
        assert_eq!(calls.len(), 4);
    }

    #[tokio::test]
    async fn test_commit_uses_template_when_no_override() {
        let fx = fixture();
        fx.vault
            .settings()
            .set(SettingField::CommitMessageTemplate, "Backup at {time}")
            .unwrap();
        *fx.engine.matrix.lock().unwrap() = vec![dirty("a.md")];

        fx.vault.commit_all(Some("")).await;

        let commit = fx.engine.calls().into_iter().find(|c| c.starts_with("commit")).unwrap();
        assert!(commit.contains("Backup at "));
        assert!(!commit.contains("{time}"));
    }

    #[tokio::test]
    async fn test_push_not_ok_is_a_failure() {
        let fx = fixture();
        *fx.engine.push_report.lock().unwrap() =
            Some(PushReport::rejected(vec!["ref rejected".into()]));

        let outcome = fx.vault.push().await;

        assert!(!outcome.success);
        assert!(outcome.message.contains("ref rejected"));
        assert_eq!(outcome.error_category, ErrorCategory::Unknown);

        let last = fx.notifier.notices().pop().unwrap();
        assert_eq!(last.level, NoticeLevel::Failure);
        assert_eq!(last.duration, NoticeDuration::Long);
    }

    #[tokio::test]
    async fn test_push_auth_failure_is_classified() {
        let fx = fixture();
        *fx.engine.push_status.lock().unwrap() = Some(403);

        let outcome = fx.vault.push().await;
        assert_eq!(outcome.error_category, ErrorCategory::AuthFailure);
    }

    #[tokio::test]
    async fn test_push_uses_proxy_url() {
        let fx = fixture();
        fx.vault
            .settings()
            .set(SettingField::CorsProxyUrl, "https://relay.example/")
            .unwrap();

        fx.vault.push().await;
        assert!(fx
            .engine
            .called("push:https://relay.example/https://github.com/user/notes.git:main"));
    }

    #[tokio::test]
    async fn test_missing_token_short_circuits() {
        let fx = fixture_with(FakeEngine::default(), false);
        fx.vault
            .settings()
            .set(SettingField::RemoteUrl, "https://github.com/user/notes.git")
            .unwrap();

        let clone = fx.vault.clone_remote().await;
        let push = fx.vault.push().await;
        let pull = fx.vault.pull().await;

        for outcome in [clone, push, pull] {
            assert!(!outcome.success);
            assert_eq!(outcome.error_category, ErrorCategory::Validation);
        }
        assert!(fx.engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_clone_triggers_backup_and_push() {
        let fx = fixture();
        *fx.engine.matrix.lock().unwrap() = vec![dirty("note.md")];

        let outcome = fx.vault.clone_remote().await;
        assert!(outcome.success);

        let calls = fx.engine.calls();
        assert_eq!(calls[0], "clone:main:Some(1)");
        assert!(calls.iter().any(|c| c.starts_with("commit:Vault Sync:Initial vault backup")));
        assert!(calls.last().unwrap().starts_with("push:"));
    }

    #[tokio::test]
    async fn test_clone_with_content_does_not_push() {
        let engine = FakeEngine {
            clone_files: vec!["README.md"],
            ..Default::default()
        };
        let fx = fixture_with(engine, true);

        let outcome = fx.vault.clone_remote().await;
        assert!(outcome.success);
        assert_eq!(fx.engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_and_push_keeps_commit_when_push_fails() {
        let fx = fixture();
        *fx.engine.matrix.lock().unwrap() = vec![dirty("a.md")];
        *fx.engine.push_report.lock().unwrap() =
            Some(PushReport::rejected(vec!["non-fast-forward".into()]));

        let outcomes = fx.vault.commit_and_push().await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert!(fx.engine.called("commit:Vault Sync:Manual commit & push"));
    }

    #[tokio::test]
    async fn test_pull_passes_branch_and_author() {
        let fx = fixture();
        fx.vault.settings().set(SettingField::BranchName, "notes").unwrap();

        let outcome = fx.vault.pull().await;
        assert!(outcome.success);
        assert!(fx.engine.called("pull:notes:vault-sync@example.com"));
    }

    #[tokio::test]
    async fn test_connection_reports_missing_branch() {
        let engine = FakeEngine {
            heads: vec!["master".into()],
            ..Default::default()
        };
        let fx = fixture_with(engine, true);

        let outcome = fx.vault.test_connection().await;
        assert!(outcome.success);
        assert!(outcome.message.contains("WARNING"));

        let last = fx.notifier.notices().pop().unwrap();
        assert_eq!(last.level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn test_init_uses_configured_branch() {
        let fx = fixture_with(FakeEngine::default(), false);
        let outcome = fx.vault.init().await;

        assert!(outcome.success);
        assert_eq!(fx.engine.calls(), vec!["init:main"]);
        assert_eq!(
            fx.vault.status_panel().presence,
            crate::view::RepoPresence::Present
        );
    }

    #[test]
    fn test_first_run_warning_shown_once() {
        let fx = fixture();

        assert!(fx.vault.check_first_run_warning().unwrap());
        assert!(!fx.vault.check_first_run_warning().unwrap());

        let notices = fx.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].duration, NoticeDuration::Persistent);
        assert!(fx.vault.settings().load().unwrap().first_run_warning_shown);
    }

    #[tokio::test]
    async fn test_malformed_settings_reported_by_operation() {
        let fx = fixture();
        std::fs::write(fx.vault.settings().path(), "remote_url: [unclosed").unwrap();

        assert!(fx.vault.check_first_run_warning().is_err());

        let outcome = fx.vault.commit_all(None).await;
        assert!(!outcome.success);
        assert!(fx.engine.calls().is_empty());

        let last = fx.notifier.notices().pop().unwrap();
        assert_eq!(last.level, NoticeLevel::Failure);
    }
}
