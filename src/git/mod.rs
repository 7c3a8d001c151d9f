//! Git backend for vault-sync
//!
//! The orchestrator talks to version control only through the [`Engine`]
//! trait. [`Git2Engine`] implements it on top of libgit2; tests substitute
//! an in-memory engine.
//!
//! # Engine Contract
//!
//! 1. **Local operations** (init, status, stage, commit) act on the working
//!    directory passed in and are fast.
//! 2. **Remote operations** (clone, push, pull, branch lookup) receive a
//!    [`ResolvedTransport`] built for this call only.
//! 3. **Push** reports rejected refs in its [`PushReport`] instead of failing,
//!    leaving it to the caller to decide what a partial failure means.

use crate::error::Result;
use crate::transport::ResolvedTransport;
use serde::Serialize;
use std::path::Path;

mod git2_backend;
mod status;

pub use git2_backend::Git2Engine;
pub use status::{HeadState, StageState, StatusEntry, WorkdirState};

/// Name of the engine-owned metadata directory
pub const METADATA_DIR: &str = ".git";

/// Commit author identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Options for cloning into the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOptions {
    /// The only ref to fetch
    pub branch: String,
    /// History depth; `None` fetches everything
    pub depth: Option<u32>,
}

/// Result of a push, as reported by the remote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// True only when every ref was accepted
    pub ok: bool,
    /// One entry per rejected ref
    pub errors: Vec<String>,
}

impl PushReport {
    /// A push that every ref accepted
    pub fn accepted() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }

    /// A push with rejected refs
    pub fn rejected(errors: Vec<String>) -> Self {
        Self { ok: false, errors }
    }
}

/// What happened to the local branch during a pull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PullResult {
    UpToDate,
    FastForward,
    Merged,
    /// The local branch had no commits and now points at the remote tip
    Adopted,
}

/// The version-control primitives the sync orchestrator needs
pub trait Engine: Send + Sync {
    /// Create repository metadata in `dir`, with HEAD on `branch`
    fn init(&self, dir: &Path, branch: &str) -> Result<()>;

    /// Clone the remote into `dir`, which may already contain files
    fn clone_into(&self, dir: &Path, transport: &ResolvedTransport, opts: &CloneOptions)
        -> Result<()>;

    /// Per-file (head, workdir, stage) states for tracked and untracked files
    fn status_matrix(&self, dir: &Path) -> Result<Vec<StatusEntry>>;

    /// Stage the working-tree content of `path`
    fn add(&self, dir: &Path, path: &str) -> Result<()>;

    /// Stage the removal of `path`
    fn remove(&self, dir: &Path, path: &str) -> Result<()>;

    /// Commit the index on HEAD, returning the full commit id
    fn commit(&self, dir: &Path, message: &str, author: &Author) -> Result<String>;

    /// Push `branch` to the remote
    fn push(&self, dir: &Path, transport: &ResolvedTransport, branch: &str) -> Result<PushReport>;

    /// Fetch `branch` and integrate it into the local branch
    fn pull(
        &self,
        dir: &Path,
        transport: &ResolvedTransport,
        branch: &str,
        author: &Author,
    ) -> Result<PullResult>;

    /// Whether `branch` exists on the remote, without touching the working
    /// directory. An empty remote has no branches.
    fn remote_has_branch(&self, transport: &ResolvedTransport, branch: &str) -> Result<bool>;
}
