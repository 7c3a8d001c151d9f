//! Change-status matrix
//!
//! Each file is described by three states: its presence in HEAD, how the
//! working tree compares to HEAD, and how the index compares to both. A
//! file is clean only when all three agree; anything else must be staged
//! before a commit.

use git2::Status;
use serde::Serialize;

/// Whether the file exists in the HEAD commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadState {
    Absent,
    Present,
}

/// The working-tree copy compared to HEAD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkdirState {
    Absent,
    Unmodified,
    Modified,
}

/// The index entry compared to HEAD and the working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Absent,
    /// Same content as HEAD
    Unmodified,
    /// Same content as the working tree, different from HEAD
    MatchesWorkdir,
    /// Different from both
    Differs,
}

/// One row of the change-status matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub path: String,
    pub head: HeadState,
    pub workdir: WorkdirState,
    pub stage: StageState,
}

impl StatusEntry {
    pub fn new(
        path: impl Into<String>,
        head: HeadState,
        workdir: WorkdirState,
        stage: StageState,
    ) -> Self {
        Self {
            path: path.into(),
            head,
            workdir,
            stage,
        }
    }

    /// An entry whose three states agree
    pub fn clean(path: impl Into<String>) -> Self {
        Self::new(
            path,
            HeadState::Present,
            WorkdirState::Unmodified,
            StageState::Unmodified,
        )
    }

    /// True only when HEAD, working tree and index all agree
    pub fn is_clean(&self) -> bool {
        matches!(
            (self.head, self.workdir, self.stage),
            (HeadState::Present, WorkdirState::Unmodified, StageState::Unmodified)
        )
    }

    /// True when staging this entry means recording a deletion
    pub fn is_removal(&self) -> bool {
        self.workdir == WorkdirState::Absent
    }

    /// Translate libgit2 status flags into the three-state form
    pub fn from_git2(path: impl Into<String>, status: Status) -> Self {
        if status.contains(Status::CONFLICTED) {
            return Self::new(
                path,
                HeadState::Present,
                WorkdirState::Modified,
                StageState::Differs,
            );
        }

        let index_changed = status.intersects(
            Status::INDEX_NEW
                | Status::INDEX_MODIFIED
                | Status::INDEX_DELETED
                | Status::INDEX_RENAMED
                | Status::INDEX_TYPECHANGE,
        );
        let workdir_changed = status.intersects(
            Status::WT_NEW
                | Status::WT_MODIFIED
                | Status::WT_DELETED
                | Status::WT_RENAMED
                | Status::WT_TYPECHANGE,
        );

        // WT_NEW means "not in the index"; with INDEX_DELETED the file is
        // still in HEAD but was unstaged.
        let head = if status.contains(Status::INDEX_NEW)
            || (status.contains(Status::WT_NEW) && !status.contains(Status::INDEX_DELETED))
        {
            HeadState::Absent
        } else {
            HeadState::Present
        };

        let workdir = if status.contains(Status::WT_DELETED)
            || (status.contains(Status::INDEX_DELETED) && !status.contains(Status::WT_NEW))
        {
            WorkdirState::Absent
        } else if index_changed || workdir_changed {
            WorkdirState::Modified
        } else {
            WorkdirState::Unmodified
        };

        let stage = if status.intersects(Status::INDEX_DELETED | Status::WT_NEW) {
            StageState::Absent
        } else if !index_changed {
            StageState::Unmodified
        } else if !workdir_changed {
            StageState::MatchesWorkdir
        } else {
            StageState::Differs
        };

        Self::new(path, head, workdir, stage)
    }
}
