//! Decision rules used by the sync orchestrator
//!
//! Kept free of I/O (apart from listing a directory) so each rule can be
//! tested on its own.

use crate::error::Result;
use crate::git::{StatusEntry, METADATA_DIR};
use crate::messages::Language;
use chrono::{DateTime, Local};
use std::path::Path;
use walkdir::WalkDir;

/// Length of the abbreviated commit id shown to the user
pub const SHORT_ID_LEN: usize = 7;

/// Top-level contents of a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub files: Vec<String>,
    pub folders: Vec<String>,
}

impl DirectoryListing {
    /// List the direct children of `dir`; a missing directory is empty
    pub fn read(dir: &Path) -> Result<Self> {
        let mut listing = Self::default();
        if !dir.exists() {
            return Ok(listing);
        }

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| crate::Error::Other(e.to_string()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().is_dir() {
                listing.folders.push(name);
            } else {
                listing.files.push(name);
            }
        }

        listing.files.sort();
        listing.folders.sort();
        Ok(listing)
    }
}

/// What to do once a clone has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCloneAction {
    Nothing,
    /// The remote was empty: commit the vault and push it
    InitialBackup,
}

/// Decide the follow-up for a freshly cloned directory.
///
/// The clone is treated as empty when the directory holds no files and a
/// single folder, the repository metadata.
pub fn after_clone(listing: &DirectoryListing) -> PostCloneAction {
    let only_metadata = listing.files.is_empty()
        && listing.folders.len() == 1
        && listing.folders[0].ends_with(METADATA_DIR);

    if only_metadata {
        PostCloneAction::InitialBackup
    } else {
        PostCloneAction::Nothing
    }
}

/// Rows that must be staged before committing
pub fn dirty_entries(matrix: &[StatusEntry]) -> Vec<StatusEntry> {
    matrix
        .iter()
        .filter(|entry| !entry.is_clean())
        .cloned()
        .collect()
}

/// Date and time layouts conventional for each language
///
/// English follows the US layout (`3/9/2024`, `2:05:06 PM`), Turkish the
/// day-first one (`09.03.2024`, `14:05:06`).
pub fn date_time_formats(lang: Language) -> (&'static str, &'static str) {
    match lang {
        Language::En => ("%-m/%-d/%Y", "%-I:%M:%S %p"),
        Language::Tr => ("%d.%m.%Y", "%H:%M:%S"),
    }
}

/// Fill `{date}` and `{time}` in a commit message template
pub fn render_commit_message(template: &str, now: &DateTime<Local>, lang: Language) -> String {
    let (date, time) = date_time_formats(lang);
    template
        .replace("{date}", &now.format(date).to_string())
        .replace("{time}", &now.format(time).to_string())
}

/// Abbreviate a commit id for display
pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{HeadState, StageState, WorkdirState};
    use chrono::TimeZone;

    fn listing(files: &[&str], folders: &[&str]) -> DirectoryListing {
        DirectoryListing {
            files: files.iter().map(|s| s.to_string()).collect(),
            folders: folders.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_clone_detection() {
        assert_eq!(after_clone(&listing(&[], &[".git"])), PostCloneAction::InitialBackup);
        assert_eq!(after_clone(&listing(&["note.md"], &[".git"])), PostCloneAction::Nothing);
        assert_eq!(after_clone(&listing(&[], &[".git", "daily"])), PostCloneAction::Nothing);
        assert_eq!(after_clone(&listing(&[], &[])), PostCloneAction::Nothing);
        assert_eq!(after_clone(&listing(&[], &["attachments"])), PostCloneAction::Nothing);
    }

    #[test]
    fn test_listing_reads_top_level_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".git/objects")).unwrap();
        std::fs::write(tmp.path().join(".git/HEAD"), "ref: refs/heads/main").unwrap();

        let result = DirectoryListing::read(tmp.path()).unwrap();
        assert_eq!(result, listing(&[], &[".git"]));

        let missing = DirectoryListing::read(&tmp.path().join("nope")).unwrap();
        assert_eq!(missing, DirectoryListing::default());
    }

    #[test]
    fn test_dirty_entries_skip_clean_rows() {
        let matrix = vec![
            StatusEntry::clean("a.md"),
            StatusEntry::new(
                "b.md",
                HeadState::Present,
                WorkdirState::Modified,
                StageState::Unmodified,
            ),
            StatusEntry::new(
                "c.md",
                HeadState::Absent,
                WorkdirState::Modified,
                StageState::Absent,
            ),
            StatusEntry::new(
                "d.md",
                HeadState::Present,
                WorkdirState::Absent,
                StageState::Unmodified,
            ),
        ];

        let dirty: Vec<String> = dirty_entries(&matrix).into_iter().map(|e| e.path).collect();
        assert_eq!(dirty, vec!["b.md", "c.md", "d.md"]);
    }

    #[test]
    fn test_placeholders_use_language_layout() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 6).unwrap();

        let english = render_commit_message("Updated - {date} {time}", &now, Language::En);
        assert_eq!(english, "Updated - 3/9/2024 2:05:06 PM");

        let turkish = render_commit_message("Updated - {date} {time}", &now, Language::Tr);
        assert_eq!(turkish, "Updated - 09.03.2024 14:05:06");
    }

    #[test]
    fn test_every_placeholder_occurrence() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 6).unwrap();
        let message = render_commit_message("{date}/{date}", &now, Language::En);
        assert_eq!(message, "3/9/2024/3/9/2024");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "0123456");
        assert_eq!(short_id("abc"), "abc");
    }
}
