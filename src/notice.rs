//! User notices
//!
//! Operations report progress and outcomes through a [`Notifier`], which
//! keeps the orchestrator independent of how notices are displayed.

use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Kind of notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Progress,
    Success,
    Failure,
    Warning,
}

/// How long a notice stays visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeDuration {
    Default,
    /// Failures stay up longer
    Long,
    /// Stays until dismissed
    Persistent,
}

impl NoticeDuration {
    /// Display time, `None` when the notice must be dismissed by the user
    pub fn as_duration(self) -> Option<Duration> {
        match self {
            NoticeDuration::Default => Some(Duration::from_secs(4)),
            NoticeDuration::Long => Some(Duration::from_secs(10)),
            NoticeDuration::Persistent => None,
        }
    }
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub duration: NoticeDuration,
}

impl Notice {
    pub fn progress(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Progress,
            text: text.into(),
            duration: NoticeDuration::Default,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
            duration: NoticeDuration::Default,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Failure,
            text: text.into(),
            duration: NoticeDuration::Long,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
            duration: NoticeDuration::Default,
        }
    }

    /// Make the notice stay until dismissed
    pub fn persistent(mut self) -> Self {
        self.duration = NoticeDuration::Persistent;
        self
    }
}

/// Displays notices to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to stderr, one per line
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        let marker = match notice.level {
            NoticeLevel::Progress => "..",
            NoticeLevel::Success => "ok",
            NoticeLevel::Failure => "!!",
            NoticeLevel::Warning => "**",
        };

        let mut stderr = std::io::stderr().lock();
        for (i, line) in notice.text.lines().enumerate() {
            let prefix = if i == 0 { marker } else { "  " };
            // Nothing sensible to do if the terminal is gone
            let _ = writeln!(stderr, "[{}] {}", prefix, line);
        }
    }
}

/// Keeps every notice in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the notices received so far
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
