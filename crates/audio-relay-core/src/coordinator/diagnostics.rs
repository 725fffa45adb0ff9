use std::collections::VecDeque;

use chrono::{DateTime, Local};

/// Entries kept before the oldest are discarded.
pub const DIAGNOSTIC_CAPACITY: usize = 200;

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    /// Normal lifecycle event.
    Info,
    /// Degraded but continuing.
    Warn,
    /// An operation failed.
    Error,
}

/// One timestamped line in the diagnostic trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    /// Local wall-clock time of the event.
    pub at: DateTime<Local>,
    /// Severity.
    pub level: DiagnosticLevel,
    /// What happened.
    pub message: String,
}

/// Bounded in-memory trail of coordinator events.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: VecDeque<DiagnosticEntry>,
}

impl DiagnosticLog {
    /// Append an entry, dropping the oldest when full.
    pub fn push(&mut self, level: DiagnosticLevel, message: impl Into<String>) {
        if self.entries.len() == DIAGNOSTIC_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(DiagnosticEntry {
            at: Local::now(),
            level,
            message: message.into(),
        });
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &DiagnosticEntry> {
        self.entries.iter()
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&DiagnosticEntry> {
        self.entries.back()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
