//! Report capture for assertions on emitted lines.

use std::sync::Mutex;

use tracing::Level;

use crate::core::report::ReportSink;

/// A captured report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

/// [`ReportSink`] that keeps every line in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: Level, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                level,
                message: message.to_string(),
            });
        }
    }

    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn filter_by_level(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }

    #[must_use]
    pub fn infos(&self) -> Vec<String> {
        self.filter_by_level(Level::INFO)
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.filter_by_level(Level::WARN)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    #[must_use]
    pub fn contains_message(&self, message: &str) -> bool {
        self.entries()
            .iter()
            .any(|entry| entry.message.contains(message))
    }

    /// Format captured lines for display on test failure.
    #[must_use]
    pub fn format_for_display(&self) -> String {
        let entries = self.entries();
        if entries.is_empty() {
            return String::from("No lines captured");
        }
        entries
            .iter()
            .map(|entry| format!("[{}] {}", entry.level, entry.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ReportSink for RecordingSink {
    fn info(&self, line: &str) {
        self.push(Level::INFO, line);
    }

    fn warn(&self, line: &str) {
        self.push(Level::WARN, line);
    }
}
