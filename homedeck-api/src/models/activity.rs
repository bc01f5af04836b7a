use std::collections::VecDeque;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Id;

/// Number of entries an activity log keeps.
pub const ACTIVITY_LOG_RETENTION: usize = 50;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogSeverity {
    #[default]
    Info,
    Warning,
    Error,
}

impl Display for LogSeverity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LogSeverity::Info => write!(f, "INFO"),
            LogSeverity::Warning => write!(f, "WARNING"),
            LogSeverity::Error => write!(f, "ERROR"),
        }
    }
}

impl From<String> for LogSeverity {
    fn from(value: String) -> Self {
        match value.as_str() {
            "WARNING" => LogSeverity::Warning,
            "ERROR" => LogSeverity::Error,
            _ => LogSeverity::Info,
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogResponse {
    /// Entry identifier
    pub id: Id,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Human readable description
    pub message: String,
    pub severity: LogSeverity,
}

/// Append-only log that keeps the most recent entries, newest first.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<ActivityLogResponse>,
    retention: usize,
    next_id: Id,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::with_retention(ACTIVITY_LOG_RETENTION)
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(retention),
            retention,
            next_id: 1,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: LogSeverity) -> &ActivityLogResponse {
        let entry = ActivityLogResponse {
            id: self.next_id,
            timestamp: OffsetDateTime::now_utc(),
            message: message.into(),
            severity,
        };
        self.next_id += 1;

        self.entries.push_front(entry);
        self.entries.truncate(self.retention);

        &self.entries[0]
    }

    pub fn info(&mut self, message: impl Into<String>) -> &ActivityLogResponse {
        self.push(message, LogSeverity::Info)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> &ActivityLogResponse {
        self.push(message, LogSeverity::Warning)
    }

    /// Entries ordered newest first.
    pub fn entries(&self) -> Vec<ActivityLogResponse> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Merges two newest-first logs into one newest-first log capped at the retention bound.
pub fn merge_activity_logs(
    left: Vec<ActivityLogResponse>,
    right: Vec<ActivityLogResponse>,
) -> Vec<ActivityLogResponse> {
    let mut merged = [left, right].concat();
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.truncate(ACTIVITY_LOG_RETENTION);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_ordering() {
        let mut log = ActivityLog::new();
        log.info("first");
        log.warning("second");
        log.info("third");

        let entries = log.entries();
        assert_eq!(entries[0].message, "third");
        assert_eq!(entries[1].severity, LogSeverity::Warning);
        assert_eq!(entries[2].message, "first");
        assert!(entries.windows(2).all(|pair| pair[0].id > pair[1].id));
    }

    #[test]
    fn test_retention_bound() {
        let mut log = ActivityLog::new();
        for i in 0..(ACTIVITY_LOG_RETENTION + 25) {
            log.info(format!("entry {i}"));
        }

        let entries = log.entries();
        assert_eq!(entries.len(), ACTIVITY_LOG_RETENTION);
        assert_eq!(entries[0].message, format!("entry {}", ACTIVITY_LOG_RETENTION + 24));
    }

    #[test]
    fn test_merge_activity_logs() {
        let mut older = ActivityLog::new();
        older.info("remote");
        let mut newer = ActivityLog::new();
        for i in 0..ACTIVITY_LOG_RETENTION {
            newer.info(format!("local {i}"));
        }

        let merged = merge_activity_logs(older.entries(), newer.entries());
        assert_eq!(merged.len(), ACTIVITY_LOG_RETENTION);
        assert!(merged.windows(2).all(|pair| pair[0].timestamp >= pair[1].timestamp));
    }

    #[test]
    fn test_severity_wire_format() {
        assert_eq!(serde_json::to_string(&LogSeverity::Warning).unwrap(), "\"WARNING\"");
        assert_eq!(LogSeverity::from("ERROR".to_string()), LogSeverity::Error);
    }
}
