use homedeck_api::models::{ActivityLogResponse, LogSeverity};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLogEntry {
    pub id: i32,
    pub user_id: i32,
    pub message: String,
    pub severity: String,
    pub timestamp: OffsetDateTime,
}

impl From<ActivityLogEntry> for ActivityLogResponse {
    fn from(entry: ActivityLogEntry) -> Self {
        ActivityLogResponse {
            id: entry.id,
            timestamp: entry.timestamp,
            message: entry.message,
            severity: LogSeverity::from(entry.severity),
        }
    }
}

#[derive(Clone)]
pub struct ActivityLogTable;

impl Table for ActivityLogTable {
    fn name(&self) -> &'static str {
        "activity_logs"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS activity_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                severity TEXT NOT NULL DEFAULT 'INFO',
                timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS activity_logs;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}
