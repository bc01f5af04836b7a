use std::sync::Arc;

use homedeck_api::models::{ACTIVITY_LOG_RETENTION, LogSeverity};
use sqlx::{Error, Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::ActivityLogEntry;

pub struct ActivityLogRepository {
    storage: Arc<Storage>,
}

impl ActivityLogRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &SqlitePool {
        self.storage.get_pool()
    }
}

impl ActivityLogRepository {
    /// Appends an entry and prunes the user's log to the retention bound.
    pub async fn append(
        &self,
        user_id: i32,
        message: &str,
        severity: LogSeverity,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO activity_logs (user_id, message, severity, timestamp)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(message)
        .bind(severity.to_string())
        .bind(OffsetDateTime::now_utc())
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        sqlx::query(
            r#"
            DELETE FROM activity_logs
            WHERE user_id = $1 AND id NOT IN (
                SELECT id FROM activity_logs WHERE user_id = $1 ORDER BY id DESC LIMIT $2
            )
            "#,
        )
        .bind(user_id)
        .bind(ACTIVITY_LOG_RETENTION as i64)
        .execute(&mut **transaction)
        .await?;

        Ok(id as i32)
    }

    /// Newest first.
    pub async fn find_by_user_id(&self, user_id: i32) -> Result<Vec<ActivityLogEntry>, Error> {
        let entries: Vec<ActivityLogEntry> = sqlx::query_as(
            "SELECT * FROM activity_logs WHERE user_id = $1 ORDER BY id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(ACTIVITY_LOG_RETENTION as i64)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use crate::repositories::test_support::setup_test_db;

    use super::*;

    #[tokio::test]
    async fn test_log_pruned_to_retention() {
        let storage = setup_test_db().await;
        sqlx::query("INSERT INTO users (username, password) VALUES ('a', 'x'), ('b', 'x')")
            .execute(storage.get_pool())
            .await
            .unwrap();
        let repo = ActivityLogRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        for i in 0..60 {
            repo.append(1, &format!("entry {i}"), LogSeverity::Info, &mut tx).await.unwrap();
        }
        repo.append(2, "other user", LogSeverity::Warning, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let entries = repo.find_by_user_id(1).await.unwrap();
        assert_eq!(entries.len(), ACTIVITY_LOG_RETENTION);
        assert_eq!(entries[0].message, "entry 59");
        assert!(entries.windows(2).all(|pair| pair[0].id > pair[1].id));

        let (stored,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activity_logs WHERE user_id = 1")
            .fetch_one(storage.get_pool())
            .await
            .unwrap();
        assert_eq!(stored, ACTIVITY_LOG_RETENTION as i64);

        let other = repo.find_by_user_id(2).await.unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].severity, "WARNING");
    }
}
