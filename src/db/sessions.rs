//! Durable session and history storage. Sessions are checkpointed as whole
//! JSON documents replaced by id; history rows are append-only with a unique
//! constraint on session id so a session archives exactly once.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::core::types::{QuizHistoryRecord, Session};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt stored document: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Checkpoint: full replace-by-id, atomic per row.
    pub async fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        let document = serde_json::to_string(session)?;
        sqlx::query(
            r#"INSERT INTO sessions (session_id, user_id, document, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(session_id) DO UPDATE SET
                   document = excluded.document,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&session.session_id)
        .bind(&session.user_id)
        .bind(&document)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(r#"SELECT document FROM sessions WHERE session_id = ? LIMIT 1"#)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: String = row.get("document");
                Ok(Some(serde_json::from_str(&document)?))
            }
            None => Ok(None),
        }
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM sessions WHERE session_id = ?"#)
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_history(&self, record: &QuizHistoryRecord) -> Result<(), StoreError> {
        let progress = serde_json::to_string(&record.progress)?;
        sqlx::query(
            r#"INSERT INTO quiz_history (session_id, user_id, course, topic, progress, completed_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&record.session_id)
        .bind(&record.user_id)
        .bind(&record.course)
        .bind(&record.topic)
        .bind(&progress)
        .bind(record.completed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Completed sessions for a user, most recent first.
    pub async fn history_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<QuizHistoryRecord>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT user_id, session_id, course, topic, progress, completed_at
               FROM quiz_history
               WHERE user_id = ?
               ORDER BY completed_at DESC, id DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let progress: String = row.get("progress");
            let completed_at: String = row.get("completed_at");
            records.push(QuizHistoryRecord {
                user_id: row.get("user_id"),
                session_id: row.get("session_id"),
                course: row.get("course"),
                topic: row.get("topic"),
                progress: serde_json::from_str(&progress)?,
                completed_at: DateTime::parse_from_rfc3339(&completed_at)?.with_timezone(&Utc),
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Progress, Tier};
    use chrono::Duration;

    async fn store() -> SessionStore {
        let pool = crate::db::connect("sqlite::memory:").await.unwrap();
        SessionStore::new(pool)
    }

    fn session(id: &str) -> Session {
        Session {
            session_id: id.to_string(),
            user_id: "u1".to_string(),
            topic: "algebra".to_string(),
            course: "intro".to_string(),
            progress: Progress::new(5),
            last_question: None,
        }
    }

    fn record(session_id: &str, completed_at: DateTime<Utc>) -> QuizHistoryRecord {
        QuizHistoryRecord {
            user_id: "u1".to_string(),
            session_id: session_id.to_string(),
            course: "intro".to_string(),
            topic: "algebra".to_string(),
            progress: Progress::new(2),
            completed_at,
        }
    }

    #[tokio::test]
    async fn save_get_delete_roundtrip() {
        let store = store().await;
        let mut s = session("sess_1");
        store.save_session(&s).await.unwrap();

        let loaded = store.get_session("sess_1").await.unwrap().unwrap();
        assert_eq!(loaded.session_id, "sess_1");
        assert_eq!(loaded.progress.total_questions, 5);

        // checkpoint replaces the whole document
        s.progress.answered = 3;
        s.progress.level = Tier::Medium;
        store.save_session(&s).await.unwrap();
        let loaded = store.get_session("sess_1").await.unwrap().unwrap();
        assert_eq!(loaded.progress.answered, 3);
        assert_eq!(loaded.progress.level, Tier::Medium);

        store.delete_session("sess_1").await.unwrap();
        assert!(store.get_session("sess_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_session_reads_as_none() {
        let store = store().await;
        assert!(store.get_session("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_is_most_recent_first() {
        let store = store().await;
        let base = Utc::now();
        store.insert_history(&record("s1", base - Duration::minutes(2))).await.unwrap();
        store.insert_history(&record("s2", base)).await.unwrap();
        store.insert_history(&record("s3", base - Duration::minutes(1))).await.unwrap();

        let history = store.history_for_user("u1").await.unwrap();
        let ids: Vec<&str> = history.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s3", "s1"]);

        assert!(store.history_for_user("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_rejects_duplicate_session_id() {
        let store = store().await;
        let now = Utc::now();
        store.insert_history(&record("s1", now)).await.unwrap();
        assert!(store.insert_history(&record("s1", now)).await.is_err());
    }
}
