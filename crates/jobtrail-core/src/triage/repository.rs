//! Triage repository for persistent storage of inbound messages.

use jobtrail_mail::Provider;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqlitePool};

use super::model::{
    MessageType, NewTriageMessage, PostApplicationMessage, ProcessingStatus, StageTarget,
};
use crate::Result;
use crate::jobs::JobId;

/// Upper bound on messages considered by one listing or bulk pass.
pub(crate) const PENDING_LIST_LIMIT: u32 = 1000;

/// Repository for triage messages.
pub struct TriageRepository {
    pool: SqlitePool,
}

impl TriageRepository {
    /// Create a repository over a shared pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize database schema.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn initialize(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS post_application_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                provider TEXT NOT NULL,
                account_key TEXT NOT NULL,
                native_message_id TEXT NOT NULL,
                message_type TEXT NOT NULL DEFAULT 'unknown',
                matched_job_id INTEGER,
                stage_target TEXT,
                received_at INTEGER NOT NULL DEFAULT 0,
                processing_status TEXT NOT NULL DEFAULT 'pending_user',
                decided_at INTEGER,
                decided_by TEXT,
                sync_run_id INTEGER,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(provider, account_key, native_message_id)
            )
            ",
        )
        .execute(pool)
        .await?;

        // Index for the pending queue per account
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_triage_pending
            ON post_application_messages(provider, account_key, processing_status)
            WHERE processing_status = 'pending_user'
            ",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_triage_run
            ON post_application_messages(sync_run_id)
            ",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Insert a freshly ingested message as `pending_user`.
    ///
    /// Returns `None` when the provider+account+native-id key already
    /// exists (the message was ingested by an earlier run).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn insert_message(
        &self,
        new: &NewTriageMessage,
    ) -> Result<Option<PostApplicationMessage>> {
        let inserted = sqlx::query(
            r"
            INSERT INTO post_application_messages
                (provider, account_key, native_message_id, message_type,
                 matched_job_id, stage_target, received_at, processing_status, sync_run_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'pending_user', ?)
            ON CONFLICT(provider, account_key, native_message_id) DO NOTHING
            ",
        )
        .bind(new.provider.as_str())
        .bind(&new.account_key)
        .bind(&new.native_message_id)
        .bind(new.message_type.as_str())
        .bind(new.matched_job_id.map(|j| j.0))
        .bind(new.stage_target.map(|t| t.as_str()))
        .bind(new.received_at)
        .bind(new.sync_run_id)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query(
            r"
            SELECT * FROM post_application_messages WHERE id = ?
            ",
        )
        .bind(inserted.last_insert_rowid())
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(row_to_message(&row)))
    }

    /// Get a message by id within an account scope.
    ///
    /// A message outside the caller's (provider, account) scope is
    /// reported as absent, never as foreign.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_scoped(
        &self,
        message_id: i64,
        provider: Provider,
        account_key: &str,
    ) -> Result<Option<PostApplicationMessage>> {
        let row = sqlx::query(
            r"
            SELECT * FROM post_application_messages
            WHERE id = ? AND provider = ? AND account_key = ?
            ",
        )
        .bind(message_id)
        .bind(provider.as_str())
        .bind(account_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_message(&r)))
    }

    /// List pending messages for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_pending(
        &self,
        provider: Provider,
        account_key: &str,
        limit: u32,
    ) -> Result<Vec<PostApplicationMessage>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM post_application_messages
            WHERE provider = ? AND account_key = ? AND processing_status = 'pending_user'
            ORDER BY received_at DESC, id DESC
            LIMIT ?
            ",
        )
        .bind(provider.as_str())
        .bind(account_key)
        .bind(limit.min(PENDING_LIST_LIMIT))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_message).collect())
    }

    /// List every message a sync run ingested, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_run(&self, sync_run_id: i64) -> Result<Vec<PostApplicationMessage>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM post_application_messages
            WHERE sync_run_id = ?
            ORDER BY received_at DESC, id DESC
            ",
        )
        .bind(sync_run_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_message).collect())
    }

    /// Conditionally move a message out of `pending_user`, on an existing
    /// connection so callers can bundle the flip into a wider transaction.
    ///
    /// The `processing_status = 'pending_user'` guard makes the check and
    /// the write one atomic step: a return of `0` means a concurrent
    /// decision won the race and nothing was changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn mark_decided(
        conn: &mut SqliteConnection,
        message_id: i64,
        status: ProcessingStatus,
        matched_job_id: Option<JobId>,
        decided_at: i64,
        decided_by: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            r"
            UPDATE post_application_messages
            SET processing_status = ?,
                matched_job_id = ?,
                decided_at = ?,
                decided_by = ?
            WHERE id = ? AND processing_status = 'pending_user'
            ",
        )
        .bind(status.as_str())
        .bind(matched_job_id.map(|j| j.0))
        .bind(decided_at)
        .bind(decided_by)
        .bind(message_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Convert a database row to a `PostApplicationMessage`.
fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> PostApplicationMessage {
    PostApplicationMessage {
        id: row.get("id"),
        provider: Provider::parse(row.get("provider")),
        account_key: row.get("account_key"),
        native_message_id: row.get("native_message_id"),
        message_type: MessageType::parse(row.get("message_type")),
        matched_job_id: row
            .get::<Option<i64>, _>("matched_job_id")
            .map(JobId::new),
        stage_target: row
            .get::<Option<String>, _>("stage_target")
            .as_deref()
            .map(StageTarget::parse),
        received_at: row.get("received_at"),
        processing_status: ProcessingStatus::parse(row.get("processing_status")),
        decided_at: row.get("decided_at"),
        decided_by: row.get("decided_by"),
        sync_run_id: row.get("sync_run_id"),
    }
}
