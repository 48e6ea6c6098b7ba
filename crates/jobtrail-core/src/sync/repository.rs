//! Sync run ledger storage.

use chrono::Utc;
use jobtrail_mail::Provider;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqlitePool};

use super::model::{PostApplicationSyncRun, SyncRunStatus};
use crate::Result;

/// Repository for the sync run ledger.
pub struct SyncRunRepository {
    pool: SqlitePool,
}

impl SyncRunRepository {
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
            CREATE TABLE IF NOT EXISTS post_application_sync_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                provider TEXT NOT NULL,
                account_key TEXT NOT NULL,
                started_at INTEGER NOT NULL,
                completed_at INTEGER,
                messages_seen INTEGER NOT NULL DEFAULT 0,
                messages_approved INTEGER NOT NULL DEFAULT 0,
                messages_denied INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'running'
            )
            ",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_sync_runs_account
            ON post_application_sync_runs(provider, account_key, started_at)
            ",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Open a new run in the `running` state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn start_run(
        &self,
        provider: Provider,
        account_key: &str,
    ) -> Result<PostApplicationSyncRun> {
        let started_at = Utc::now().timestamp_millis();

        let result = sqlx::query(
            r"
            INSERT INTO post_application_sync_runs (provider, account_key, started_at, status)
            VALUES (?, ?, ?, 'running')
            ",
        )
        .bind(provider.as_str())
        .bind(account_key)
        .bind(started_at)
        .execute(&self.pool)
        .await?;

        Ok(PostApplicationSyncRun {
            id: result.last_insert_rowid(),
            provider,
            account_key: account_key.to_string(),
            started_at,
            completed_at: None,
            messages_seen: 0,
            messages_approved: 0,
            messages_denied: 0,
            status: SyncRunStatus::Running,
        })
    }

    /// Close a run with its terminal status and final seen count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn finish_run(
        &self,
        run_id: i64,
        status: SyncRunStatus,
        messages_seen: u32,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE post_application_sync_runs
            SET status = ?,
                completed_at = ?,
                messages_seen = ?
            WHERE id = ?
            ",
        )
        .bind(status.as_str())
        .bind(Utc::now().timestamp_millis())
        .bind(messages_seen)
        .bind(run_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a run by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, run_id: i64) -> Result<Option<PostApplicationSyncRun>> {
        let row = sqlx::query(
            r"
            SELECT * FROM post_application_sync_runs WHERE id = ?
            ",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_run(&r)))
    }

    /// List runs for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        provider: Provider,
        account_key: &str,
        limit: u32,
    ) -> Result<Vec<PostApplicationSyncRun>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM post_application_sync_runs
            WHERE provider = ? AND account_key = ?
            ORDER BY started_at DESC, id DESC
            LIMIT ?
            ",
        )
        .bind(provider.as_str())
        .bind(account_key)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_run).collect())
    }

    /// Bump a run's approved counter, on an existing connection so the
    /// increment commits with the decision that caused it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn increment_approved(conn: &mut SqliteConnection, run_id: i64) -> Result<()> {
        sqlx::query(
            r"
            UPDATE post_application_sync_runs
            SET messages_approved = messages_approved + 1
            WHERE id = ?
            ",
        )
        .bind(run_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Bump a run's denied counter, on an existing connection so the
    /// increment commits with the decision that caused it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn increment_denied(conn: &mut SqliteConnection, run_id: i64) -> Result<()> {
        sqlx::query(
            r"
            UPDATE post_application_sync_runs
            SET messages_denied = messages_denied + 1
            WHERE id = ?
            ",
        )
        .bind(run_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Convert a database row to a `PostApplicationSyncRun`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn row_to_run(row: &sqlx::sqlite::SqliteRow) -> PostApplicationSyncRun {
    PostApplicationSyncRun {
        id: row.get("id"),
        provider: Provider::parse(row.get("provider")),
        account_key: row.get("account_key"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        messages_seen: row.get::<i64, _>("messages_seen") as u32,
        messages_approved: row.get::<i64, _>("messages_approved") as u32,
        messages_denied: row.get::<i64, _>("messages_denied") as u32,
        status: SyncRunStatus::parse(row.get("status")),
    }
}
