//! Job repository: record lookups and stage-event appends.

use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqlitePool};

use super::model::{
    ApplicationStage, JobId, JobRecord, JobSummary, StageEvent, StageEventMetadata, StageOutcome,
};
use crate::Result;

/// Repository for job records and their stage-event history.
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
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
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                stage TEXT NOT NULL DEFAULT 'applied',
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS job_stage_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL,
                to_stage TEXT NOT NULL,
                occurred_at INTEGER NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                outcome TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_stage_events_job
            ON job_stage_events(job_id, occurred_at)
            ",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Insert a job in the initial `applied` stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn insert_job(&self, title: &str, company: &str) -> Result<JobRecord> {
        let result = sqlx::query(
            r"
            INSERT INTO jobs (title, company, stage)
            VALUES (?, ?, 'applied')
            ",
        )
        .bind(title)
        .bind(company)
        .execute(&self.pool)
        .await?;

        Ok(JobRecord {
            id: JobId::new(result.last_insert_rowid()),
            title: title.to_string(),
            company: company.to_string(),
            stage: ApplicationStage::Applied,
        })
    }

    /// Get a job by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_job(&self, id: JobId) -> Result<Option<JobRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, title, company, stage
            FROM jobs
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_job(&r)))
    }

    /// Get compact summaries for a set of jobs.
    ///
    /// Ids that do not resolve are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_summaries_by_ids(&self, ids: &[JobId]) -> Result<Vec<JobSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, title, company, stage FROM jobs WHERE id IN ({placeholders})"
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.0);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|r| JobSummary {
                id: JobId::new(r.get("id")),
                title: r.get("title"),
                company: r.get("company"),
                stage: ApplicationStage::parse(r.get("stage")),
            })
            .collect())
    }

    /// Append a stage event and advance the job's current stage, on an
    /// existing connection so callers can bundle the append into a wider
    /// transaction.
    ///
    /// Returns the new event's id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation or metadata
    /// serialization fails.
    pub async fn append_stage_event(
        conn: &mut SqliteConnection,
        job_id: JobId,
        to_stage: ApplicationStage,
        occurred_at_seconds: i64,
        metadata: &StageEventMetadata,
        outcome: Option<StageOutcome>,
    ) -> Result<i64> {
        let metadata_json = serde_json::to_string(metadata)?;

        let result = sqlx::query(
            r"
            INSERT INTO job_stage_events (job_id, to_stage, occurred_at, metadata, outcome)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(job_id.0)
        .bind(to_stage.as_str())
        .bind(occurred_at_seconds)
        .bind(&metadata_json)
        .bind(outcome.map(|o| o.as_str()))
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r"
            UPDATE jobs
            SET stage = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            ",
        )
        .bind(to_stage.as_str())
        .bind(job_id.0)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// List a job's stage events, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query or metadata parsing fails.
    pub async fn list_stage_events(&self, job_id: JobId) -> Result<Vec<StageEvent>> {
        let rows = sqlx::query(
            r"
            SELECT id, job_id, to_stage, occurred_at, metadata, outcome
            FROM job_stage_events
            WHERE job_id = ?
            ORDER BY occurred_at ASC, id ASC
            ",
        )
        .bind(job_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let metadata: StageEventMetadata =
                    serde_json::from_str(r.get::<String, _>("metadata").as_str())?;
                Ok(StageEvent {
                    id: r.get("id"),
                    job_id: JobId::new(r.get("job_id")),
                    to_stage: ApplicationStage::parse(r.get("to_stage")),
                    occurred_at: r.get("occurred_at"),
                    metadata,
                    outcome: r
                        .get::<Option<String>, _>("outcome")
                        .as_deref()
                        .and_then(StageOutcome::parse),
                })
            })
            .collect()
    }
}

/// Convert a database row to a `JobRecord`.
fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> JobRecord {
    JobRecord {
        id: JobId::new(row.get("id")),
        title: row.get("title"),
        company: row.get("company"),
        stage: ApplicationStage::parse(row.get("stage")),
    }
}
