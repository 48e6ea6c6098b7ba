//! Database bootstrap.
//!
//! All repositories share one `SqlitePool`: a decision must flip the
//! message row, append the job stage event, and bump the run counter in a
//! single transaction, which rules out one database file per repository.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::Result;
use crate::jobs::JobRepository;
use crate::sync::SyncRunRepository;
use crate::triage::TriageRepository;

/// Opens (creating if needed) the database at the given path and runs
/// every repository's schema initialization.
///
/// # Errors
///
/// Returns an error if the connection or schema creation fails.
pub async fn connect(database_path: &str) -> Result<SqlitePool> {
    let url = format!("sqlite:{database_path}?mode=rwc");
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    initialize(&pool).await?;
    Ok(pool)
}

/// Opens an in-memory database for testing.
///
/// A single connection keeps every handle on the same in-memory database.
///
/// # Errors
///
/// Returns an error if the connection or schema creation fails.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    initialize(&pool).await?;
    Ok(pool)
}

/// Creates every table and index this crate owns.
async fn initialize(pool: &SqlitePool) -> Result<()> {
    JobRepository::initialize(pool).await?;
    SyncRunRepository::initialize(pool).await?;
    TriageRepository::initialize(pool).await?;
    Ok(())
}
