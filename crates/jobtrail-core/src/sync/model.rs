//! Sync run data models.

use jobtrail_mail::Provider;

/// Terminal or in-progress state of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncRunStatus {
    /// Ingestion cycle in progress.
    #[default]
    Running,
    /// Cycle finished; per-message failures may still be in the report.
    Completed,
    /// Candidate enumeration itself failed.
    Failed,
}

impl SyncRunStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Running,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingestion cycle for a (provider, account) pair.
///
/// The approved/denied counters only move inside the transaction that
/// decides a message belonging to this run, so they never run ahead of
/// the message rows.
#[derive(Debug, Clone)]
pub struct PostApplicationSyncRun {
    /// Unique identifier.
    pub id: i64,
    /// Mailbox vendor.
    pub provider: Provider,
    /// Mailbox account within the vendor.
    pub account_key: String,
    /// Start time, epoch milliseconds.
    pub started_at: i64,
    /// Completion time, epoch milliseconds; `None` while running.
    pub completed_at: Option<i64>,
    /// Candidate messages seen by the cycle.
    pub messages_seen: u32,
    /// Messages from this run approved so far.
    pub messages_approved: u32,
    /// Messages from this run denied so far.
    pub messages_denied: u32,
    /// Run state.
    pub status: SyncRunStatus,
}

/// What one ingestion cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Ledger row for the cycle.
    pub run_id: i64,
    /// Candidates the mailbox handed over.
    pub seen: u32,
    /// New triage rows created.
    pub ingested: u32,
    /// Candidates already ingested by an earlier run.
    pub duplicates: u32,
    /// Candidates dropped by a per-message failure.
    pub failures: u32,
}
