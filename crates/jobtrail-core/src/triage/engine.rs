//! Triage decision engine.
//!
//! Exposes the inbox protocol: list pending messages, approve one into a
//! job's pipeline, deny one, or sweep every pending message for an
//! account with a bulk action.
//!
//! Concurrency control is optimistic and lives entirely in the database:
//! the conditional update guarded on `pending_user` is the only mutual
//! exclusion, so any number of handlers (and process instances) can race
//! on the same account and exactly one wins per message.

use std::collections::HashMap;

use chrono::Utc;
use jobtrail_mail::Provider;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use super::model::{PostApplicationMessage, ProcessingStatus, StageTarget};
use super::repository::{PENDING_LIST_LIMIT, TriageRepository};
use super::resolver::resolve_decision;
use crate::error::{Error, Result};
use crate::jobs::{JobId, JobRepository, JobSummary, StageEventMetadata};
use crate::sync::{PostApplicationSyncRun, SyncRunRepository};

/// Skip reason for bulk-approve items with nothing to link to.
pub const SKIP_NO_SUGGESTED_MATCH: &str = "NO_SUGGESTED_MATCH";

/// Skip reason for bulk items that lost the race to a concurrent decision.
pub const SKIP_ALREADY_DECIDED: &str = "ALREADY_DECIDED";

/// Actor label recorded when the caller does not supply one.
const DEFAULT_ACTOR: &str = "user";

/// Approval parameters.
#[derive(Debug, Clone, Default)]
pub struct ApproveRequest {
    /// Message to approve.
    pub message_id: i64,
    /// Caller's mailbox vendor scope.
    pub provider: Provider,
    /// Caller's account scope.
    pub account_key: String,
    /// Job to link, overriding the message's suggestion.
    pub job_id: Option<JobId>,
    /// Requested transition target.
    pub stage_target: Option<StageTarget>,
    /// Legacy alias for `stage_target`; used only when it is absent.
    pub to_stage: Option<StageTarget>,
    /// Free-form note recorded on the stage event.
    pub note: Option<String>,
    /// Actor label recorded with the decision.
    pub decided_by: Option<String>,
}

/// Denial parameters.
#[derive(Debug, Clone, Default)]
pub struct DenyRequest {
    /// Message to deny.
    pub message_id: i64,
    /// Caller's mailbox vendor scope.
    pub provider: Provider,
    /// Caller's account scope.
    pub account_key: String,
    /// Actor label recorded with the decision.
    pub decided_by: Option<String>,
}

/// The decision applied by a bulk sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Approve every pending message using its suggested match.
    Approve,
    /// Deny every pending message.
    Deny,
}

/// Bulk sweep parameters.
#[derive(Debug, Clone)]
pub struct BulkRequest {
    /// Decision to apply.
    pub action: BulkAction,
    /// Mailbox vendor scope.
    pub provider: Provider,
    /// Account scope.
    pub account_key: String,
    /// Actor label recorded with each decision.
    pub decided_by: Option<String>,
}

/// Result of one approve or deny call.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    /// The message after the decision.
    pub message: PostApplicationMessage,
    /// Id of the appended stage event, or `None` for a no-op transition.
    pub stage_event_id: Option<i64>,
}

/// What happened to one message inside a bulk sweep.
#[derive(Debug, Clone)]
pub enum BulkItemStatus {
    /// Approved; carries the stage event id when one was appended.
    Approved {
        /// Appended event id, `None` for link-only approvals.
        stage_event_id: Option<i64>,
    },
    /// Denied.
    Denied,
    /// Not attempted, or lost a race; the reason says which.
    Skipped {
        /// Machine-readable skip reason.
        reason: &'static str,
    },
    /// The single-item operation failed.
    Failed {
        /// Rendered error for the item.
        error: String,
    },
}

/// Per-message record in a bulk result.
#[derive(Debug, Clone)]
pub struct BulkItemResult {
    /// Message the entry refers to.
    pub message_id: i64,
    /// What happened to it.
    pub status: BulkItemStatus,
}

/// Aggregate result of a bulk sweep.
#[derive(Debug, Clone)]
pub struct BulkOutcome {
    /// Pending messages enumerated for the sweep.
    pub requested: u32,
    /// Items decided successfully.
    pub succeeded: u32,
    /// Items whose operation failed.
    pub failed: u32,
    /// Items skipped (no match to link, or already decided elsewhere).
    pub skipped: u32,
    /// One entry per enumerated message, in queue order.
    pub results: Vec<BulkItemResult>,
}

/// One pending message with its resolved job, for inbox display.
#[derive(Debug, Clone)]
pub struct InboxItem {
    /// The triage message.
    pub message: PostApplicationMessage,
    /// Summary of the suggested job, when the suggestion resolves.
    pub job: Option<JobSummary>,
}

/// A sync run with the messages it ingested.
#[derive(Debug, Clone)]
pub struct RunMessages {
    /// The ledger row.
    pub run: PostApplicationSyncRun,
    /// Messages the run ingested, with resolved jobs.
    pub items: Vec<InboxItem>,
}

/// The triage decision engine.
pub struct DecisionEngine {
    pool: SqlitePool,
    messages: TriageRepository,
    jobs: JobRepository,
    runs: SyncRunRepository,
}

impl DecisionEngine {
    /// Create an engine over a shared pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            messages: TriageRepository::new(pool.clone()),
            jobs: JobRepository::new(pool.clone()),
            runs: SyncRunRepository::new(pool.clone()),
            pool,
        }
    }

    /// Approve a pending message: link it to a job and, unless the
    /// resolved transition is a no-op, advance the job's stage.
    ///
    /// The status flip, the stage-event append, and the run-counter
    /// increment commit as one transaction; an observer never sees the
    /// message decided without its stage effect.
    ///
    /// # Errors
    ///
    /// `NotFound` if the message is absent or out of scope, or the job
    /// does not exist; `Conflict` if the message was already decided
    /// (before the call or by a concurrent racer); `MissingJobLink` if
    /// neither the caller nor the message names a job.
    pub async fn approve(&self, mut req: ApproveRequest) -> Result<DecisionOutcome> {
        let message = self
            .messages
            .get_scoped(req.message_id, req.provider, &req.account_key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("message {}", req.message_id)))?;

        if !message.is_pending() {
            return Err(Error::Conflict(message.processing_status));
        }

        let job_id = req.job_id.or(message.matched_job_id).ok_or_else(|| {
            Error::MissingJobLink(format!(
                "message {} has no suggested match and no job was supplied",
                message.id
            ))
        })?;

        self.jobs
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("job {job_id}")))?;

        let transition = resolve_decision(
            req.stage_target,
            req.to_stage,
            message.stage_target,
            message.message_type,
        );

        let decided_at = Utc::now().timestamp_millis();
        let decided_by = req.decided_by.as_deref().unwrap_or(DEFAULT_ACTOR);

        let mut tx = self.pool.begin().await?;

        let affected = TriageRepository::mark_decided(
            &mut tx,
            message.id,
            ProcessingStatus::ManualLinked,
            Some(job_id),
            decided_at,
            decided_by,
        )
        .await?;

        if affected == 0 {
            // Lost the race to a concurrent decision.
            tx.rollback().await?;
            return Err(self.conflict_for(message.id, req.provider, &req.account_key).await);
        }

        let stage_event_id = if let Some(to_stage) = transition.to_stage {
            // Stage history is timestamped at receive time; an unknown
            // receive time falls back to the decision instant.
            let occurred_at = if message.received_at > 0 {
                message.received_at / 1000
            } else {
                decided_at / 1000
            };

            let metadata = StageEventMetadata {
                actor: "system".to_string(),
                label: format!("Post-application triage routed to {}", to_stage.display_name()),
                note: req.note.take(),
                reason_code: transition.reason_code.to_string(),
                message_id: message.id,
            };

            Some(
                JobRepository::append_stage_event(
                    &mut tx,
                    job_id,
                    to_stage,
                    occurred_at,
                    &metadata,
                    transition.outcome,
                )
                .await?,
            )
        } else {
            None
        };

        if let Some(run_id) = message.sync_run_id {
            SyncRunRepository::increment_approved(&mut tx, run_id).await?;
        }

        tx.commit().await?;

        info!(
            message_id = message.id,
            job_id = job_id.0,
            reason = transition.reason_code,
            "triage message approved"
        );

        let updated = self
            .messages
            .get_scoped(message.id, req.provider, &req.account_key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("message {}", message.id)))?;

        Ok(DecisionOutcome {
            message: updated,
            stage_event_id,
        })
    }

    /// Deny a pending message: dismiss it and clear its suggested match.
    ///
    /// # Errors
    ///
    /// `NotFound` if the message is absent or out of scope; `Conflict` if
    /// it was already decided.
    pub async fn deny(&self, req: DenyRequest) -> Result<DecisionOutcome> {
        let message = self
            .messages
            .get_scoped(req.message_id, req.provider, &req.account_key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("message {}", req.message_id)))?;

        if !message.is_pending() {
            return Err(Error::Conflict(message.processing_status));
        }

        let decided_at = Utc::now().timestamp_millis();
        let decided_by = req.decided_by.as_deref().unwrap_or(DEFAULT_ACTOR);

        let mut tx = self.pool.begin().await?;

        let affected = TriageRepository::mark_decided(
            &mut tx,
            message.id,
            ProcessingStatus::Ignored,
            None,
            decided_at,
            decided_by,
        )
        .await?;

        if affected == 0 {
            tx.rollback().await?;
            return Err(self.conflict_for(message.id, req.provider, &req.account_key).await);
        }

        if let Some(run_id) = message.sync_run_id {
            SyncRunRepository::increment_denied(&mut tx, run_id).await?;
        }

        tx.commit().await?;

        debug!(message_id = message.id, "triage message denied");

        let updated = self
            .messages
            .get_scoped(message.id, req.provider, &req.account_key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("message {}", message.id)))?;

        Ok(DecisionOutcome {
            message: updated,
            stage_event_id: None,
        })
    }

    /// Apply one decision across every pending message for an account.
    ///
    /// Items are decided independently: a lost race counts as skipped, a
    /// failure is recorded and the sweep continues. Only failing to
    /// enumerate the queue aborts the whole batch.
    ///
    /// # Errors
    ///
    /// Returns an error only if listing the pending queue fails.
    pub async fn bulk(&self, req: BulkRequest) -> Result<BulkOutcome> {
        let pending = self
            .messages
            .list_pending(req.provider, &req.account_key, PENDING_LIST_LIMIT)
            .await?;

        let mut outcome = BulkOutcome {
            requested: u32::try_from(pending.len()).unwrap_or(u32::MAX),
            succeeded: 0,
            failed: 0,
            skipped: 0,
            results: Vec::with_capacity(pending.len()),
        };

        for message in &pending {
            let status = match req.action {
                BulkAction::Approve => {
                    if message.matched_job_id.is_none() {
                        // Nothing to link to; not worth an attempt.
                        BulkItemStatus::Skipped {
                            reason: SKIP_NO_SUGGESTED_MATCH,
                        }
                    } else {
                        let item = self
                            .approve(ApproveRequest {
                                message_id: message.id,
                                provider: req.provider,
                                account_key: req.account_key.clone(),
                                decided_by: req.decided_by.clone(),
                                ..ApproveRequest::default()
                            })
                            .await;
                        Self::bulk_status(item.map(|o| BulkItemStatus::Approved {
                            stage_event_id: o.stage_event_id,
                        }))
                    }
                }
                BulkAction::Deny => {
                    let item = self
                        .deny(DenyRequest {
                            message_id: message.id,
                            provider: req.provider,
                            account_key: req.account_key.clone(),
                            decided_by: req.decided_by.clone(),
                        })
                        .await;
                    Self::bulk_status(item.map(|_| BulkItemStatus::Denied))
                }
            };

            match &status {
                BulkItemStatus::Approved { .. } | BulkItemStatus::Denied => {
                    outcome.succeeded += 1;
                }
                BulkItemStatus::Skipped { .. } => outcome.skipped += 1,
                BulkItemStatus::Failed { .. } => outcome.failed += 1,
            }

            outcome.results.push(BulkItemResult {
                message_id: message.id,
                status,
            });
        }

        info!(
            requested = outcome.requested,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            skipped = outcome.skipped,
            "bulk triage sweep finished"
        );

        Ok(outcome)
    }

    /// List pending messages for an account with their resolved jobs.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_inbox(
        &self,
        provider: Provider,
        account_key: &str,
        limit: u32,
    ) -> Result<Vec<InboxItem>> {
        let pending = self.messages.list_pending(provider, account_key, limit).await?;
        self.with_job_summaries(pending).await
    }

    /// List sync runs for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_runs(
        &self,
        provider: Provider,
        account_key: &str,
        limit: u32,
    ) -> Result<Vec<PostApplicationSyncRun>> {
        self.runs.list(provider, account_key, limit).await
    }

    /// Fetch a run and every message it ingested.
    ///
    /// # Errors
    ///
    /// `NotFound` if the run does not exist.
    pub async fn list_run_messages(&self, run_id: i64) -> Result<RunMessages> {
        let run = self
            .runs
            .get(run_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sync run {run_id}")))?;

        let messages = self.messages.list_by_run(run_id).await?;
        let items = self.with_job_summaries(messages).await?;

        Ok(RunMessages { run, items })
    }

    /// Wrap a bulk item result, folding conflicts into skips.
    fn bulk_status(item: Result<BulkItemStatus>) -> BulkItemStatus {
        match item {
            Ok(status) => status,
            Err(e) if e.is_conflict() => BulkItemStatus::Skipped {
                reason: SKIP_ALREADY_DECIDED,
            },
            Err(e) => BulkItemStatus::Failed {
                error: e.to_string(),
            },
        }
    }

    /// Re-read a message that just refused a conditional update and build
    /// the conflict error carrying its actual status.
    async fn conflict_for(&self, message_id: i64, provider: Provider, account_key: &str) -> Error {
        match self.messages.get_scoped(message_id, provider, account_key).await {
            Ok(Some(current)) => Error::Conflict(current.processing_status),
            Ok(None) => Error::NotFound(format!("message {message_id}")),
            Err(e) => e,
        }
    }

    /// Attach job summaries to messages that carry a match.
    async fn with_job_summaries(
        &self,
        messages: Vec<PostApplicationMessage>,
    ) -> Result<Vec<InboxItem>> {
        let mut ids: Vec<JobId> = messages.iter().filter_map(|m| m.matched_job_id).collect();
        ids.sort_unstable_by_key(|id| id.0);
        ids.dedup();

        let summaries: HashMap<i64, JobSummary> = self
            .jobs
            .list_summaries_by_ids(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id.0, s))
            .collect();

        Ok(messages
            .into_iter()
            .map(|message| {
                let job = message
                    .matched_job_id
                    .and_then(|id| summaries.get(&id.0).cloned());
                InboxItem { message, job }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db;
    use crate::jobs::ApplicationStage;
    use crate::triage::model::{MessageType, NewTriageMessage};
    use crate::triage::resolver::REASON_MANUAL_LINKED;

    struct Fixture {
        pool: SqlitePool,
        engine: DecisionEngine,
        messages: TriageRepository,
        jobs: JobRepository,
        runs: SyncRunRepository,
    }

    async fn fixture() -> Fixture {
        let pool = db::connect_in_memory().await.unwrap();
        Fixture {
            engine: DecisionEngine::new(pool.clone()),
            messages: TriageRepository::new(pool.clone()),
            jobs: JobRepository::new(pool.clone()),
            runs: SyncRunRepository::new(pool.clone()),
            pool,
        }
    }

    fn pending_message(native_id: &str, job: Option<JobId>) -> NewTriageMessage {
        NewTriageMessage {
            provider: Provider::Gmail,
            account_key: "default".to_string(),
            native_message_id: native_id.to_string(),
            message_type: MessageType::Interview,
            matched_job_id: job,
            stage_target: None,
            received_at: 1_770_000_000_000,
            sync_run_id: None,
        }
    }

    fn approve_req(message_id: i64) -> ApproveRequest {
        ApproveRequest {
            message_id,
            provider: Provider::Gmail,
            account_key: "default".to_string(),
            ..ApproveRequest::default()
        }
    }

    fn deny_req(message_id: i64) -> DenyRequest {
        DenyRequest {
            message_id,
            provider: Provider::Gmail,
            account_key: "default".to_string(),
            decided_by: None,
        }
    }

    #[tokio::test]
    async fn test_approve_with_suggested_match() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();
        let message = f
            .messages
            .insert_message(&pending_message("m-1", Some(job.id)))
            .await
            .unwrap()
            .unwrap();

        let outcome = f.engine.approve(approve_req(message.id)).await.unwrap();

        assert_eq!(
            outcome.message.processing_status,
            ProcessingStatus::ManualLinked
        );
        assert_eq!(outcome.message.matched_job_id, Some(job.id));
        assert!(outcome.message.decided_at.is_some());
        assert_eq!(outcome.message.decided_by.as_deref(), Some("user"));
        assert!(outcome.stage_event_id.is_some());

        // The interview-typed message advanced the job.
        let advanced = f.jobs.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(advanced.stage, ApplicationStage::Interview);

        let events = f.jobs.list_stage_events(job.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metadata.actor, "system");
        assert_eq!(events[0].metadata.reason_code, "post_application_interview");
        assert_eq!(events[0].metadata.message_id, message.id);
        // Timestamped at receive time, in seconds.
        assert_eq!(events[0].occurred_at, 1_770_000_000);
    }

    #[tokio::test]
    async fn test_approve_without_any_job_is_unprocessable() {
        let f = fixture().await;
        let message = f
            .messages
            .insert_message(&pending_message("m-1", None))
            .await
            .unwrap()
            .unwrap();

        let err = f.engine.approve(approve_req(message.id)).await.unwrap_err();
        assert!(matches!(err, Error::MissingJobLink(_)));

        // Nothing was decided.
        let current = f
            .messages
            .get_scoped(message.id, Provider::Gmail, "default")
            .await
            .unwrap()
            .unwrap();
        assert!(current.is_pending());
    }

    #[tokio::test]
    async fn test_approve_with_dangling_job_is_not_found() {
        let f = fixture().await;
        let message = f
            .messages
            .insert_message(&pending_message("m-1", Some(JobId::new(404))))
            .await
            .unwrap()
            .unwrap();

        let err = f.engine.approve(approve_req(message.id)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_approve_out_of_scope_is_not_found() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();
        let message = f
            .messages
            .insert_message(&pending_message("m-1", Some(job.id)))
            .await
            .unwrap()
            .unwrap();

        let mut req = approve_req(message.id);
        req.account_key = "somebody-else".to_string();
        let err = f.engine.approve(req).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_approve_no_change_links_without_event() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();
        let message = f
            .messages
            .insert_message(&pending_message("m-1", Some(job.id)))
            .await
            .unwrap()
            .unwrap();

        let mut req = approve_req(message.id);
        req.stage_target = Some(StageTarget::NoChange);
        let outcome = f.engine.approve(req).await.unwrap();

        assert_eq!(
            outcome.message.processing_status,
            ProcessingStatus::ManualLinked
        );
        assert!(outcome.stage_event_id.is_none());
        assert!(f.jobs.list_stage_events(job.id).await.unwrap().is_empty());

        let unchanged = f.jobs.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stage, ApplicationStage::Applied);
    }

    #[tokio::test]
    async fn test_approve_explicit_target_records_manual_reason() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();
        let message = f
            .messages
            .insert_message(&pending_message("m-1", Some(job.id)))
            .await
            .unwrap()
            .unwrap();

        let mut req = approve_req(message.id);
        req.stage_target = Some(StageTarget::Offer);
        req.note = Some("verbal offer on the call".to_string());
        f.engine.approve(req).await.unwrap();

        let events = f.jobs.list_stage_events(job.id).await.unwrap();
        assert_eq!(events[0].metadata.reason_code, REASON_MANUAL_LINKED);
        assert_eq!(
            events[0].metadata.note.as_deref(),
            Some("verbal offer on the call")
        );
        assert_eq!(events[0].to_stage, ApplicationStage::Offer);
    }

    #[tokio::test]
    async fn test_approve_twice_reports_conflict_with_status() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();
        let message = f
            .messages
            .insert_message(&pending_message("m-1", Some(job.id)))
            .await
            .unwrap()
            .unwrap();

        f.engine.approve(approve_req(message.id)).await.unwrap();
        let err = f.engine.approve(approve_req(message.id)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Conflict(ProcessingStatus::ManualLinked)
        ));
    }

    #[tokio::test]
    async fn test_deny_then_deny_reports_conflict() {
        let f = fixture().await;
        let message = f
            .messages
            .insert_message(&pending_message("m-1", None))
            .await
            .unwrap()
            .unwrap();

        f.engine.deny(deny_req(message.id)).await.unwrap();
        let err = f.engine.deny(deny_req(message.id)).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(ProcessingStatus::Ignored)));
    }

    #[tokio::test]
    async fn test_deny_clears_suggested_match() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();
        let message = f
            .messages
            .insert_message(&pending_message("m-1", Some(job.id)))
            .await
            .unwrap()
            .unwrap();

        let outcome = f.engine.deny(deny_req(message.id)).await.unwrap();
        assert_eq!(outcome.message.processing_status, ProcessingStatus::Ignored);
        assert_eq!(outcome.message.matched_job_id, None);
        assert!(outcome.stage_event_id.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_approves_one_wins() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();

        let run = f.runs.start_run(Provider::Gmail, "default").await.unwrap();
        let mut new = pending_message("m-1", Some(job.id));
        new.sync_run_id = Some(run.id);
        let message = f.messages.insert_message(&new).await.unwrap().unwrap();

        let engine = Arc::new(DecisionEngine::new(f.pool.clone()));
        let (a, b) = tokio::join!(
            {
                let engine = Arc::clone(&engine);
                async move { engine.approve(approve_req(message.id)).await }
            },
            {
                let engine = Arc::clone(&engine);
                async move { engine.approve(approve_req(message.id)).await }
            }
        );

        let outcomes = [a, b];
        let wins = outcomes.iter().filter(|r| r.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(Error::Conflict(_))))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);

        // Exactly one stage event, one counter bump.
        let events = f.jobs.list_stage_events(job.id).await.unwrap();
        assert_eq!(events.len(), 1);
        let current_run = f.runs.get(run.id).await.unwrap().unwrap();
        assert_eq!(current_run.messages_approved, 1);
    }

    #[tokio::test]
    async fn test_decision_updates_run_counters() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();
        let run = f.runs.start_run(Provider::Gmail, "default").await.unwrap();

        let mut approve_me = pending_message("m-1", Some(job.id));
        approve_me.sync_run_id = Some(run.id);
        let mut deny_me = pending_message("m-2", None);
        deny_me.sync_run_id = Some(run.id);

        let m1 = f.messages.insert_message(&approve_me).await.unwrap().unwrap();
        let m2 = f.messages.insert_message(&deny_me).await.unwrap().unwrap();

        f.engine.approve(approve_req(m1.id)).await.unwrap();
        f.engine.deny(deny_req(m2.id)).await.unwrap();

        let current = f.runs.get(run.id).await.unwrap().unwrap();
        assert_eq!(current.messages_approved, 1);
        assert_eq!(current.messages_denied, 1);
    }

    #[tokio::test]
    async fn test_bulk_approve_skips_and_succeeds() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();

        f.messages
            .insert_message(&pending_message("m-1", Some(job.id)))
            .await
            .unwrap();
        f.messages
            .insert_message(&pending_message("m-2", None))
            .await
            .unwrap();
        f.messages
            .insert_message(&pending_message("m-3", None))
            .await
            .unwrap();

        let outcome = f
            .engine
            .bulk(BulkRequest {
                action: BulkAction::Approve,
                provider: Provider::Gmail,
                account_key: "default".to_string(),
                decided_by: Some("sweep".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(outcome.requested, 3);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.results.len(), 3);

        let skip_reasons: Vec<_> = outcome
            .results
            .iter()
            .filter_map(|r| match &r.status {
                BulkItemStatus::Skipped { reason } => Some(*reason),
                _ => None,
            })
            .collect();
        assert_eq!(skip_reasons, vec![SKIP_NO_SUGGESTED_MATCH; 2]);

        // The suggestion-less messages are still pending.
        let remaining = f
            .messages
            .list_pending(Provider::Gmail, "default", 100)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_approve_records_failure_and_continues() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();

        // Dangling suggestion: the approval attempt fails with NotFound.
        f.messages
            .insert_message(&pending_message("m-1", Some(JobId::new(404))))
            .await
            .unwrap();
        f.messages
            .insert_message(&pending_message("m-2", Some(job.id)))
            .await
            .unwrap();

        let outcome = f
            .engine
            .bulk(BulkRequest {
                action: BulkAction::Approve,
                provider: Provider::Gmail,
                account_key: "default".to_string(),
                decided_by: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.requested, 2);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.skipped, 0);

        let failed: Vec<_> = outcome
            .results
            .iter()
            .filter(|r| matches!(r.status, BulkItemStatus::Failed { .. }))
            .collect();
        assert_eq!(failed.len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_deny_needs_no_match() {
        let f = fixture().await;

        f.messages
            .insert_message(&pending_message("m-1", None))
            .await
            .unwrap();
        f.messages
            .insert_message(&pending_message("m-2", None))
            .await
            .unwrap();

        let outcome = f
            .engine
            .bulk(BulkRequest {
                action: BulkAction::Deny,
                provider: Provider::Gmail,
                account_key: "default".to_string(),
                decided_by: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.skipped, 0);

        let remaining = f
            .messages
            .list_pending(Provider::Gmail, "default", 100)
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_list_inbox_resolves_jobs() {
        let f = fixture().await;
        let job = f.jobs.insert_job("Engineer", "Acme").await.unwrap();

        f.messages
            .insert_message(&pending_message("m-1", Some(job.id)))
            .await
            .unwrap();
        f.messages
            .insert_message(&pending_message("m-2", None))
            .await
            .unwrap();

        let items = f
            .engine
            .list_inbox(Provider::Gmail, "default", 100)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);

        let with_job = items
            .iter()
            .find(|i| i.message.native_message_id == "m-1")
            .unwrap();
        assert_eq!(with_job.job.as_ref().unwrap().company, "Acme");

        let without_job = items
            .iter()
            .find(|i| i.message.native_message_id == "m-2")
            .unwrap();
        assert!(without_job.job.is_none());
    }

    #[tokio::test]
    async fn test_list_run_messages() {
        let f = fixture().await;
        let run = f.runs.start_run(Provider::Gmail, "default").await.unwrap();

        let mut new = pending_message("m-1", None);
        new.sync_run_id = Some(run.id);
        f.messages.insert_message(&new).await.unwrap();

        let listing = f.engine.list_run_messages(run.id).await.unwrap();
        assert_eq!(listing.run.id, run.id);
        assert_eq!(listing.items.len(), 1);

        let err = f.engine.list_run_messages(9999).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
