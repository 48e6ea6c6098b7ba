//! Ingestion coordinator.
//!
//! Drives one sync cycle: pull candidate messages from the mailbox
//! capability, normalize each body, ask the classifier for a suggested
//! match, and persist a pending triage row per message. One message's
//! transient failure never loses the rest of the run.

use std::sync::Arc;
use std::time::Duration;

use jobtrail_mail::{MailAccount, MailProvider, RawMessage, normalize_message};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::model::{SyncReport, SyncRunStatus};
use super::repository::SyncRunRepository;
use crate::error::{Error, Result};
use crate::service::MessageClassifier;
use crate::triage::{NewTriageMessage, TriageRepository};

/// Default deadline for one mailbox or classifier call.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Orchestrates ingestion cycles against a mailbox account.
pub struct SyncCoordinator {
    mail: Arc<dyn MailProvider>,
    classifier: Arc<dyn MessageClassifier>,
    messages: TriageRepository,
    runs: SyncRunRepository,
    call_timeout: Duration,
}

impl SyncCoordinator {
    /// Create a coordinator over a shared pool and the two capabilities.
    #[must_use]
    pub fn new(
        pool: sqlx::sqlite::SqlitePool,
        mail: Arc<dyn MailProvider>,
        classifier: Arc<dyn MessageClassifier>,
    ) -> Self {
        Self {
            mail,
            classifier,
            messages: TriageRepository::new(pool.clone()),
            runs: SyncRunRepository::new(pool),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Override the per-call deadline.
    #[must_use]
    pub const fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Run one ingestion cycle for an account.
    ///
    /// A failure to enumerate candidates fails the run; a failure on an
    /// individual message is logged, counted, and skipped.
    ///
    /// # Errors
    ///
    /// `Timeout` when the mailbox call exceeds its deadline, `Mail` when
    /// the mailbox reports an upstream failure, or a database error.
    pub async fn run_sync(&self, account: &MailAccount) -> Result<SyncReport> {
        let run = self
            .runs
            .start_run(account.provider, &account.account_key)
            .await?;

        info!(
            run_id = run.id,
            provider = %account.provider,
            account_key = %account.account_key,
            "post-application sync started"
        );

        let candidates = match timeout(
            self.call_timeout,
            self.mail.fetch_candidate_messages(account),
        )
        .await
        {
            Err(_) => {
                self.runs
                    .finish_run(run.id, SyncRunStatus::Failed, 0)
                    .await?;
                return Err(Error::Timeout("mail provider"));
            }
            Ok(Err(e)) => {
                self.runs
                    .finish_run(run.id, SyncRunStatus::Failed, 0)
                    .await?;
                return Err(e.into());
            }
            Ok(Ok(candidates)) => candidates,
        };

        let mut report = SyncReport {
            run_id: run.id,
            ..SyncReport::default()
        };

        for raw in &candidates {
            report.seen += 1;
            match self.ingest_one(run.id, account, raw).await {
                Ok(true) => report.ingested += 1,
                Ok(false) => {
                    debug!(native_id = %raw.id, "message already ingested, skipping");
                    report.duplicates += 1;
                }
                Err(e) => {
                    warn!(native_id = %raw.id, error = %e, "failed to ingest message");
                    report.failures += 1;
                }
            }
        }

        self.runs
            .finish_run(run.id, SyncRunStatus::Completed, report.seen)
            .await?;

        info!(
            run_id = run.id,
            seen = report.seen,
            ingested = report.ingested,
            duplicates = report.duplicates,
            failures = report.failures,
            "post-application sync finished"
        );

        Ok(report)
    }

    /// Normalize, classify, and persist one candidate.
    ///
    /// Returns `false` when the message was already ingested by an
    /// earlier run.
    async fn ingest_one(
        &self,
        run_id: i64,
        account: &MailAccount,
        raw: &RawMessage,
    ) -> Result<bool> {
        let body = normalize_message(raw.payload.as_ref());
        let input = raw.classifier_input(&body);

        let classification = match timeout(self.call_timeout, self.classifier.classify(&input))
            .await
        {
            Err(_) => return Err(Error::Timeout("classifier")),
            Ok(result) => result?,
        };

        let new = NewTriageMessage {
            provider: account.provider,
            account_key: account.account_key.clone(),
            native_message_id: raw.id.clone(),
            message_type: classification.message_type,
            matched_job_id: classification.suggested_job_id,
            stage_target: classification.suggested_stage_target,
            received_at: raw.received_at,
            sync_run_id: Some(run_id),
        };

        Ok(self.messages.insert_message(&new).await?.is_some())
    }
}
