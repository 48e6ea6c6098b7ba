//! Triage data models.

use jobtrail_mail::Provider;
use serde::{Deserialize, Serialize};

use crate::jobs::JobId;

/// Workflow state of a triage message.
///
/// `PendingUser` is the only non-terminal state: approval moves a message
/// to `ManualLinked`, denial to `Ignored`, and nothing leaves a terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingStatus {
    /// Waiting for a user decision.
    #[default]
    PendingUser,
    /// Approved and linked to a job.
    ManualLinked,
    /// Dismissed without linking.
    Ignored,
}

impl ProcessingStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "manual_linked" => Self::ManualLinked,
            "ignored" => Self::Ignored,
            _ => Self::PendingUser,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PendingUser => "pending_user",
            Self::ManualLinked => "manual_linked",
            Self::Ignored => "ignored",
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category the classifier assigns to an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageType {
    /// Application-received confirmation.
    Confirmation,
    /// Rejection notice.
    Rejection,
    /// Recruiter phone-screen invitation.
    PhoneScreen,
    /// Interview invitation or scheduling.
    Interview,
    /// Offer letter or offer discussion.
    Offer,
    /// Could not be categorized.
    #[default]
    Unknown,
}

impl MessageType {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "confirmation" => Self::Confirmation,
            "rejection" => Self::Rejection,
            "phone_screen" => Self::PhoneScreen,
            "interview" => Self::Interview,
            "offer" => Self::Offer,
            _ => Self::Unknown,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmation => "confirmation",
            Self::Rejection => "rejection",
            Self::PhoneScreen => "phone_screen",
            Self::Interview => "interview",
            Self::Offer => "offer",
            Self::Unknown => "unknown",
        }
    }
}

/// Requested destination for an approval, before resolution to a concrete
/// stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageTarget {
    /// Link the message to the job without moving the pipeline.
    NoChange,
    /// Route to the phone-screen stage.
    PhoneScreen,
    /// Route to the interview stage.
    Interview,
    /// Route to the offer stage.
    Offer,
    /// Close the pipeline with a rejected outcome.
    Rejected,
}

impl StageTarget {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "phone_screen" => Self::PhoneScreen,
            "interview" => Self::Interview,
            "offer" => Self::Offer,
            "rejected" => Self::Rejected,
            _ => Self::NoChange,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoChange => "no_change",
            Self::PhoneScreen => "phone_screen",
            Self::Interview => "interview",
            Self::Offer => "offer",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for StageTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// One inbound email mapped into the triage queue.
#[derive(Debug, Clone)]
pub struct PostApplicationMessage {
    /// Unique identifier.
    pub id: i64,
    /// Mailbox vendor the message came from.
    pub provider: Provider,
    /// Mailbox account within the vendor.
    pub account_key: String,
    /// Provider-native message id (dedupe key with provider+account).
    pub native_message_id: String,
    /// Classifier-inferred category.
    pub message_type: MessageType,
    /// Suggested or approved job link. Weak reference: the job is looked
    /// up, never owned.
    pub matched_job_id: Option<JobId>,
    /// Suggested transition target, if the classifier proposed one.
    pub stage_target: Option<StageTarget>,
    /// Receive time in epoch milliseconds; values at or below zero are
    /// treated as unknown.
    pub received_at: i64,
    /// Workflow state.
    pub processing_status: ProcessingStatus,
    /// Decision time in epoch milliseconds. Set exactly when the status
    /// leaves `pending_user`.
    pub decided_at: Option<i64>,
    /// Actor label recorded with the decision.
    pub decided_by: Option<String>,
    /// Sync run that ingested this message.
    pub sync_run_id: Option<i64>,
}

impl PostApplicationMessage {
    /// Check if this message is still awaiting a decision.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.processing_status, ProcessingStatus::PendingUser)
    }
}

/// Insert payload for a freshly ingested message.
#[derive(Debug, Clone)]
pub struct NewTriageMessage {
    /// Mailbox vendor.
    pub provider: Provider,
    /// Mailbox account within the vendor.
    pub account_key: String,
    /// Provider-native message id.
    pub native_message_id: String,
    /// Classifier-inferred category.
    pub message_type: MessageType,
    /// Classifier-suggested job link.
    pub matched_job_id: Option<JobId>,
    /// Classifier-suggested transition target.
    pub stage_target: Option<StageTarget>,
    /// Receive time in epoch milliseconds.
    pub received_at: i64,
    /// Sync run performing the ingestion.
    pub sync_run_id: Option<i64>,
}
