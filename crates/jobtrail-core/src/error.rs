//! Error types for the core library.

use thiserror::Error;

use crate::triage::ProcessingStatus;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Mailbox capability failed.
    #[error("Mail error: {0}")]
    Mail(#[from] jobtrail_mail::Error),

    /// Classifier capability failed.
    #[error("Classifier error: {0}")]
    Classifier(#[from] crate::service::ClassifierError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Message, job, or sync run absent (or outside the caller's account
    /// scope, which is indistinguishable on purpose).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The message was already decided; carries the status it holds.
    #[error("Message already decided: {0}")]
    Conflict(ProcessingStatus),

    /// Approval had no job to link to: no caller-supplied job and no
    /// suggested match on the message.
    #[error("No job to link: {0}")]
    MissingJobLink(String),

    /// An upstream capability call exceeded its deadline.
    #[error("Call to {0} timed out")]
    Timeout(&'static str),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors that mean "someone else already resolved this",
    /// which bulk operations count as skipped rather than failed.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
