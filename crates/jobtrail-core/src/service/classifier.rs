//! Message classifier capability.
//!
//! Given the normalized text of an inbound message, the classifier
//! suggests a category, a job match, and optionally a stage target. The
//! real implementation sits on an LLM; tests plug in deterministic fakes.

use async_trait::async_trait;

use crate::jobs::JobId;
use crate::triage::{MessageType, StageTarget};

/// Errors that can occur while classifying a message.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The classifier backend returned a non-success response.
    #[error("Classifier upstream error ({status}): {message}")]
    Upstream {
        /// HTTP-ish status code reported by the backend.
        status: u16,
        /// Backend-supplied error detail.
        message: String,
    },

    /// The backend answered with something that does not parse.
    #[error("Invalid classifier response: {0}")]
    InvalidResponse(String),
}

/// What the classifier inferred from one message.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classification {
    /// Inferred message category.
    pub message_type: MessageType,
    /// Suggested job match, when the classifier recognized one.
    pub suggested_job_id: Option<JobId>,
    /// Suggested transition target, when the classifier proposed one.
    pub suggested_stage_target: Option<StageTarget>,
}

/// Capability interface to the message classifier.
#[async_trait]
pub trait MessageClassifier: Send + Sync {
    /// Classifies one message's normalized text block.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend responds with a non-success status
    /// or an answer that does not parse.
    async fn classify(&self, message_text: &str)
    -> std::result::Result<Classification, ClassifierError>;
}
