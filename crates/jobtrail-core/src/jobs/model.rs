//! Job domain models.

use serde::{Deserialize, Serialize};

/// Unique identifier for a tracked job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub i64);

impl JobId {
    /// Create a new job ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage of a job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApplicationStage {
    /// Application submitted, nothing heard yet.
    #[default]
    Applied,
    /// Recruiter phone screen scheduled or done.
    PhoneScreen,
    /// Interview loop in progress.
    Interview,
    /// Offer received.
    Offer,
    /// Pipeline over, see the recorded outcome.
    Closed,
}

impl ApplicationStage {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "phone_screen" => Self::PhoneScreen,
            "interview" => Self::Interview,
            "offer" => Self::Offer,
            "closed" => Self::Closed,
            _ => Self::Applied,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::PhoneScreen => "phone_screen",
            Self::Interview => "interview",
            Self::Offer => "offer",
            Self::Closed => "closed",
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::PhoneScreen => "Phone screen",
            Self::Interview => "Interview",
            Self::Offer => "Offer",
            Self::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for ApplicationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome recorded when a pipeline closes (or an offer lands).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageOutcome {
    /// Employer rejected the application.
    Rejected,
    /// Candidate withdrew.
    Withdrawn,
    /// Offer accepted.
    Accepted,
}

impl StageOutcome {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rejected" => Some(Self::Rejected),
            "withdrawn" => Some(Self::Withdrawn),
            "accepted" => Some(Self::Accepted),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
            Self::Accepted => "accepted",
        }
    }
}

/// A tracked job application.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Unique identifier.
    pub id: JobId,
    /// Role title.
    pub title: String,
    /// Company name.
    pub company: String,
    /// Current pipeline stage.
    pub stage: ApplicationStage,
}

/// Compact job view for inbox listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    /// Unique identifier.
    pub id: JobId,
    /// Role title.
    pub title: String,
    /// Company name.
    pub company: String,
    /// Current pipeline stage.
    pub stage: ApplicationStage,
}

/// One immutable entry in a job's stage history.
#[derive(Debug, Clone)]
pub struct StageEvent {
    /// Unique identifier.
    pub id: i64,
    /// Job this event belongs to.
    pub job_id: JobId,
    /// Stage the job moved to.
    pub to_stage: ApplicationStage,
    /// When the transition happened, epoch seconds.
    pub occurred_at: i64,
    /// Structured context recorded with the event.
    pub metadata: StageEventMetadata,
    /// Terminal outcome, when the transition carries one.
    pub outcome: Option<StageOutcome>,
}

/// Context attached to a stage event by the triage workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEventMetadata {
    /// Acting party; the triage workflow always writes `system`.
    pub actor: String,
    /// Generated label documenting the routing target.
    pub label: String,
    /// Optional free-form note supplied with the approval.
    pub note: Option<String>,
    /// Machine-readable reason for the transition.
    pub reason_code: String,
    /// Triage message that produced this event.
    pub message_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_stage_roundtrip() {
        for stage in [
            ApplicationStage::Applied,
            ApplicationStage::PhoneScreen,
            ApplicationStage::Interview,
            ApplicationStage::Offer,
            ApplicationStage::Closed,
        ] {
            assert_eq!(ApplicationStage::parse(stage.as_str()), stage);
        }
    }

    #[test]
    fn test_stage_outcome_roundtrip() {
        for outcome in [
            StageOutcome::Rejected,
            StageOutcome::Withdrawn,
            StageOutcome::Accepted,
        ] {
            assert_eq!(StageOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(StageOutcome::parse("ghosted"), None);
    }
}
