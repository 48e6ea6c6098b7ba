//! Post-application message triage.
//!
//! Inbound mail lands here as pending messages; a human (or a bulk
//! action) approves each one into a job's pipeline or dismisses it.

mod engine;
mod model;
mod repository;
mod resolver;

pub use engine::{
    ApproveRequest, BulkAction, BulkItemResult, BulkItemStatus, BulkOutcome, BulkRequest,
    DecisionEngine, DecisionOutcome, DenyRequest, InboxItem, RunMessages, SKIP_ALREADY_DECIDED,
    SKIP_NO_SUGGESTED_MATCH,
};
pub use model::{MessageType, NewTriageMessage, PostApplicationMessage, ProcessingStatus, StageTarget};
pub use repository::TriageRepository;
pub use resolver::{
    REASON_MANUAL_LINKED, ResolvedTransition, TargetSource, effective_target, resolve_decision,
    resolve_target, target_for_message_type,
};
