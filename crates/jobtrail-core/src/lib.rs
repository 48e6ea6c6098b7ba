//! # jobtrail-core
//!
//! Post-application message triage for the jobtrail application tracker.
//!
//! This crate provides:
//! - **Triage queue** - inbound mail persisted as pending messages with a
//!   classifier-suggested job match
//! - **Decision engine** - approve/deny/bulk protocol with optimistic,
//!   at-most-once stage transitions under concurrent requests
//! - **Stage resolution** - pure mapping from message intent to a
//!   concrete pipeline transition
//! - **Sync ledger** - one row per ingestion cycle with decision counters
//! - **Local storage** (`SQLite`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod db;
mod error;
pub mod jobs;
pub mod service;
pub mod sync;
pub mod triage;

pub use error::{Error, Result};
pub use jobtrail_mail::Provider;
pub use jobs::{
    ApplicationStage, JobId, JobRecord, JobRepository, JobSummary, StageEvent, StageEventMetadata,
    StageOutcome,
};
pub use service::{Classification, ClassifierError, MessageClassifier};
pub use sync::{
    PostApplicationSyncRun, SyncCoordinator, SyncReport, SyncRunRepository, SyncRunStatus,
};
pub use triage::{
    ApproveRequest, BulkAction, BulkItemResult, BulkItemStatus, BulkOutcome, BulkRequest,
    DecisionEngine, DecisionOutcome, DenyRequest, InboxItem, MessageType, NewTriageMessage,
    PostApplicationMessage, ProcessingStatus, RunMessages, StageTarget, TriageRepository,
};
