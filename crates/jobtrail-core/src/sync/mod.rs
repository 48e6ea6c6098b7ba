//! Mailbox sync runs: the ledger and the ingestion coordinator.

mod coordinator;
mod model;
mod repository;

pub use coordinator::SyncCoordinator;
pub use model::{PostApplicationSyncRun, SyncReport, SyncRunStatus};
pub use repository::SyncRunRepository;
