//! Job records and stage-event history.

mod model;
mod repository;

pub use model::{
    ApplicationStage, JobId, JobRecord, JobSummary, StageEvent, StageEventMetadata, StageOutcome,
};
pub use repository::JobRepository;
