//! Tracker core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    EpochMillis, JobId, JobRecord, JobSnapshot, JobStatus, StatusReport, TrackerState,
    DEFAULT_RETENTION_MS, QUERY_EXPIRY_MS,
};
pub use update::update;
pub use view_model::{JobRowView, TrackerViewModel};
