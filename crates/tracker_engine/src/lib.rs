//! Tracker engine: HTTP status client, progress sources and effect execution.
mod client;
mod engine;
mod persist;
mod push;
mod source;
mod types;

pub use client::{ApiSettings, ReqwestStatusApi, StatusApi};
pub use engine::{EngineHandle, EngineSettings};
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use push::{probe_push_channel, PushSettings, PushSource, SseFrameDecoder};
pub use source::{ChannelProgressSink, PollingSource, ProgressSink};
pub use types::{
    ApiError, ApiFailure, CreatedJob, EngineEvent, JobId, JobStatus, NewJobRequest, StatusReport,
};
