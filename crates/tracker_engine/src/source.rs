use std::sync::Arc;

use futures_util::future::join_all;
use tracker_logging::{tracker_info, tracker_warn};

use crate::client::StatusApi;
use crate::types::{EngineEvent, JobId};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Polling progress source: one independent status query per tracked job.
pub struct PollingSource {
    api: Arc<dyn StatusApi>,
}

impl PollingSource {
    pub fn new(api: Arc<dyn StatusApi>) -> Self {
        Self { api }
    }

    /// Runs one reconcile cycle over `job_ids`, emitting one event per job.
    ///
    /// Queries run concurrently and failures are isolated: a transport error
    /// for one job never aborts the remaining queries.
    pub async fn refresh(&self, job_ids: &[JobId], sink: &dyn ProgressSink) {
        let queries = job_ids.iter().map(|job_id| {
            let api = self.api.clone();
            async move {
                match api.fetch_status(job_id).await {
                    Ok(report) => EngineEvent::Status {
                        job_id: job_id.clone(),
                        report,
                    },
                    Err(err) if err.is_not_found() => {
                        tracker_info!("Job {} no longer exists server-side", job_id);
                        EngineEvent::JobMissing {
                            job_id: job_id.clone(),
                        }
                    }
                    Err(err) => {
                        tracker_warn!("Status query for {} failed: {}", job_id, err);
                        EngineEvent::StatusUnavailable {
                            job_id: job_id.clone(),
                            message: err.to_string(),
                        }
                    }
                }
            }
        });

        for event in join_all(queries).await {
            sink.emit(event);
        }
    }
}
