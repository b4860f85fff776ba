use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use tracker_core::{Effect, Msg, TrackerState};
use tracker_engine::{EngineEvent, EngineHandle};
use tracker_logging::{tracker_debug, tracker_error, tracker_info, tracker_warn};

use crate::persistence;

/// Executes core effects against the engine and the persisted cache.
pub struct EffectRunner {
    engine: EngineHandle,
    state_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, state_dir: PathBuf) -> Self {
        Self { engine, state_dir }
    }

    /// Applies one batch of effects. The cycle's status queries are handed
    /// to the engine as a single refresh; the cache is rewritten wholesale.
    pub fn apply(&self, effects: Vec<Effect>, state: &TrackerState) {
        let mut job_ids = Vec::new();
        let mut persist = false;
        for effect in effects {
            match effect {
                Effect::FetchStatus { job_id } => job_ids.push(job_id),
                Effect::PersistCache => persist = true,
            }
        }
        if !job_ids.is_empty() {
            tracker_debug!("Refreshing {} job(s)", job_ids.len());
            self.engine.refresh(job_ids);
        }
        if persist {
            persistence::save_jobs(&self.state_dir, &state.jobs_snapshot());
        }
    }
}

/// Pumps engine events into core messages on a background thread.
pub fn spawn_event_pump(
    event_rx: mpsc::Receiver<EngineEvent>,
    msg_tx: mpsc::Sender<Msg>,
    clock: fn() -> u64,
) {
    thread::spawn(move || {
        while let Ok(event) = event_rx.recv() {
            let msg = match event {
                EngineEvent::JobCreated {
                    job_id,
                    project_name,
                } => {
                    tracker_info!("Backend created job {} for {}", job_id, project_name);
                    Msg::JobSubmitted {
                        job_id,
                        project_name,
                        now: clock(),
                    }
                }
                EngineEvent::SubmitFailed { message } => {
                    tracker_error!("Backlog creation failed: {}", message);
                    Msg::NoOp
                }
                EngineEvent::Status { job_id, report } => Msg::StatusFetched {
                    job_id,
                    report: map_report(report),
                },
                EngineEvent::StatusUnavailable { job_id, message } => {
                    tracker_warn!("Could not refresh status of {}: {}", job_id, message);
                    Msg::StatusUnavailable { job_id }
                }
                EngineEvent::JobMissing { job_id } => Msg::JobMissing { job_id },
            };
            if msg_tx.send(msg).is_err() {
                break;
            }
        }
    });
}

fn map_report(report: tracker_engine::StatusReport) -> tracker_core::StatusReport {
    tracker_core::StatusReport {
        status: map_status(report.status),
        progress: report.progress,
        current_action: report.current_action,
        error: report.error,
    }
}

fn map_status(status: tracker_engine::JobStatus) -> tracker_core::JobStatus {
    match status {
        tracker_engine::JobStatus::Queued => tracker_core::JobStatus::Queued,
        tracker_engine::JobStatus::Running => tracker_core::JobStatus::Running,
        tracker_engine::JobStatus::Completed => tracker_core::JobStatus::Completed,
        tracker_engine::JobStatus::Failed => tracker_core::JobStatus::Failed,
    }
}
