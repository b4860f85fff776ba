use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracker_core::{JobSnapshot, JobStatus};
use tracker_engine::AtomicFileWriter;
use tracker_logging::{tracker_error, tracker_info, tracker_warn};

const STATE_FILENAME: &str = ".tracker_jobs.ron";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum PersistedStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedJob {
    job_id: String,
    project_name: String,
    started_at: u64,
    status: PersistedStatus,
    progress: u8,
    current_action: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    jobs: Vec<PersistedJob>,
}

/// Loads the persisted job cache. An absent or unreadable file is an empty
/// cache; the backend remains the authoritative job store.
pub(crate) fn load_jobs(state_dir: &Path) -> Vec<JobSnapshot> {
    let path = state_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Vec::new();
        }
        Err(err) => {
            tracker_warn!("Failed to read persisted jobs from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    let state: PersistedState = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            tracker_warn!("Failed to parse persisted jobs from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    tracker_info!("Loaded {} persisted job(s) from {:?}", state.jobs.len(), path);
    state.jobs.into_iter().map(into_snapshot).collect()
}

/// Rewrites the whole cache file from the given snapshot.
pub(crate) fn save_jobs(state_dir: &Path, jobs: &[JobSnapshot]) {
    let state = PersistedState {
        jobs: jobs.iter().map(from_snapshot).collect(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            tracker_error!("Failed to serialize job cache: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    if let Err(err) = writer.write(STATE_FILENAME, &content) {
        tracker_error!("Failed to write job cache to {:?}: {}", state_dir, err);
    }
}

fn into_snapshot(job: PersistedJob) -> JobSnapshot {
    JobSnapshot {
        job_id: job.job_id,
        project_name: job.project_name,
        started_at: job.started_at,
        status: match job.status {
            PersistedStatus::Queued => JobStatus::Queued,
            PersistedStatus::Running => JobStatus::Running,
            PersistedStatus::Completed => JobStatus::Completed,
            PersistedStatus::Failed => JobStatus::Failed,
        },
        progress: job.progress,
        current_action: job.current_action,
        error: job.error,
    }
}

fn from_snapshot(job: &JobSnapshot) -> PersistedJob {
    PersistedJob {
        job_id: job.job_id.clone(),
        project_name: job.project_name.clone(),
        started_at: job.started_at,
        status: match job.status {
            JobStatus::Queued => PersistedStatus::Queued,
            JobStatus::Running => PersistedStatus::Running,
            JobStatus::Completed => PersistedStatus::Completed,
            JobStatus::Failed => PersistedStatus::Failed,
        },
        progress: job.progress,
        current_action: job.current_action.clone(),
        error: job.error.clone(),
    }
}
