use std::collections::BTreeMap;

use crate::view_model::{JobRowView, TrackerViewModel};

/// Opaque job identifier issued by the backend at job creation.
pub type JobId = String;

/// Milliseconds since the Unix epoch, supplied by the caller.
pub type EpochMillis = u64;

/// How long a terminal job stays visible before it is pruned.
pub const DEFAULT_RETENTION_MS: u64 = 10 * 60 * 1000;

/// How long a job stays marked in-flight before its query is re-issued.
/// Covers queries whose answer never arrives, e.g. when the transport
/// drops a cycle.
pub const QUERY_EXPIRY_MS: u64 = 60 * 1000;

/// Backend-owned job lifecycle. The client only mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One outstanding or recently finished generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub job_id: JobId,
    pub project_name: String,
    /// Creation timestamp; used only to compute age for pruning.
    pub started_at: EpochMillis,
    pub status: JobStatus,
    /// Percentage in [0,100]; the backend is the source of truth.
    pub progress: u8,
    pub current_action: Option<String>,
    /// Populated only when the backend reports a failure.
    pub error: Option<String>,
}

/// The mutable fields a status response overwrites wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: JobStatus,
    pub progress: u8,
    pub current_action: Option<String>,
    pub error: Option<String>,
}

/// Serializable mirror of a [`JobRecord`] used by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub project_name: String,
    pub started_at: EpochMillis,
    pub status: JobStatus,
    pub progress: u8,
    pub current_action: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    /// Exactly one record per job id; BTreeMap keeps row order deterministic.
    jobs: BTreeMap<JobId, JobRecord>,
    /// Jobs with a status query outstanding, keyed to when it was issued;
    /// guards against stacked queries when a cycle outlives the poll
    /// interval.
    in_flight: BTreeMap<JobId, EpochMillis>,
    retention_ms: u64,
    dirty: bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerState {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION_MS)
    }

    pub fn with_retention(retention_ms: u64) -> Self {
        Self {
            jobs: BTreeMap::new(),
            in_flight: BTreeMap::new(),
            retention_ms,
            dirty: false,
        }
    }

    pub fn view(&self) -> TrackerViewModel {
        let jobs: Vec<JobRowView> = self
            .jobs
            .values()
            .map(|record| JobRowView {
                job_id: record.job_id.clone(),
                project_name: record.project_name.clone(),
                status: record.status,
                progress: record.progress,
                current_action: record.current_action.clone(),
                error: record.error.clone(),
                started_at: record.started_at,
            })
            .collect();
        let active_count = self
            .jobs
            .values()
            .filter(|record| !record.status.is_terminal())
            .count();
        TrackerViewModel { jobs, active_count }
    }

    /// Returns whether a render is due and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn job(&self, job_id: &str) -> Option<&JobRecord> {
        self.jobs.get(job_id)
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Snapshot of every tracked job, for wholesale persistence.
    pub fn jobs_snapshot(&self) -> Vec<JobSnapshot> {
        self.jobs
            .values()
            .map(|record| JobSnapshot {
                job_id: record.job_id.clone(),
                project_name: record.project_name.clone(),
                started_at: record.started_at,
                status: record.status,
                progress: record.progress,
                current_action: record.current_action.clone(),
                error: record.error.clone(),
            })
            .collect()
    }

    pub(crate) fn insert_job(&mut self, job_id: JobId, project_name: String, now: EpochMillis) {
        // Backend-issued ids are assumed unique; a duplicate overwrites silently.
        let record = JobRecord {
            job_id: job_id.clone(),
            project_name,
            started_at: now,
            status: JobStatus::Queued,
            progress: 0,
            current_action: None,
            error: None,
        };
        self.jobs.insert(job_id.clone(), record);
        self.in_flight.remove(&job_id);
        self.dirty = true;
    }

    pub(crate) fn remove_job(&mut self, job_id: &str) -> bool {
        self.in_flight.remove(job_id);
        let removed = self.jobs.remove(job_id).is_some();
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Drops terminal jobs older than the retention window. Returns how many
    /// were pruned.
    pub(crate) fn prune_expired(&mut self, now: EpochMillis) -> usize {
        let expired: Vec<JobId> = self
            .jobs
            .values()
            .filter(|record| {
                record.status.is_terminal()
                    && now.saturating_sub(record.started_at) > self.retention_ms
            })
            .map(|record| record.job_id.clone())
            .collect();
        for job_id in &expired {
            self.jobs.remove(job_id);
            self.in_flight.remove(job_id);
        }
        if !expired.is_empty() {
            self.dirty = true;
        }
        expired.len()
    }

    /// Marks every job without a live outstanding query as in flight and
    /// returns their ids in map order. Marks older than [`QUERY_EXPIRY_MS`]
    /// no longer count as outstanding.
    pub(crate) fn begin_queries(&mut self, now: EpochMillis) -> Vec<JobId> {
        let due: Vec<JobId> = self
            .jobs
            .keys()
            .filter(|job_id| match self.in_flight.get(*job_id) {
                Some(issued) => now.saturating_sub(*issued) > QUERY_EXPIRY_MS,
                None => true,
            })
            .cloned()
            .collect();
        for job_id in &due {
            self.in_flight.insert(job_id.clone(), now);
        }
        due
    }

    pub(crate) fn finish_query(&mut self, job_id: &str) {
        self.in_flight.remove(job_id);
    }

    /// Overwrites the mutable fields from a status response. Returns whether
    /// the record changed. A report for an untracked job is dropped.
    pub(crate) fn apply_report(&mut self, job_id: &str, report: StatusReport) -> bool {
        let Some(record) = self.jobs.get_mut(job_id) else {
            return false;
        };
        let progress = report.progress.min(100);
        let changed = record.status != report.status
            || record.progress != progress
            || record.current_action != report.current_action
            || record.error != report.error;
        record.status = report.status;
        record.progress = progress;
        record.current_action = report.current_action;
        record.error = report.error;
        if changed {
            self.dirty = true;
        }
        changed
    }

    pub(crate) fn restore(&mut self, snapshots: Vec<JobSnapshot>) {
        for snapshot in snapshots {
            let record = JobRecord {
                job_id: snapshot.job_id.clone(),
                project_name: snapshot.project_name,
                started_at: snapshot.started_at,
                status: snapshot.status,
                progress: snapshot.progress.min(100),
                current_action: snapshot.current_action,
                error: snapshot.error,
            };
            self.jobs.insert(snapshot.job_id, record);
        }
        self.in_flight.clear();
        self.dirty = true;
    }
}
