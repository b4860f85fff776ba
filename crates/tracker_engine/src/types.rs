use std::fmt;

/// Opaque job identifier issued by the backend.
pub type JobId = String;

/// Job lifecycle as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// One decoded status payload for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: JobStatus,
    /// Clamped to [0,100] at decode time.
    pub progress: u8,
    pub current_action: Option<String>,
    pub error: Option<String>,
}

/// Request to create a new backlog-generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJobRequest {
    pub project_name: String,
    pub vision: Option<String>,
}

/// Successful creation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedJob {
    pub job_id: JobId,
}

/// Everything the engine reports back to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    JobCreated {
        job_id: JobId,
        project_name: String,
    },
    SubmitFailed {
        message: String,
    },
    /// A query or push frame delivered a fresh report.
    Status {
        job_id: JobId,
        report: StatusReport,
    },
    /// Transient failure; the consumer keeps its stale record.
    StatusUnavailable {
        job_id: JobId,
        message: String,
    },
    /// Authoritative deletion signal from the backend.
    JobMissing {
        job_id: JobId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiFailure,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Only a definitive not-found response is authoritative; everything
    /// else is retried on the next cycle.
    pub fn is_not_found(&self) -> bool {
        self.kind == ApiFailure::NotFound
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    InvalidBaseUrl,
    /// The job no longer exists server-side.
    NotFound,
    HttpStatus(u16),
    Timeout,
    /// Unparseable or unexpected response shape; treated as transient.
    Malformed,
    Network,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::InvalidBaseUrl => write!(f, "invalid base url"),
            ApiFailure::NotFound => write!(f, "not found"),
            ApiFailure::HttpStatus(code) => write!(f, "http status {code}"),
            ApiFailure::Timeout => write!(f, "timeout"),
            ApiFailure::Malformed => write!(f, "malformed response"),
            ApiFailure::Network => write!(f, "network error"),
        }
    }
}
