use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::types::{
    ApiError, ApiFailure, CreatedJob, JobStatus, NewJobRequest, StatusReport,
};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Backend API surface the tracker consumes. Implemented over HTTP in
/// production and faked in tests.
#[async_trait::async_trait]
pub trait StatusApi: Send + Sync {
    async fn create_job(&self, request: &NewJobRequest) -> Result<CreatedJob, ApiError>;

    async fn fetch_status(&self, job_id: &str) -> Result<StatusReport, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestStatusApi {
    settings: ApiSettings,
}

impl ReqwestStatusApi {
    pub fn new(settings: ApiSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, ApiError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiFailure::Network, err.to_string()))
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, ApiError> {
        let base = self.settings.base_url.trim_end_matches('/');
        reqwest::Url::parse(&format!("{base}/{path}"))
            .map_err(|err| ApiError::new(ApiFailure::InvalidBaseUrl, err.to_string()))
    }
}

#[async_trait::async_trait]
impl StatusApi for ReqwestStatusApi {
    async fn create_job(&self, request: &NewJobRequest) -> Result<CreatedJob, ApiError> {
        let url = self.endpoint("generate-backlog")?;
        let client = self.build_client()?;

        let body = serde_json::to_vec(&CreatePayload {
            project_name: &request.project_name,
            vision: request.vision.as_deref(),
        })
        .map_err(|err| ApiError::new(ApiFailure::Malformed, err.to_string()))?;

        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                ApiFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let created: CreateResponse = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(ApiFailure::Malformed, err.to_string()))?;
        Ok(CreatedJob {
            job_id: created.job_id,
        })
    }

    async fn fetch_status(&self, job_id: &str) -> Result<StatusReport, ApiError> {
        let url = self.endpoint(&format!("generation-status/{job_id}"))?;
        let client = self.build_client()?;

        let response = client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::new(ApiFailure::NotFound, "job not found"));
        }
        if !status.is_success() {
            return Err(ApiError::new(
                ApiFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let wire: WireStatus = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(ApiFailure::Malformed, err.to_string()))?;
        decode_report(wire)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiFailure::Timeout, err.to_string());
    }
    ApiError::new(ApiFailure::Network, err.to_string())
}

/// Status payload shape shared by the polling endpoint and push frames.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireStatus {
    pub(crate) status: String,
    pub(crate) progress: Option<f64>,
    pub(crate) current_action: Option<String>,
    pub(crate) error: Option<String>,
}

pub(crate) fn decode_report(wire: WireStatus) -> Result<StatusReport, ApiError> {
    let status = match wire.status.as_str() {
        "queued" => JobStatus::Queued,
        "running" => JobStatus::Running,
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        other => {
            return Err(ApiError::new(
                ApiFailure::Malformed,
                format!("unknown job status {other:?}"),
            ));
        }
    };
    let progress = wire.progress.unwrap_or(0.0).clamp(0.0, 100.0).round() as u8;
    Ok(StatusReport {
        status,
        progress,
        current_action: wire.current_action,
        error: wire.error,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePayload<'a> {
    project_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    vision: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    job_id: String,
}
