use std::time::Duration;

use tracker_engine::{
    ApiFailure, ApiSettings, JobStatus, NewJobRequest, ReqwestStatusApi, StatusApi,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestStatusApi {
    ReqwestStatusApi::new(ApiSettings::new(server.uri()))
}

#[tokio::test]
async fn fetch_status_decodes_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generation-status/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "{\"status\":\"running\",\"progress\":40,\
             \"currentAction\":\"Decomposing epics\"}",
            "application/json",
        ))
        .mount(&server)
        .await;

    let report = api_for(&server)
        .fetch_status("job-1")
        .await
        .expect("status ok");
    assert_eq!(report.status, JobStatus::Running);
    assert_eq!(report.progress, 40);
    assert_eq!(report.current_action.as_deref(), Some("Decomposing epics"));
    assert_eq!(report.error, None);
}

#[tokio::test]
async fn missing_job_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generation-status/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = api_for(&server).fetch_status("gone").await.unwrap_err();
    assert_eq!(err.kind, ApiFailure::NotFound);
    assert!(err.is_not_found());
}

#[tokio::test]
async fn server_error_maps_to_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generation-status/job-1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = api_for(&server).fetch_status("job-1").await.unwrap_err();
    assert_eq!(err.kind, ApiFailure::HttpStatus(503));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn slow_response_maps_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generation-status/job-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw("{\"status\":\"queued\"}", "application/json"),
        )
        .mount(&server)
        .await;

    let mut settings = ApiSettings::new(server.uri());
    settings.request_timeout = Duration::from_millis(50);
    let err = ReqwestStatusApi::new(settings)
        .fetch_status("job-1")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiFailure::Timeout);
}

#[tokio::test]
async fn unparseable_body_maps_to_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generation-status/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
        .mount(&server)
        .await;

    let err = api_for(&server).fetch_status("job-1").await.unwrap_err();
    assert_eq!(err.kind, ApiFailure::Malformed);
}

#[tokio::test]
async fn unknown_status_value_maps_to_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generation-status/job-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("{\"status\":\"paused\",\"progress\":10}", "application/json"),
        )
        .mount(&server)
        .await;

    let err = api_for(&server).fetch_status("job-1").await.unwrap_err();
    assert_eq!(err.kind, ApiFailure::Malformed);
}

#[tokio::test]
async fn create_job_posts_project_and_returns_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate-backlog"))
        .and(body_string_contains("\"projectName\":\"Alpha\""))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{\"jobId\":\"job-9\"}", "application/json"),
        )
        .mount(&server)
        .await;

    let created = api_for(&server)
        .create_job(&NewJobRequest {
            project_name: "Alpha".to_string(),
            vision: Some("Ship the onboarding flow".to_string()),
        })
        .await
        .expect("create ok");
    assert_eq!(created.job_id, "job-9");
}

#[tokio::test]
async fn create_job_surfaces_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate-backlog"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .create_job(&NewJobRequest {
            project_name: "Alpha".to_string(),
            vision: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiFailure::HttpStatus(422));
}
