use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::client::{decode_report, WireStatus};
use crate::source::ProgressSink;
use crate::types::EngineEvent;

const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

#[derive(Debug, Clone)]
pub struct PushSettings {
    pub events_url: String,
    pub connect_timeout: Duration,
    pub reconnect_delay: Duration,
}

impl PushSettings {
    pub fn new(events_url: impl Into<String>) -> Self {
        Self {
            events_url: events_url.into(),
            connect_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

// The event stream is long-lived, so no overall request timeout here.
fn build_stream_client(settings: &PushSettings) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .build()
}

/// Capability probe: does the backend advertise the server-push channel?
pub async fn probe_push_channel(settings: &PushSettings) -> bool {
    let client = match build_stream_client(settings) {
        Ok(client) => client,
        Err(err) => {
            tracker_warn!("Could not build probe client: {}", err);
            return false;
        }
    };

    match client
        .get(&settings.events_url)
        .header(ACCEPT, EVENT_STREAM_CONTENT_TYPE)
        .send()
        .await
    {
        Ok(response) => {
            response.status().is_success()
                && response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .is_some_and(|ct| ct.starts_with(EVENT_STREAM_CONTENT_TYPE))
        }
        Err(err) => {
            tracker_debug!("Push channel probe failed: {}", err);
            false
        }
    }
}

/// Incremental decoder for `text/event-stream` framing.
///
/// `data:` lines accumulate until a blank line terminates the event;
/// comment lines and other fields are ignored.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    pending: String,
    data: Vec<String>,
}

impl SseFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the data payloads of completed events.
    pub fn push_chunk(&mut self, chunk: &str) -> Vec<String> {
        let mut completed = Vec::new();
        self.pending.push_str(chunk);
        while let Some(newline) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=newline).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if !self.data.is_empty() {
                    completed.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data
                    .push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
        }
        completed
    }
}

/// Push frames carry the same status payload as the polling endpoint,
/// keyed by job id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushFrame {
    job_id: String,
    #[serde(flatten)]
    status: WireStatus,
}

fn decode_frame(payload: &str) -> Option<EngineEvent> {
    let frame: PushFrame = match serde_json::from_str(payload) {
        Ok(frame) => frame,
        Err(err) => {
            tracker_warn!("Skipping malformed push frame: {}", err);
            return None;
        }
    };
    match decode_report(frame.status) {
        Ok(report) => Some(EngineEvent::Status {
            job_id: frame.job_id,
            report,
        }),
        Err(err) => {
            tracker_warn!("Skipping push frame for {}: {}", frame.job_id, err);
            None
        }
    }
}

/// Server-push progress source. Polling remains the required fallback:
/// the shared `active` flag is true exactly while a session is connected,
/// and the poller takes over whenever it is false.
pub struct PushSource {
    settings: PushSettings,
    active: Arc<AtomicBool>,
}

impl PushSource {
    pub fn new(settings: PushSettings, active: Arc<AtomicBool>) -> Self {
        Self { settings, active }
    }

    /// Keeps a stream session open, reconnecting with a fixed delay.
    pub async fn run(&self, sink: &dyn ProgressSink) {
        loop {
            match self.run_session(sink).await {
                Ok(()) => tracker_info!("Push channel closed by server, reconnecting"),
                Err(err) => tracker_warn!("Push channel error: {}", err),
            }
            self.active.store(false, Ordering::Relaxed);
            tokio::time::sleep(self.settings.reconnect_delay).await;
        }
    }

    /// Drives a single stream session until the server closes it or errors.
    pub async fn run_session(&self, sink: &dyn ProgressSink) -> Result<(), reqwest::Error> {
        let client = build_stream_client(&self.settings)?;
        let response = client
            .get(&self.settings.events_url)
            .header(ACCEPT, EVENT_STREAM_CONTENT_TYPE)
            .send()
            .await?
            .error_for_status()?;

        self.active.store(true, Ordering::Relaxed);
        tracker_info!("Push channel connected");

        let mut decoder = SseFrameDecoder::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for payload in decoder.push_chunk(&String::from_utf8_lossy(&chunk)) {
                if let Some(event) = decode_frame(&payload) {
                    sink.emit(event);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobStatus;

    #[test]
    fn decoder_handles_chunks_split_mid_line() {
        let mut decoder = SseFrameDecoder::new();
        assert!(decoder.push_chunk("data: {\"a\":").is_empty());
        assert!(decoder.push_chunk("1}\n").is_empty());
        let frames = decoder.push_chunk("\n");
        assert_eq!(frames, vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn decoder_ignores_comments_and_other_fields() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.push_chunk(": keep-alive\nevent: status\nid: 7\ndata: x\n\n");
        assert_eq!(frames, vec!["x".to_string()]);
    }

    #[test]
    fn decoder_joins_multiple_data_lines() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.push_chunk("data: a\ndata: b\n\n");
        assert_eq!(frames, vec!["a\nb".to_string()]);
    }

    #[test]
    fn decoder_accepts_crlf_lines() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.push_chunk("data: x\r\n\r\n");
        assert_eq!(frames, vec!["x".to_string()]);
    }

    #[test]
    fn frame_decodes_into_status_event() {
        let event = decode_frame(
            "{\"jobId\":\"job-1\",\"status\":\"running\",\"progress\":40,\
             \"currentAction\":\"Drafting stories\"}",
        )
        .expect("status event");
        match event {
            EngineEvent::Status { job_id, report } => {
                assert_eq!(job_id, "job-1");
                assert_eq!(report.status, JobStatus::Running);
                assert_eq!(report.progress, 40);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn malformed_frames_are_skipped() {
        assert!(decode_frame("not json").is_none());
        assert!(decode_frame("{\"jobId\":\"job-1\",\"status\":\"paused\"}").is_none());
    }
}
