use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::client::{ApiSettings, ReqwestStatusApi, StatusApi};
use crate::push::{probe_push_channel, PushSettings, PushSource};
use crate::source::{ChannelProgressSink, PollingSource};
use crate::types::{EngineEvent, JobId, NewJobRequest};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub api: ApiSettings,
    /// Server-push channel; probed once at startup, polling is the fallback.
    pub push: Option<PushSettings>,
}

impl EngineSettings {
    pub fn new(api: ApiSettings) -> Self {
        Self { api, push: None }
    }

    pub fn with_push(mut self, push: PushSettings) -> Self {
        self.push = Some(push);
        self
    }
}

enum EngineCommand {
    Submit { request: NewJobRequest },
    Refresh { job_ids: Vec<JobId> },
}

/// Command side of the engine. Events arrive on the receiver returned by
/// [`EngineHandle::new`]; the engine thread owns the tokio runtime.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    push_active: Arc<AtomicBool>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let push_active = Arc::new(AtomicBool::new(false));
        let active = push_active.clone();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let api: Arc<dyn StatusApi> = Arc::new(ReqwestStatusApi::new(settings.api));
            let poller = Arc::new(PollingSource::new(api.clone()));

            if let Some(push) = settings.push {
                if runtime.block_on(probe_push_channel(&push)) {
                    tracker_info!("Push channel available at {}", push.events_url);
                    let source = PushSource::new(push, active.clone());
                    let sink = ChannelProgressSink::new(event_tx.clone());
                    runtime.spawn(async move {
                        source.run(&sink).await;
                    });
                } else {
                    tracker_info!("Push channel unavailable, polling only");
                }
            }

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Submit { request } => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            submit_job(api.as_ref(), request, event_tx).await;
                        });
                    }
                    EngineCommand::Refresh { job_ids } => {
                        if active.load(Ordering::Relaxed) {
                            tracker_debug!("Push channel live, skipping poll cycle");
                            continue;
                        }
                        let poller = poller.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let sink = ChannelProgressSink::new(event_tx);
                            poller.refresh(&job_ids, &sink).await;
                        });
                    }
                }
            }
        });

        (
            Self {
                cmd_tx,
                push_active,
            },
            event_rx,
        )
    }

    pub fn submit(&self, request: NewJobRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { request });
    }

    pub fn refresh(&self, job_ids: Vec<JobId>) {
        let _ = self.cmd_tx.send(EngineCommand::Refresh { job_ids });
    }

    pub fn push_active(&self) -> bool {
        self.push_active.load(Ordering::Relaxed)
    }
}

async fn submit_job(
    api: &dyn StatusApi,
    request: NewJobRequest,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let project_name = request.project_name.clone();
    match api.create_job(&request).await {
        Ok(created) => {
            let _ = event_tx.send(EngineEvent::JobCreated {
                job_id: created.job_id,
                project_name,
            });
        }
        Err(err) => {
            tracker_warn!("Backlog creation failed: {}", err);
            let _ = event_tx.send(EngineEvent::SubmitFailed {
                message: err.to_string(),
            });
        }
    }
}
