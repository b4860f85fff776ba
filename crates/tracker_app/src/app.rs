use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use tracker_core::{update, Effect, Msg, TrackerState};
use tracker_engine::{ApiSettings, EngineHandle, EngineSettings, NewJobRequest, PushSettings};
use tracker_logging::{tracker_debug, tracker_info};

use crate::cli::{Command, Options};
use crate::effects::{spawn_event_pump, EffectRunner};
use crate::{logging, persistence, render};

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

pub fn run(options: Options) -> ExitCode {
    logging::initialize(logging::LogDestination::File);

    match options.command.clone() {
        Command::List => run_list(&options),
        Command::Dismiss { job_id } => run_dismiss(&options, &job_id),
        Command::Track { once } => run_tracker(&options, None, once),
        Command::Submit {
            project_name,
            vision_file,
        } => {
            let vision = match vision_file {
                Some(path) => match std::fs::read_to_string(&path) {
                    Ok(text) => Some(text),
                    Err(err) => {
                        eprintln!("Could not read vision file {:?}: {}", path, err);
                        return ExitCode::FAILURE;
                    }
                },
                None => None,
            };
            let request = NewJobRequest {
                project_name,
                vision,
            };
            run_tracker(&options, Some(request), false)
        }
    }
}

/// Renders the persisted cache without touching the backend.
fn run_list(options: &Options) -> ExitCode {
    let snapshots = persistence::load_jobs(&options.state_dir);
    let (state, _) = update(new_state(options), Msg::RestoreJobs(snapshots));
    print!("{}", render::render(&state.view()));
    ExitCode::SUCCESS
}

/// Dismissal only hides the job locally; the backend keeps running it.
fn run_dismiss(options: &Options, job_id: &str) -> ExitCode {
    let snapshots = persistence::load_jobs(&options.state_dir);
    let (state, _) = update(new_state(options), Msg::RestoreJobs(snapshots));
    let (state, effects) = update(
        state,
        Msg::JobDismissed {
            job_id: job_id.to_string(),
        },
    );

    if effects.contains(&Effect::PersistCache) {
        persistence::save_jobs(&options.state_dir, &state.jobs_snapshot());
        println!("Dismissed {job_id}.");
        ExitCode::SUCCESS
    } else {
        eprintln!("Job {job_id} is not tracked.");
        ExitCode::FAILURE
    }
}

fn run_tracker(options: &Options, submit: Option<NewJobRequest>, once: bool) -> ExitCode {
    let mut state = new_state(options);

    let mut settings = EngineSettings::new(ApiSettings::new(options.api_base.clone()));
    if !options.no_push && !once {
        let events_url = format!(
            "{}/generation-events",
            options.api_base.trim_end_matches('/')
        );
        settings = settings.with_push(PushSettings::new(events_url));
    }
    let (engine, event_rx) = EngineHandle::new(settings);

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(engine.clone(), options.state_dir.clone());
    spawn_event_pump(event_rx, msg_tx.clone(), now_ms);

    // Restore before the first tick so surviving jobs are queried right away.
    let snapshots = persistence::load_jobs(&options.state_dir);
    let _ = msg_tx.send(Msg::RestoreJobs(snapshots));

    if let Some(request) = submit {
        tracker_info!("Submitting project {}", request.project_name);
        engine.submit(request);
    }

    if once {
        let _ = msg_tx.send(Msg::PollTick { now: now_ms() });
    } else {
        let interval = options.poll_interval;
        let tick_tx = msg_tx.clone();
        thread::spawn(move || {
            while tick_tx.send(Msg::PollTick { now: now_ms() }).is_ok() {
                thread::sleep(interval);
            }
        });
    }

    let mut cycle: u64 = 0;
    let mut outstanding: usize = 0;
    let mut ticked = false;
    while let Ok(msg) = msg_rx.recv() {
        match &msg {
            Msg::PollTick { .. } => {
                cycle += 1;
                tracker_logging::set_cycle(cycle);
                ticked = true;
                if engine.push_active() {
                    tracker_debug!("Cycle {} covered by the push channel", cycle);
                }
            }
            Msg::StatusFetched { .. } | Msg::StatusUnavailable { .. } | Msg::JobMissing { .. } => {
                outstanding = outstanding.saturating_sub(1);
            }
            _ => {}
        }

        let (next, effects) = update(std::mem::take(&mut state), msg);
        state = next;
        outstanding += effects
            .iter()
            .filter(|effect| matches!(effect, Effect::FetchStatus { .. }))
            .count();
        runner.apply(effects, &state);

        if state.consume_dirty() {
            print!("{}", render::render(&state.view()));
        }

        // In one-shot mode, leave once the single cycle has fully settled.
        if once && ticked && outstanding == 0 {
            break;
        }
    }

    ExitCode::SUCCESS
}

fn new_state(options: &Options) -> TrackerState {
    TrackerState::with_retention(options.retention.as_millis() as u64)
}
