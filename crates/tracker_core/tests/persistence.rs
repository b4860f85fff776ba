use tracker_core::{update, JobStatus, Msg, StatusReport, TrackerState};

fn init_logging() {
    tracker_logging::initialize_for_tests();
}

#[test]
fn tracked_jobs_can_be_restored_for_resume() {
    init_logging();
    let (state, _) = update(
        TrackerState::new(),
        Msg::JobSubmitted {
            job_id: "job-1".to_string(),
            project_name: "Alpha".to_string(),
            now: 1_000,
        },
    );
    let (state, _) = update(
        state,
        Msg::StatusFetched {
            job_id: "job-1".to_string(),
            report: StatusReport {
                status: JobStatus::Running,
                progress: 55,
                current_action: Some("Drafting stories".to_string()),
                error: None,
            },
        },
    );

    let snapshot = state.jobs_snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].job_id, "job-1");
    assert_eq!(snapshot[0].progress, 55);

    let (restored, effects) = update(TrackerState::new(), Msg::RestoreJobs(snapshot));
    assert!(effects.is_empty());

    let view = restored.view();
    assert_eq!(view.jobs.len(), 1);
    assert_eq!(view.jobs[0].status, JobStatus::Running);
    assert_eq!(view.jobs[0].progress, 55);
    assert_eq!(
        view.jobs[0].current_action.as_deref(),
        Some("Drafting stories")
    );
    assert_eq!(view.active_count, 1);
}

#[test]
fn restored_jobs_are_queried_on_the_next_tick() {
    init_logging();
    let (state, _) = update(
        TrackerState::new(),
        Msg::JobSubmitted {
            job_id: "job-1".to_string(),
            project_name: "Alpha".to_string(),
            now: 1_000,
        },
    );
    // Simulate a restart mid-query: the snapshot carries no in-flight marks.
    let (state, _) = update(state, Msg::PollTick { now: 2_000 });
    let snapshot = state.jobs_snapshot();

    let (restored, _) = update(TrackerState::new(), Msg::RestoreJobs(snapshot));
    let (_, effects) = update(restored, Msg::PollTick { now: 3_000 });
    assert_eq!(effects.len(), 1);
}
