use crate::{Effect, Msg, TrackerState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::JobSubmitted {
            job_id,
            project_name,
            now,
        } => {
            state.insert_job(job_id, project_name, now);
            vec![Effect::PersistCache]
        }
        Msg::JobDismissed { job_id } => {
            if state.remove_job(&job_id) {
                vec![Effect::PersistCache]
            } else {
                Vec::new()
            }
        }
        Msg::PollTick { now } => {
            // Expired terminal jobs go first so they are never re-queried.
            let pruned = state.prune_expired(now);
            let due = state.begin_queries(now);
            let mut effects = Vec::with_capacity(due.len() + usize::from(pruned > 0));
            if pruned > 0 {
                effects.push(Effect::PersistCache);
            }
            for job_id in due {
                effects.push(Effect::FetchStatus { job_id });
            }
            effects
        }
        Msg::StatusFetched { job_id, report } => {
            state.finish_query(&job_id);
            if state.apply_report(&job_id, report) {
                vec![Effect::PersistCache]
            } else {
                Vec::new()
            }
        }
        Msg::StatusUnavailable { job_id } => {
            state.finish_query(&job_id);
            Vec::new()
        }
        Msg::JobMissing { job_id } => {
            if state.remove_job(&job_id) {
                vec![Effect::PersistCache]
            } else {
                Vec::new()
            }
        }
        Msg::RestoreJobs(snapshots) => {
            state.restore(snapshots);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
