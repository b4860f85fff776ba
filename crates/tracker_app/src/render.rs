use tracker_core::{JobStatus, TrackerViewModel};

/// Formats the job table for the terminal.
pub fn render(view: &TrackerViewModel) -> String {
    if view.jobs.is_empty() {
        return "No tracked jobs.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<14} {:<20} {:<10} {:>5}  {}\n",
        "JOB", "PROJECT", "STATUS", "PROG", "DETAIL"
    ));
    for job in &view.jobs {
        // A failed job shows its error; otherwise the current pipeline stage.
        let detail = job
            .error
            .as_deref()
            .or(job.current_action.as_deref())
            .unwrap_or("");
        out.push_str(&format!(
            "{:<14} {:<20} {:<10} {:>4}%  {}\n",
            job.job_id,
            job.project_name,
            status_label(job.status),
            job.progress,
            detail
        ));
    }
    out.push_str(&format!("{} active\n", view.active_count));
    out
}

fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Queued => "queued",
        JobStatus::Running => "running",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::JobRowView;

    fn row(job_id: &str, status: JobStatus, progress: u8) -> JobRowView {
        JobRowView {
            job_id: job_id.to_string(),
            project_name: "Alpha".to_string(),
            status,
            progress,
            current_action: Some("Drafting stories".to_string()),
            error: None,
            started_at: 1_000,
        }
    }

    #[test]
    fn empty_view_renders_placeholder() {
        let view = TrackerViewModel::default();
        assert_eq!(render(&view), "No tracked jobs.\n");
    }

    #[test]
    fn rows_show_status_and_progress() {
        let view = TrackerViewModel {
            jobs: vec![row("job-1", JobStatus::Running, 40)],
            active_count: 1,
        };
        let out = render(&view);
        assert!(out.contains("job-1"));
        assert!(out.contains("running"));
        assert!(out.contains("40%"));
        assert!(out.contains("Drafting stories"));
        assert!(out.ends_with("1 active\n"));
    }

    #[test]
    fn failed_rows_prefer_the_error_detail() {
        let mut failed = row("job-2", JobStatus::Failed, 60);
        failed.error = Some("vision document too short".to_string());
        let view = TrackerViewModel {
            jobs: vec![failed],
            active_count: 0,
        };
        let out = render(&view);
        assert!(out.contains("vision document too short"));
        assert!(!out.contains("Drafting stories"));
    }
}
