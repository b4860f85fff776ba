use std::path::PathBuf;
use std::time::Duration;

use tracker_core::DEFAULT_RETENTION_MS;

pub const USAGE: &str = "\
Usage: tracker_app [OPTIONS] [COMMAND]

Commands:
  track              Watch tracked jobs until interrupted (default)
  submit <name> [vision-file]
                     Create a backlog-generation job, then watch it
  dismiss <job-id>   Remove a job from the local view
  list               Print the persisted job table and exit

Options:
  --api <url>            Backend base url (default: $TRACKER_API_BASE
                         or http://127.0.0.1:4000/api)
  --state-dir <dir>      Where the job cache lives (default: .backlog_tracker)
  --poll-interval <secs> Seconds between reconcile cycles (default: 5)
  --retention <mins>     Minutes a finished job stays visible (default: 10)
  --no-push              Skip the server-push probe, poll only
  --once                 Run a single reconcile cycle, then exit";

const DEFAULT_API_BASE: &str = "http://127.0.0.1:4000/api";
const DEFAULT_STATE_DIR: &str = ".backlog_tracker";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Track { once: bool },
    Submit {
        project_name: String,
        vision_file: Option<PathBuf>,
    },
    Dismiss { job_id: String },
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub command: Command,
    pub api_base: String,
    pub state_dir: PathBuf,
    pub poll_interval: Duration,
    pub retention: Duration,
    pub no_push: bool,
}

pub fn parse(args: impl Iterator<Item = String>) -> Result<Options, String> {
    let args: Vec<String> = args.collect();
    let mut api_base = std::env::var("TRACKER_API_BASE")
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let mut state_dir = PathBuf::from(DEFAULT_STATE_DIR);
    let mut poll_interval = Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS);
    let mut retention = Duration::from_millis(DEFAULT_RETENTION_MS);
    let mut no_push = false;
    let mut once = false;
    let mut positional: Vec<String> = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--api" => api_base = required_value(&mut iter, "--api")?,
            "--state-dir" => state_dir = PathBuf::from(required_value(&mut iter, "--state-dir")?),
            "--poll-interval" => {
                let value = required_value(&mut iter, "--poll-interval")?;
                let secs: u64 = value
                    .parse()
                    .map_err(|_| format!("--poll-interval expects seconds, got {value:?}"))?;
                if secs == 0 {
                    return Err("--poll-interval must be at least 1 second".to_string());
                }
                poll_interval = Duration::from_secs(secs);
            }
            "--retention" => {
                let value = required_value(&mut iter, "--retention")?;
                let minutes: u64 = value
                    .parse()
                    .map_err(|_| format!("--retention expects minutes, got {value:?}"))?;
                retention = Duration::from_secs(minutes * 60);
            }
            "--no-push" => no_push = true,
            "--once" => once = true,
            "--help" | "-h" => return Err(String::new()),
            other if other.starts_with("--") => {
                return Err(format!("unknown option {other:?}"));
            }
            _ => positional.push(arg),
        }
    }

    let command = match positional.first().map(String::as_str) {
        None | Some("track") => Command::Track { once },
        Some("submit") => {
            let project_name = positional
                .get(1)
                .cloned()
                .ok_or_else(|| "submit needs a project name".to_string())?;
            Command::Submit {
                project_name,
                vision_file: positional.get(2).map(PathBuf::from),
            }
        }
        Some("dismiss") => {
            let job_id = positional
                .get(1)
                .cloned()
                .ok_or_else(|| "dismiss needs a job id".to_string())?;
            Command::Dismiss { job_id }
        }
        Some("list") => Command::List,
        Some(other) => return Err(format!("unknown command {other:?}")),
    };

    Ok(Options {
        command,
        api_base,
        state_dir,
        poll_interval,
        retention,
        no_push,
    })
}

fn required_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    iter.next().ok_or_else(|| format!("{flag} needs a value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_list(args: &[&str]) -> Result<Options, String> {
        parse(args.iter().map(ToString::to_string))
    }

    #[test]
    fn defaults_to_track() {
        let options = parse_list(&[]).unwrap();
        assert_eq!(options.command, Command::Track { once: false });
        assert_eq!(options.poll_interval, Duration::from_secs(5));
        assert_eq!(options.retention, Duration::from_secs(600));
        assert!(!options.no_push);
    }

    #[test]
    fn parses_submit_with_vision_file() {
        let options = parse_list(&["submit", "Alpha", "vision.md"]).unwrap();
        assert_eq!(
            options.command,
            Command::Submit {
                project_name: "Alpha".to_string(),
                vision_file: Some(PathBuf::from("vision.md")),
            }
        );
    }

    #[test]
    fn parses_overrides() {
        let options = parse_list(&[
            "--api",
            "http://backend:9000/api",
            "--retention",
            "5",
            "--poll-interval",
            "2",
            "--no-push",
            "dismiss",
            "job-1",
        ])
        .unwrap();
        assert_eq!(options.api_base, "http://backend:9000/api");
        assert_eq!(options.retention, Duration::from_secs(300));
        assert_eq!(options.poll_interval, Duration::from_secs(2));
        assert!(options.no_push);
        assert_eq!(
            options.command,
            Command::Dismiss {
                job_id: "job-1".to_string()
            }
        );
    }

    #[test]
    fn rejects_missing_arguments() {
        assert!(parse_list(&["submit"]).is_err());
        assert!(parse_list(&["dismiss"]).is_err());
        assert!(parse_list(&["--poll-interval"]).is_err());
        assert!(parse_list(&["--poll-interval", "0"]).is_err());
        assert!(parse_list(&["--bogus"]).is_err());
    }
}
