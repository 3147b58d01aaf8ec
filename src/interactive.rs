// src/interactive.rs
//! Interactive runs: the per-source entrypoint in its default (report) mode,
//! one child process per source, all sources concurrently.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::ingest::subprocess::entrypoint_command;
use crate::report::{find_latest, preview};
use crate::sources::descriptor;

pub const UNKNOWN_SOURCE: &str = "unknown source";
pub const TIMED_OUT: &str = "scrape timed out";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Done,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOutcome {
    pub status: OutcomeStatus,
    pub message: String,
}

impl SourceOutcome {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Done,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InteractiveRunner {
    pub program: PathBuf,
    pub report_dir: PathBuf,
    pub timeout: Duration,
}

impl InteractiveRunner {
    /// Run every requested source; the map is keyed by the requested id.
    pub async fn run(&self, keyword: &str, count: usize, sources: &[String]) -> BTreeMap<String, SourceOutcome> {
        let runs = sources.iter().map(|id| async move { (id.clone(), self.run_one(id, keyword, count).await) });
        join_all(runs).await.into_iter().collect()
    }

    async fn run_one(&self, id: &str, keyword: &str, count: usize) -> SourceOutcome {
        let Some(desc) = descriptor(id) else {
            return SourceOutcome::error(UNKNOWN_SOURCE);
        };
        let options = [OsStr::new("--out-dir"), self.report_dir.as_os_str()];
        let mut cmd = entrypoint_command(&self.program, options, desc.id, keyword, count);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                warn!(source = desc.id, kind = "timeout", "interactive run timed out");
                return SourceOutcome::error(TIMED_OUT);
            }
            Ok(Err(e)) => {
                warn!(source = desc.id, kind = "io", error = %e, "interactive run failed to start");
                return SourceOutcome::error(e.to_string());
            }
            Ok(Ok(out)) => out,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!(source = desc.id, kind = "crash", code = ?output.status.code(), "interactive run exited non-zero");
            return SourceOutcome::error(if stderr.trim().is_empty() { stdout } else { stderr });
        }

        match find_latest(&self.report_dir, keyword, desc.display_name) {
            Ok(Some(path)) => match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    info!(source = desc.id, report = %path.display(), "interactive run finished");
                    SourceOutcome::done(preview(&content))
                }
                Err(e) => {
                    warn!(source = desc.id, error = %e, "report unreadable; returning stdout");
                    SourceOutcome::done(stdout)
                }
            },
            Ok(None) => SourceOutcome::done(stdout),
            Err(e) => {
                warn!(source = desc.id, error = %e, "report lookup failed; returning stdout");
                SourceOutcome::done(stdout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_sources_fail_without_spawning() {
        let runner = InteractiveRunner {
            program: PathBuf::from("/nonexistent/scrape_source"),
            report_dir: PathBuf::from("reports"),
            timeout: Duration::from_secs(1),
        };
        let out = runner.run("小米集团", 5, &["sina".to_string()]).await;
        assert_eq!(out.get("sina"), Some(&SourceOutcome::error(UNKNOWN_SOURCE)));
    }

    #[tokio::test]
    async fn spawn_failure_is_an_error_outcome() {
        let runner = InteractiveRunner {
            program: PathBuf::from("/nonexistent/scrape_source"),
            report_dir: PathBuf::from("reports"),
            timeout: Duration::from_secs(5),
        };
        let out = runner.run("小米集团", 5, &["cls".to_string()]).await;
        assert_eq!(out.get("cls").map(|o| o.status), Some(OutcomeStatus::Error));
    }
}
