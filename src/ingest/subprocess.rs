// src/ingest/subprocess.rs
//! Out-of-process extraction: run the `scrape_source` entrypoint in
//! machine-readable mode and read its single JSON line.
//!
//! The child is spawned with `kill_on_drop`, so when the orchestrator's
//! deadline aborts the task, the process goes with it.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::ScrapeError;
use crate::ingest::types::{RawItem, SourceExtractor, WireItem};

/// How much of a failing child's stderr ends up in the error message.
pub const STDERR_HEAD_CHARS: usize = 200;

/// Command for one entrypoint run. Mode flags go before `--` so a keyword
/// starting with `-` is never read as an option.
pub fn entrypoint_command<I, S>(program: &Path, options: I, source_id: &str, keyword: &str, count: usize) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(options)
        .arg("--")
        .arg(source_id)
        .arg(keyword)
        .arg(count.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

pub fn head(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}

/// Parse the last non-empty stdout line as a JSON array of wire items.
pub fn parse_wire_output(stdout: &str, source_id: &str) -> Result<Vec<RawItem>, ScrapeError> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| ScrapeError::MalformedOutput("empty output".into()))?;
    let items: Vec<WireItem> =
        serde_json::from_str(line).map_err(|e| ScrapeError::MalformedOutput(e.to_string()))?;
    Ok(items.into_iter().map(|w| w.into_raw(source_id)).collect())
}

#[derive(Debug, Clone)]
pub struct SubprocessExtractor {
    source_id: String,
    program: PathBuf,
}

impl SubprocessExtractor {
    pub fn new(source_id: &str, program: impl Into<PathBuf>) -> Self {
        Self {
            source_id: source_id.to_string(),
            program: program.into(),
        }
    }
}

#[async_trait]
impl SourceExtractor for SubprocessExtractor {
    #[instrument(skip(self), fields(source = %self.source_id))]
    async fn extract(&self, keyword: &str, count: usize) -> Result<Vec<RawItem>, ScrapeError> {
        let output = entrypoint_command(&self.program, ["--json"], &self.source_id, keyword, count)
            .output()
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let msg = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(ScrapeError::Crash(head(&msg, STDERR_HEAD_CHARS)));
        }
        let items = parse_wire_output(&stdout, &self.source_id)?;
        debug!(items = items.len(), "entrypoint finished");
        Ok(items)
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_line_is_the_payload() {
        let out = "warming up\n[{\"title\":\"小米集团回购\",\"time\":\"2026-01-16 17:40:00\",\"url\":\"\"}]\n";
        let items = parse_wire_output(out, "cls").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_id, "cls");
        assert_eq!(items[0].url, None);
    }

    #[test]
    fn options_precede_the_positional_separator() {
        let cmd = entrypoint_command(Path::new("scrape_source"), ["--json"], "cls", "-ST康美", 5);
        let args: Vec<&OsStr> = cmd.as_std().get_args().collect();
        assert_eq!(args, ["--json", "--", "cls", "-ST康美", "5"]);
    }

    #[test]
    fn non_json_is_malformed() {
        let err = parse_wire_output("✅ done", "cls").unwrap_err();
        assert_eq!(err.kind(), "malformed_output");
        assert_eq!(parse_wire_output("", "cls").unwrap_err().kind(), "malformed_output");
    }
}
