// src/config/service.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::dedup::DEFAULT_PREFIX_CHARS;
use crate::ingest::page::DEFAULT_USER_AGENT;

pub const ENV_CONFIG_PATH: &str = "FINNEWS_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/service.toml";

pub const ENV_SOURCE_TIMEOUT_SECS: &str = "FINNEWS_SOURCE_TIMEOUT_SECS";
pub const ENV_DEFAULT_LIMIT: &str = "FINNEWS_DEFAULT_LIMIT";
pub const ENV_DEDUP_PREFIX_CHARS: &str = "FINNEWS_DEDUP_PREFIX_CHARS";
pub const ENV_EXTRACTION_MODE: &str = "FINNEWS_EXTRACTION_MODE";
pub const ENV_SCRAPER_BIN: &str = "FINNEWS_SCRAPER_BIN";
pub const ENV_REPORT_DIR: &str = "FINNEWS_REPORT_DIR";

pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_MAX_JOBS: usize = 256;

/// Where extraction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// One tokio task per source inside the service.
    #[default]
    InProcess,
    /// One `scrape_source` child process per source.
    Subprocess,
}

impl FromStr for ExtractionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_process" | "inprocess" | "in-process" => Ok(Self::InProcess),
            "subprocess" => Ok(Self::Subprocess),
            other => Err(anyhow!("unknown extraction mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Hard deadline for one source within an aggregate job.
    pub source_timeout_secs: u64,
    /// Per-request deadline for page loads.
    pub navigation_timeout_secs: u64,
    /// Used when a request omits `limit` or gives a non-positive one.
    pub default_limit: usize,
    pub dedup_prefix_chars: usize,
    pub extraction_mode: ExtractionMode,
    pub scraper_bin: PathBuf,
    pub report_dir: PathBuf,
    pub user_agent: String,
    /// Interactive jobs kept for `/api/jobs/{id}`.
    pub max_jobs: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            source_timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            default_limit: DEFAULT_LIMIT,
            dedup_prefix_chars: DEFAULT_PREFIX_CHARS,
            extraction_mode: ExtractionMode::default(),
            scraper_bin: default_scraper_bin(),
            report_dir: PathBuf::from("reports"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_jobs: DEFAULT_MAX_JOBS,
        }
    }
}

/// `scrape_source` next to the running executable, else whatever is on PATH.
fn default_scraper_bin() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("scrape_source")))
        .filter(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from("scrape_source"))
}

impl ServiceConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading service config from {}", path.display()))?;
        let cfg: ServiceConfig = toml::from_str(&content)
            .with_context(|| format!("parsing service config {}", path.display()))?;
        cfg.finish()
    }

    /// Load using env var + fallbacks:
    /// 1) $FINNEWS_CONFIG_PATH
    /// 2) config/service.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Self::default().finish()
    }

    fn finish(mut self) -> Result<Self> {
        self.apply_env_overrides()?;
        self.sanitize();
        Ok(self)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_parse::<u64>(ENV_SOURCE_TIMEOUT_SECS)? {
            self.source_timeout_secs = v;
        }
        if let Some(v) = env_parse::<usize>(ENV_DEFAULT_LIMIT)? {
            self.default_limit = v;
        }
        if let Some(v) = env_parse::<usize>(ENV_DEDUP_PREFIX_CHARS)? {
            self.dedup_prefix_chars = v;
        }
        if let Some(v) = env_parse::<ExtractionMode>(ENV_EXTRACTION_MODE)? {
            self.extraction_mode = v;
        }
        if let Some(v) = env_nonempty(ENV_SCRAPER_BIN) {
            self.scraper_bin = PathBuf::from(v);
        }
        if let Some(v) = env_nonempty(ENV_REPORT_DIR) {
            self.report_dir = PathBuf::from(v);
        }
        Ok(())
    }

    /// Zero values fall back to defaults.
    fn sanitize(&mut self) {
        if self.source_timeout_secs == 0 {
            self.source_timeout_secs = DEFAULT_SOURCE_TIMEOUT_SECS;
        }
        if self.navigation_timeout_secs == 0 {
            self.navigation_timeout_secs = DEFAULT_NAVIGATION_TIMEOUT_SECS;
        }
        if self.default_limit == 0 {
            self.default_limit = DEFAULT_LIMIT;
        }
        if self.dedup_prefix_chars == 0 {
            self.dedup_prefix_chars = DEFAULT_PREFIX_CHARS;
        }
        if self.max_jobs == 0 {
            self.max_jobs = DEFAULT_MAX_JOBS;
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = DEFAULT_USER_AGENT.to_string();
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_nonempty(key) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid {key}={v}: {e}")),
    }
}
