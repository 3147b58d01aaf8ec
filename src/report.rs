// src/report.rs
//! Markdown report artifacts written by the per-source entrypoint and read back
//! by the interactive runner.
//!
//! Name: `<keyword>_<display name>_<YYYYmmdd_HHMMSS>.md`. The timestamp sorts
//! lexicographically, so the newest artifact is the greatest name.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::ingest::time::{normalize_time, CANONICAL_FORMAT};
use crate::ingest::types::RawItem;

pub const PREVIEW_CHARS: usize = 2000;
pub const TRUNCATION_NOTE: &str = "\n...(更多内容请查看文件)";
const NAME_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

fn file_safe(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect()
}

fn name_prefix(keyword: &str, display_name: &str) -> String {
    format!("{}_{}_", file_safe(keyword), file_safe(display_name))
}

pub fn artifact_name(keyword: &str, display_name: &str, at: NaiveDateTime) -> String {
    format!("{}{}.md", name_prefix(keyword, display_name), at.format(NAME_STAMP_FORMAT))
}

pub fn render(
    keyword: &str,
    display_name: &str,
    at: NaiveDateTime,
    elapsed: Option<Duration>,
    items: &[RawItem],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {keyword} {display_name}\n");
    let _ = writeln!(out, "> 采集时间: {}", at.format(CANONICAL_FORMAT));
    let _ = writeln!(out, "> 数量: {}", items.len());
    if let Some(e) = elapsed {
        let _ = writeln!(out, "> 耗时: {:.1}秒", e.as_secs_f64());
    }
    out.push_str("\n---\n\n");

    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "## {}. {}\n", i + 1, item.title);
        if let Some(t) = normalize_time(item.time.as_ref(), at).known_text() {
            let _ = writeln!(out, "- **时间**: {t}");
        }
        let fields = [
            ("摘要", &item.summary),
            ("机构", &item.org),
            ("评级", &item.rating),
            ("链接", &item.url),
        ];
        for (label, value) in fields {
            if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                let _ = writeln!(out, "- **{label}**: {v}");
            }
        }
        out.push('\n');
    }
    out
}

/// Render and write an artifact into `dir`, creating it when missing.
pub fn write_report(
    dir: &Path,
    keyword: &str,
    display_name: &str,
    at: NaiveDateTime,
    elapsed: Option<Duration>,
    items: &[RawItem],
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating report dir {}", dir.display()))?;
    let path = dir.join(artifact_name(keyword, display_name, at));
    fs::write(&path, render(keyword, display_name, at, elapsed, items))
        .with_context(|| format!("writing report {}", path.display()))?;
    Ok(path)
}

/// Newest artifact for this keyword and source, if any.
pub fn find_latest(dir: &Path, keyword: &str, display_name: &str) -> io::Result<Option<PathBuf>> {
    let prefix = name_prefix(keyword, display_name);
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut newest: Option<(String, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(&prefix) || !name.ends_with(".md") {
            continue;
        }
        if newest.as_ref().map_or(true, |(n, _)| name > *n) {
            newest = Some((name, entry.path()));
        }
    }
    Ok(newest.map(|(_, p)| p))
}

/// Content cut to `PREVIEW_CHARS` with a trailing note when longer.
pub fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let head: String = content.chars().take(PREVIEW_CHARS).collect();
        head + TRUNCATION_NOTE
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_name_is_sortable_and_path_safe() {
        let at = NaiveDateTime::parse_from_str("2026-01-16 17:40:02", CANONICAL_FORMAT).unwrap();
        assert_eq!(artifact_name("小米/集团", "财联社", at), "小米_集团_财联社_20260116_174002.md");
    }

    #[test]
    fn preview_appends_note_only_when_cut() {
        assert_eq!(preview("short"), "short");
        let long = "字".repeat(PREVIEW_CHARS + 1);
        let p = preview(&long);
        assert!(p.ends_with(TRUNCATION_NOTE));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + TRUNCATION_NOTE.chars().count());
    }
}
