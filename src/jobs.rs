//! jobs.rs: bounded in-memory registry of interactive scrape jobs.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::ingest::time::source_now;
use crate::interactive::SourceOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Created,
    Running,
    Done,
    Error,
}

impl JobState {
    fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Error)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: Uuid,
    pub keyword: String,
    pub sources: Vec<String>,
    pub state: JobState,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<BTreeMap<String, SourceOutcome>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Oldest jobs are evicted once `cap` is exceeded.
#[derive(Debug)]
pub struct JobRegistry {
    inner: Mutex<Vec<JobRecord>>,
    cap: usize,
}

impl JobRegistry {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, 10_000);
        Self {
            inner: Mutex::new(Vec::with_capacity(cap)),
            cap,
        }
    }

    pub fn create(&self, keyword: &str, sources: &[String]) -> Uuid {
        let now = source_now();
        let record = JobRecord {
            id: Uuid::new_v4(),
            keyword: keyword.to_string(),
            sources: sources.to_vec(),
            state: JobState::Created,
            created_at: now,
            updated_at: now,
            results: None,
            error: None,
        };
        let id = record.id;

        let mut v = self.inner.lock().expect("jobs mutex poisoned");
        v.push(record);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
        id
    }

    pub fn mark_running(&self, id: Uuid) {
        self.update(id, |r| r.state = JobState::Running);
    }

    pub fn finish(&self, id: Uuid, results: BTreeMap<String, SourceOutcome>) {
        self.update(id, |r| {
            r.state = JobState::Done;
            r.results = Some(results);
        });
    }

    pub fn fail(&self, id: Uuid, message: &str) {
        self.update(id, |r| {
            r.state = JobState::Error;
            r.error = Some(message.to_string());
        });
    }

    pub fn get(&self, id: Uuid) -> Option<JobRecord> {
        let v = self.inner.lock().expect("jobs mutex poisoned");
        v.iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("jobs mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // terminal jobs are frozen
    fn update(&self, id: Uuid, f: impl FnOnce(&mut JobRecord)) {
        let mut v = self.inner.lock().expect("jobs mutex poisoned");
        if let Some(r) = v.iter_mut().find(|r| r.id == id && !r.state.is_terminal()) {
            f(r);
            r.updated_at = source_now();
        }
    }
}
