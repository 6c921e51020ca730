use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use indicatif::ProgressBar;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::debug;

/// Key of one in-flight job: caller identity followed by the creation time.
///
/// Progress queries only know the caller identity and match by prefix, so two
/// concurrent jobs from the same caller are indistinguishable to a poller.
/// A random per-job token handed back to the caller would remove the ambiguity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(identity: &str) -> Self {
        Self(format!("{}{}", identity, Utc::now().format("%s%.6f")))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Live counters of one job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    pub completed: usize,
    pub total: usize,
}

/// What a progress poll returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(rename = "current")]
    pub completed: usize,
    pub total: usize,
    pub percent: usize,
}

impl From<ProgressRecord> for ProgressSnapshot {
    fn from(record: ProgressRecord) -> Self {
        if record.total == 0 {
            return Self::default();
        }
        Self {
            completed: record.completed,
            total: record.total,
            percent: record.completed * 100 / record.total,
        }
    }
}

/// Process-wide registry of job progress
#[derive(Debug, Default)]
pub struct ProgressTracker {
    records: Mutex<HashMap<JobId, ProgressRecord>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_job(&self, id: &JobId) {
        self.records.lock().insert(id.clone(), ProgressRecord::default());
        debug!("Tracking job {}", id);
    }

    /// Start tracking `id` and return a guard that stops tracking when dropped.
    pub fn track(&self, id: JobId) -> JobGuard<'_> {
        self.start_job(&id);
        JobGuard { tracker: self, id }
    }

    pub fn set_total(&self, id: &JobId, total: usize) {
        if let Some(record) = self.records.lock().get_mut(id) {
            record.total = total;
            record.completed = record.completed.min(total);
        }
    }

    /// Count one more finished entry; never exceeds the total.
    pub fn advance(&self, id: &JobId) {
        if let Some(record) = self.records.lock().get_mut(id) {
            if record.completed < record.total {
                record.completed += 1;
            }
        }
    }

    pub fn get(&self, id: &JobId) -> Option<ProgressRecord> {
        self.records.lock().get(id).copied()
    }

    /// Progress of the first job whose key starts with `identity` and has a
    /// known total. Which job wins among several matches is unspecified.
    pub fn query(&self, identity: &str) -> ProgressSnapshot {
        self.records
            .lock()
            .iter()
            .find(|(id, record)| id.as_str().starts_with(identity) && record.total > 0)
            .map(|(_, record)| ProgressSnapshot::from(*record))
            .unwrap_or_default()
    }

    pub fn end_job(&self, id: &JobId) {
        if self.records.lock().remove(id).is_some() {
            debug!("Stopped tracking job {}", id);
        }
    }

    pub fn active_jobs(&self) -> usize {
        self.records.lock().len()
    }
}

/// Removes its job from the tracker on every exit path
#[derive(Debug)]
pub struct JobGuard<'a> {
    tracker: &'a ProgressTracker,
    id: JobId,
}

impl JobGuard<'_> {
    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn set_total(&self, total: usize) {
        self.tracker.set_total(&self.id, total);
    }

    pub fn advance(&self) {
        self.tracker.advance(&self.id);
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.tracker.end_job(&self.id);
    }
}

/// Mirror the caller's job onto `bar` every `interval` until `stop` fires
/// (or its sender is dropped), then clear the bar from the terminal.
pub async fn render_progress(
    tracker: Arc<ProgressTracker>,
    identity: String,
    bar: ProgressBar,
    interval: Duration,
    mut stop: oneshot::Receiver<()>,
) -> ProgressBar {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {
                let snapshot = tracker.query(&identity);
                if snapshot.total > 0 {
                    bar.set_length(snapshot.total as u64);
                    bar.set_position(snapshot.completed as u64);
                }
                bar.tick();
            }
        }
    }

    bar.finish_and_clear();
    bar
}
