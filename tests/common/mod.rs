/*!
 * Scripted translation backend for integration tests.
 *
 * Answers from a fixed phrase table, fails on demand and can record what a
 * progress poller would have seen at the moment each call was made.
 */

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use subtrans::config::JobConfig;
use subtrans::error::{Result, SubtransError};
use subtrans::progress::{ProgressSnapshot, ProgressTracker};
use subtrans::translate::{TranslationBackend, TranslatorProvider};
use subtrans::workflow::{Submission, UploadedFile, Workflow};

#[derive(Default)]
pub struct ScriptedBackend {
    phrases: HashMap<String, String>,
    failures: HashSet<String>,
    panics: HashSet<String>,
    delay: Option<Duration>,
    observer: Option<(Arc<ProgressTracker>, String)>,
    pub calls: Mutex<Vec<(String, String)>>,
    pub observed: Mutex<Vec<ProgressSnapshot>>,
}

impl ScriptedBackend {
    pub fn new(phrases: &[(&str, &str)]) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failures.insert(text.to_string());
        self
    }

    pub fn panicking_on(mut self, text: &str) -> Self {
        self.panics.insert(text.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn observing(mut self, tracker: Arc<ProgressTracker>, identity: &str) -> Self {
        self.observer = Some((tracker, identity.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl TranslationBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn translate(&self, text: &str, _source_lang: &str, target_lang: &str) -> Result<String> {
        self.calls.lock().push((text.to_string(), target_lang.to_string()));

        if let Some((tracker, identity)) = &self.observer {
            self.observed.lock().push(tracker.query(identity));
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.panics.contains(text) {
            panic!("scripted panic for {:?}", text);
        }

        if self.failures.contains(text) {
            return Err(SubtransError::Translation(format!("scripted failure for {:?}", text)));
        }

        Ok(self.phrases.get(text).cloned().unwrap_or_else(|| format!("[{}] {}", target_lang, text)))
    }

    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

pub fn workflow(backend: Arc<ScriptedBackend>, tracker: Arc<ProgressTracker>) -> Workflow {
    let translators = TranslatorProvider::new(backend, "auto");
    Workflow::new(JobConfig::default(), Arc::new(translators), tracker)
}

pub fn srt_submission(filename: &str, content: &str, lang: &str, requester: &str) -> Submission {
    Submission {
        file: Some(UploadedFile {
            filename: filename.to_string(),
            content: content.as_bytes().to_vec(),
        }),
        target_lang: Some(lang.to_string()),
        requester: requester.to_string(),
    }
}

/// An SRT document with `count` numbered captions
pub fn numbered_srt(count: usize) -> String {
    (1..=count)
        .map(|i| format!("{}\n00:00:{:02},000 --> 00:00:{:02},500\nLine {}\n\n", i, i % 60, i % 60, i))
        .collect()
}
