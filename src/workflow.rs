use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::{Config, JobConfig};
use crate::error::{Result, SubmissionError};
use crate::progress::{JobGuard, JobId, ProgressSnapshot, ProgressTracker};
use crate::subtitle::{build_srt, parse_srt};
use crate::translate::{create_backend, TranslatorProvider};

pub const OUTPUT_MIME_TYPE: &str = "text/plain";

/// An uploaded subtitle file
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One translation request as received from a caller
#[derive(Debug, Clone)]
pub struct Submission {
    pub file: Option<UploadedFile>,
    pub target_lang: Option<String>,
    /// Caller identity, usually the remote address
    pub requester: String,
}

/// The downloadable result of a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
}

impl TranslatedFile {
    pub fn into_bytes(self) -> Vec<u8> {
        self.content.into_bytes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Parsing,
    Translating,
    Building,
    Done,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Parsing => "parsing",
            Self::Translating => "translating",
            Self::Building => "building",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs translation jobs end to end.
///
/// The translator cache and the progress tracker are shared with every other
/// job in the process; clone the `Arc`s to hand them to pollers.
pub struct Workflow {
    config: JobConfig,
    translators: Arc<TranslatorProvider>,
    progress: Arc<ProgressTracker>,
}

impl Workflow {
    pub fn new(
        config: JobConfig,
        translators: Arc<TranslatorProvider>,
        progress: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            config,
            translators,
            progress,
        }
    }

    /// Build a workflow with the backend named in `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = create_backend(&config.backend)?;
        let translators = TranslatorProvider::new(backend, &config.backend.source_lang);

        Ok(Self::new(
            config.job.clone(),
            Arc::new(translators),
            Arc::new(ProgressTracker::new()),
        ))
    }

    pub fn translators(&self) -> &Arc<TranslatorProvider> {
        &self.translators
    }

    pub fn progress_tracker(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    /// Progress of the caller's in-flight job, all zero when there is none
    pub fn progress(&self, identity: &str) -> ProgressSnapshot {
        self.progress.query(identity)
    }

    /// Name of the artifact produced for `filename`
    pub fn output_filename(&self, target_lang: &str, filename: &str) -> String {
        format!("{}_{}_{}", self.config.output_prefix, target_lang, filename)
    }

    /// Reject incomplete submissions before any job state exists
    pub fn validate<'a>(
        &self,
        submission: &'a Submission,
    ) -> std::result::Result<(&'a UploadedFile, &'a str), SubmissionError> {
        let file = submission.file.as_ref().ok_or_else(SubmissionError::missing_file)?;

        let target_lang = submission
            .target_lang
            .as_deref()
            .filter(|lang| !lang.trim().is_empty())
            .ok_or_else(SubmissionError::missing_language)?;

        if file.filename.is_empty() {
            return Err(SubmissionError::empty_filename());
        }

        if !file.filename.ends_with(&self.config.extension) {
            return Err(SubmissionError::unsupported_extension(&self.config.extension));
        }

        Ok((file, target_lang))
    }

    /// Translate one submitted file
    pub async fn submit(
        &self,
        submission: Submission,
    ) -> std::result::Result<TranslatedFile, SubmissionError> {
        let (file, target_lang) = self.validate(&submission)?;

        let guard = self.progress.track(JobId::new(&submission.requester));
        self.transition(&guard, JobState::Created);
        info!("Starting job {}: {} -> {}", guard.id(), file.filename, target_lang);

        let outcome = AssertUnwindSafe(self.run(&guard, &file.content, target_lang))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(content)) => {
                self.transition(&guard, JobState::Done);
                info!("Finished job {}", guard.id());
                Ok(TranslatedFile {
                    filename: self.output_filename(target_lang, &file.filename),
                    mime_type: OUTPUT_MIME_TYPE,
                    content,
                })
            }
            Ok(Err(e)) => {
                self.transition(&guard, JobState::Failed);
                warn!("Job {} failed: {}", guard.id(), e);
                Err(SubmissionError::internal(e))
            }
            Err(payload) => {
                self.transition(&guard, JobState::Failed);
                let reason = panic_message(payload.as_ref());
                error!("Job {} panicked: {}", guard.id(), reason);
                Err(SubmissionError::internal(format!("job aborted unexpectedly: {}", reason)))
            }
        }
    }

    async fn run(&self, guard: &JobGuard<'_>, content: &[u8], target_lang: &str) -> Result<String> {
        self.transition(guard, JobState::Parsing);
        let mut subtitles = parse_srt(content);
        guard.set_total(subtitles.len());

        self.transition(guard, JobState::Translating);
        let translator = self.translators.get_translator(target_lang)?;
        let total = subtitles.len();

        // Entries are translated one at a time so `completed` only ever grows.
        for (idx, subtitle) in subtitles.iter_mut().enumerate() {
            subtitle.text = translator.translate_text(&subtitle.text).await;
            guard.advance();
            debug!("Job {}: translated entry {}/{}", guard.id(), idx + 1, total);
        }

        self.transition(guard, JobState::Building);
        Ok(build_srt(&subtitles))
    }

    fn transition(&self, guard: &JobGuard<'_>, state: JobState) {
        debug!("Job {} -> {}", guard.id(), state);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::MockTranslationBackend;

    fn workflow_with(backend: MockTranslationBackend) -> Workflow {
        let translators = TranslatorProvider::new(Arc::new(backend), "auto");
        Workflow::new(
            JobConfig::default(),
            Arc::new(translators),
            Arc::new(ProgressTracker::new()),
        )
    }

    fn untouched_backend() -> MockTranslationBackend {
        let mut backend = MockTranslationBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_translate().never();
        backend
    }

    fn submission(filename: &str, lang: Option<&str>) -> Submission {
        Submission {
            file: Some(UploadedFile {
                filename: filename.to_string(),
                content: b"1\n00:00:00,000 --> 00:00:01,000\nHi\n".to_vec(),
            }),
            target_lang: lang.map(str::to_string),
            requester: "127.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected() {
        let workflow = workflow_with(untouched_backend());
        let err = workflow
            .submit(Submission {
                file: None,
                target_lang: Some("fr".to_string()),
                requester: "127.0.0.1".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, SubmissionError::missing_file());
    }

    #[tokio::test]
    async fn test_missing_or_blank_language_is_rejected() {
        let workflow = workflow_with(untouched_backend());
        for lang in [None, Some(""), Some("  ")] {
            let err = workflow.submit(submission("movie.srt", lang)).await.unwrap_err();
            assert_eq!(err, SubmissionError::missing_language());
        }
    }

    #[tokio::test]
    async fn test_empty_filename_is_rejected() {
        let workflow = workflow_with(untouched_backend());
        let err = workflow.submit(submission("", Some("fr"))).await.unwrap_err();
        assert_eq!(err, SubmissionError::empty_filename());
    }

    #[tokio::test]
    async fn test_wrong_extension_is_rejected() {
        let workflow = workflow_with(untouched_backend());
        for name in ["movie.vtt", "movie.SRT", "movie.srt.txt"] {
            let err = workflow.submit(submission(name, Some("fr"))).await.unwrap_err();
            assert_eq!(err.message, "Only .srt files are supported");
            assert!(err.kind.is_client_error());
        }
        assert_eq!(workflow.progress_tracker().active_jobs(), 0);
    }

    struct ExplodingBackend;

    #[async_trait::async_trait]
    impl crate::translate::TranslationBackend for ExplodingBackend {
        fn name(&self) -> &'static str {
            "exploding"
        }

        async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String> {
            panic!("backend exploded");
        }

        async fn check_availability(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_backend_panic_is_internal_failure() {
        let translators = TranslatorProvider::new(Arc::new(ExplodingBackend), "auto");
        let workflow = Workflow::new(
            JobConfig::default(),
            Arc::new(translators),
            Arc::new(ProgressTracker::new()),
        );

        let err = workflow
            .submit(submission("movie.srt", Some("fr")))
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::error::SubmissionErrorKind::Internal);
        assert_eq!(
            err.message,
            "Translation failed: job aborted unexpectedly: backend exploded"
        );
        assert_eq!(workflow.progress_tracker().active_jobs(), 0);
    }

    #[tokio::test]
    async fn test_target_language_is_used_as_submitted() {
        let mut backend = MockTranslationBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_translate()
            .withf(|_, _, target| target == " fr ")
            .times(1)
            .returning(|_, _, _| Ok("Salut".to_string()));
        let workflow = workflow_with(backend);

        let file = workflow.submit(submission("movie.srt", Some(" fr "))).await.unwrap();
        assert_eq!(file.filename, "translated_ fr _movie.srt");
    }

    #[tokio::test]
    async fn test_successful_job_names_artifact_and_cleans_up() {
        let mut backend = MockTranslationBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_translate()
            .times(1)
            .returning(|_, _, _| Ok("Salut".to_string()));
        let workflow = workflow_with(backend);

        let file = workflow.submit(submission("movie.srt", Some("fr"))).await.unwrap();
        assert_eq!(file.filename, "translated_fr_movie.srt");
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.content, "1\n00:00:00,000 --> 00:00:01,000\nSalut");
        assert_eq!(workflow.progress_tracker().active_jobs(), 0);
        assert_eq!(workflow.progress("127.0.0.1"), ProgressSnapshot::default());
    }

    #[tokio::test]
    async fn test_empty_file_produces_empty_output() {
        let workflow = workflow_with(untouched_backend());
        let mut empty = submission("blank.srt", Some("de"));
        if let Some(file) = empty.file.as_mut() {
            file.content = b"\r\n\r\n".to_vec();
        }

        let file = workflow.submit(empty).await.unwrap();
        assert_eq!(file.content, "");
        assert_eq!(file.filename, "translated_de_blank.srt");
    }

    #[test]
    fn test_custom_output_prefix() {
        let translators = TranslatorProvider::new(Arc::new(untouched_backend()), "auto");
        let workflow = Workflow::new(
            JobConfig {
                extension: ".srt".to_string(),
                output_prefix: "subs".to_string(),
            },
            Arc::new(translators),
            Arc::new(ProgressTracker::new()),
        );
        assert_eq!(workflow.output_filename("ja", "a.srt"), "subs_ja_a.srt");
    }
}
