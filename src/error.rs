use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubtransError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, SubtransError>;

/// Category of a rejected or failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionErrorKind {
    MissingFile,
    MissingLanguage,
    EmptyFilename,
    UnsupportedExtension,
    Internal,
}

impl SubmissionErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFile => "missing_file",
            Self::MissingLanguage => "missing_language",
            Self::EmptyFilename => "empty_filename",
            Self::UnsupportedExtension => "unsupported_extension",
            Self::Internal => "internal_failure",
        }
    }

    /// Client-input errors are raised before any job state exists.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal)
    }
}

/// Error returned to the submitter of a translation job.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct SubmissionError {
    #[serde(rename = "error")]
    pub message: String,
    #[serde(serialize_with = "serialize_kind")]
    pub kind: SubmissionErrorKind,
}

fn serialize_kind<S: serde::Serializer>(
    kind: &SubmissionErrorKind,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.code())
}

impl SubmissionError {
    pub fn new(kind: SubmissionErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn missing_file() -> Self {
        Self::new(SubmissionErrorKind::MissingFile, "No file provided")
    }

    pub fn missing_language() -> Self {
        Self::new(SubmissionErrorKind::MissingLanguage, "No target language provided")
    }

    pub fn empty_filename() -> Self {
        Self::new(SubmissionErrorKind::EmptyFilename, "No file selected")
    }

    pub fn unsupported_extension(extension: &str) -> Self {
        Self::new(
            SubmissionErrorKind::UnsupportedExtension,
            format!("Only {} files are supported", extension),
        )
    }

    pub fn internal(cause: impl std::fmt::Display) -> Self {
        Self::new(
            SubmissionErrorKind::Internal,
            format!("Translation failed: {}", cause),
        )
    }
}
