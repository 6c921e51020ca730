// Translation backends and the per-language translator cache
//
// - google: the public translate_a endpoint
// - ollama: a local LLM prompted to translate
//
// Jobs never talk to a backend directly. They ask the TranslatorProvider for a
// Translator bound to their target language and call translate_text, which
// never fails: backend errors fall back to the original text.

pub mod google;
pub mod ollama;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{BackendConfig, BackendKind};
use crate::error::{Result, SubtransError};

pub use google::GoogleBackend;
pub use ollama::OllamaBackend;

/// Text-in/text-out contract of an external translation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Translate `text` into `target_lang`; `source_lang` may be "auto"
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;

    /// Verify the service is reachable and usable
    async fn check_availability(&self) -> Result<()>;
}

/// Build the backend selected by the configuration
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn TranslationBackend>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let backend: Arc<dyn TranslationBackend> = match config.kind {
        BackendKind::Google => Arc::new(GoogleBackend::new(client, &config.endpoint)),
        BackendKind::Ollama => Arc::new(OllamaBackend::new(client, &config.endpoint, &config.model)),
    };

    info!("Using {} translation backend at {}", backend.name(), config.endpoint);
    Ok(backend)
}

/// A backend bound to one source/target language pair
pub struct Translator {
    backend: Arc<dyn TranslationBackend>,
    source_lang: String,
    target_lang: String,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("backend", &self.backend.name())
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .finish()
    }
}

impl Translator {
    /// Any non-blank target is accepted; the backend decides what it supports.
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Self> {
        if target_lang.trim().is_empty() {
            return Err(SubtransError::UnsupportedLanguage(target_lang.to_string()));
        }

        Ok(Self {
            backend,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        })
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// Translate one caption. Blank input, backend errors and empty results
    /// all yield the input unchanged.
    pub async fn translate_text(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        match self.backend.translate(text, &self.source_lang, &self.target_lang).await {
            Ok(translated) if !translated.is_empty() => translated,
            Ok(_) => {
                warn!("{} returned an empty translation, keeping original text", self.backend.name());
                text.to_string()
            }
            Err(e) => {
                warn!("{} translation failed, keeping original text: {}", self.backend.name(), e);
                text.to_string()
            }
        }
    }
}

/// Process-wide cache of translators, one per target language
pub struct TranslatorProvider {
    backend: Arc<dyn TranslationBackend>,
    source_lang: String,
    cache: Mutex<HashMap<String, Arc<Translator>>>,
}

impl TranslatorProvider {
    pub fn new(backend: Arc<dyn TranslationBackend>, source_lang: &str) -> Self {
        Self {
            backend,
            source_lang: source_lang.to_string(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn TranslationBackend> {
        &self.backend
    }

    /// Return the cached translator for `target_lang`, creating it on first use
    pub fn get_translator(&self, target_lang: &str) -> Result<Arc<Translator>> {
        let mut cache = self.cache.lock();

        if let Some(translator) = cache.get(target_lang) {
            return Ok(Arc::clone(translator));
        }

        let translator = Arc::new(Translator::new(
            Arc::clone(&self.backend),
            &self.source_lang,
            target_lang,
        )?);
        cache.insert(target_lang.to_string(), Arc::clone(&translator));
        debug!("Created translator {} -> {}", self.source_lang, target_lang);

        Ok(translator)
    }

    pub fn cached_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.cache.lock().keys().cloned().collect();
        languages.sort();
        languages
    }
}
