use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{Result, SubtransError};
use super::TranslationBackend;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translates through a local Ollama model
pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(client: Client, endpoint: &str, model: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TranslationBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: build_translation_prompt(text, source_lang, target_lang),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.endpoint);

        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SubtransError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubtransError::Translation(format!(
                "Ollama API error {}: {}", status, error_text
            )));
        }

        let generated: GenerateResponse = response.json().await
            .map_err(|e| SubtransError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw_response = generated.response.trim();

        debug!("Raw Ollama response: {}", raw_response);

        if raw_response.is_empty() {
            return Err(SubtransError::Translation("Empty translation received".to_string()));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(raw_response) {
            return Ok(result.text.trim().to_string());
        }

        Ok(clean_translation_response(raw_response))
    }

    /// Check that Ollama is up and the model is pulled
    async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/api/show", self.endpoint);

        let response = self.client
            .post(&url)
            .json(&json!({ "name": self.model }))
            .send()
            .await
            .map_err(|e| SubtransError::Translation(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", self.model);
            Ok(())
        } else {
            Err(SubtransError::Translation(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                self.model, self.model
            )))
        }
    }
}

fn build_translation_prompt(text: &str, source_lang: &str, target_lang: &str) -> String {
    let target_name = language_code_to_name(target_lang);
    let source_line = if source_lang == "auto" {
        "Detect the language of the source text yourself.".to_string()
    } else {
        format!("The source text is in {}.", language_code_to_name(source_lang))
    };

    format!(
        "You are a professional subtitle translator.\n\
         \n\
         CRITICAL: You must translate the text to {} ONLY. Do not translate to any other language.\n\
         The target language is: {} (language code: {})\n\
         {}\n\
         Keep line breaks where they appear in the source.\n\
         \n\
         Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
         Do not include any explanations, alternatives, or text in other languages.\n\
         \n\
         [Text to translate]\n\
         {}\n",
        target_name, target_name, target_lang, source_line, target_name, text
    )
}

/// Full language name for clearer prompts; unknown codes pass through
fn language_code_to_name(code: &str) -> String {
    let primary = code.split(['-', '_']).next().unwrap_or(code);
    let name = match primary.to_lowercase().as_str() {
        "ar" => "Arabic",
        "cs" => "Czech",
        "da" => "Danish",
        "de" => "German",
        "el" => "Greek",
        "en" => "English",
        "es" => "Spanish",
        "fi" => "Finnish",
        "fr" => "French",
        "he" => "Hebrew",
        "hi" => "Hindi",
        "hu" => "Hungarian",
        "id" => "Indonesian",
        "it" => "Italian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "nl" => "Dutch",
        "no" => "Norwegian",
        "pl" => "Polish",
        "pt" => "Portuguese",
        "ro" => "Romanian",
        "ru" => "Russian",
        "sv" => "Swedish",
        "th" => "Thai",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "vi" => "Vietnamese",
        "zh" => "Chinese",
        _ => return code.to_string(),
    };
    name.to_string()
}

/// Pull the translation out of a reply that ignored the JSON instruction
fn clean_translation_response(response: &str) -> String {
    let kept: Vec<&str> = response
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("Here is")
                && !line.starts_with("Here's")
                && !line.starts_with("Translation:")
                && !(line.starts_with("**") && line.ends_with("**"))
        })
        .collect();

    if kept.is_empty() {
        response.trim().to_string()
    } else {
        kept.join("\n")
    }
}
