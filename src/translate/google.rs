use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, SubtransError};
use super::TranslationBackend;

/// Client for the public Google translate_a endpoint
pub struct GoogleBackend {
    client: Client,
    endpoint: String,
}

impl GoogleBackend {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TranslationBackend for GoogleBackend {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.endpoint);

        debug!("Sending translation request to: {}", url);

        let response = self.client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| SubtransError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubtransError::Translation(format!(
                "Google Translate error {}: {}", status, error_text
            )));
        }

        let body: Value = response.json().await
            .map_err(|e| SubtransError::Translation(format!("Failed to parse response: {}", e)))?;

        extract_translation(&body)
    }

    async fn check_availability(&self) -> Result<()> {
        let probe = self.translate("hello", "en", "fr").await?;
        info!("Google Translate is available (probe: {:?})", probe);
        Ok(())
    }
}

/// Join the translated segments of a translate_a response.
///
/// The payload looks like `[[["Bonjour","Hello",null,null,10], ...], null, "en", ...]`;
/// each inner array carries one translated sentence at position 0.
fn extract_translation(body: &Value) -> Result<String> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| SubtransError::Translation("Unexpected response shape".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    Ok(translated)
}
