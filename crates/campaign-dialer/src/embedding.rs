//! Transcript embeddings. Best effort: every failure degrades to `None`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::EmbeddingConfig;

const MODEL: &str = "models/embedding-001";

#[async_trait]
pub trait TranscriptEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Option<Vec<f32>>;
}

/// Used when no embedding key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEmbedder;

#[async_trait]
impl TranscriptEmbedder for DisabledEmbedder {
    async fn embed(&self, _text: &str) -> Option<Vec<f32>> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, String> {
        let url = format!("{}/v1beta/{MODEL}:embedContent", self.base_url);
        let body = json!({
            "model": MODEL,
            "content": { "parts": [{ "text": text }] },
            "taskType": "RETRIEVAL_DOCUMENT",
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| err.to_string())?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read error: {e}>"));
            return Err(format!("embedding API error {status}: {error_text}"));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|err| err.to_string())?;
        Ok(parsed.embedding.values)
    }
}

#[async_trait]
impl TranscriptEmbedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let text = text.trim();
        if text.is_empty() {
            debug!("empty transcript, skipping embedding");
            return None;
        }

        match self.request(text).await {
            Ok(values) => Some(values),
            Err(err) => {
                error!(error = %err, "could not generate transcript embedding");
                None
            }
        }
    }
}

/// Picks the Gemini client when a key is configured.
pub fn from_config(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn TranscriptEmbedder>, reqwest::Error> {
    let embedder: Arc<dyn TranscriptEmbedder> = match &config.api_key {
        Some(key) => Arc::new(GeminiEmbedder::new(&config.base_url, key)?),
        None => {
            warn!("GOOGLE_API_KEY not set; transcript embeddings disabled");
            Arc::new(DisabledEmbedder)
        }
    };
    Ok(embedder)
}
