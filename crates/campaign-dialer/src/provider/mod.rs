//! Calling provider boundary.
//!
//! Everything the service asks of the telephony API goes through [`CallProvider`] so the
//! dispatcher, webhook processor and follow-up scheduler can be exercised without the network.

mod bland;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use bland::BlandClient;

/// One outbound call as accepted by the API and forwarded to the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendCallRequest {
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathway_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
}

/// Passthrough data the provider echoes back in the post-call webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathway_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
}

impl CallMetadata {
    pub fn for_call(call: &SendCallRequest, batch_id: Option<&str>) -> Self {
        Self {
            pathway_id: call.pathway_id.clone(),
            batch_id: batch_id.map(str::to_string),
            campaign_id: None,
        }
    }
}

/// Post-call analysis questions, each paired with the expected answer format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub goal: String,
    pub questions: Vec<[String; 2]>,
}

impl AnalysisRequest {
    /// Sentiment first, requested callback time second.
    pub fn sentiment_and_callback() -> Self {
        Self {
            goal: "Determine sentiment and extract a specific follow-up time if mentioned."
                .to_string(),
            questions: vec![
                [
                    "What was the overall sentiment of the person who was called?".to_string(),
                    "Answer with only one word: positive, neutral, or negative.".to_string(),
                ],
                [
                    "Did the user suggest a specific time to call back? If so, state the time (e.g., 'in 2 hours', 'tomorrow'). If not, answer 'No'.".to_string(),
                    "string".to_string(),
                ],
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CallAnalysis {
    #[serde(default)]
    pub answers: Vec<Value>,
}

impl CallAnalysis {
    pub fn answer(&self, index: usize) -> Option<String> {
        match self.answers.get(index)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Voice preview call placed to the dashboard user's own phone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoicePreview {
    pub phone_number: String,
    pub text: String,
    pub voice: String,
    pub wait_for_greeting: bool,
}

impl VoicePreview {
    pub fn new(phone_number: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            text: "Hello, this is a preview of my voice. I hope you like how I sound!".to_string(),
            voice: voice.into(),
            wait_for_greeting: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("calling provider is not configured (BLAND_API_KEY missing)")]
    NotConfigured,
    #[error("HTTP error from calling provider ({status}): {body}")]
    Http { status: u16, body: String },
    #[error("calling provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("calling provider returned an unexpected body: {0}")]
    Decode(String),
    #[error("invalid calling provider URL: {0}")]
    InvalidUrl(String),
}

#[async_trait]
pub trait CallProvider: Send + Sync {
    /// False when no API key is available; analysis is skipped in that case.
    fn is_configured(&self) -> bool;

    async fn send_call(
        &self,
        call: &SendCallRequest,
        metadata: &CallMetadata,
    ) -> Result<Value, ProviderError>;

    async fn analyze_call(
        &self,
        call_id: &str,
        request: &AnalysisRequest,
    ) -> Result<CallAnalysis, ProviderError>;

    async fn speak(&self, preview: &VoicePreview) -> Result<Value, ProviderError>;

    async fn recording(&self, call_id: &str) -> Result<Value, ProviderError>;
}
