use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::{
    AnalysisRequest, CallAnalysis, CallMetadata, CallProvider, ProviderError, SendCallRequest,
    VoicePreview,
};
use crate::config::ProviderConfig;

/// reqwest client for the Bland AI calling API.
#[derive(Debug, Clone)]
pub struct BlandClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct OutboundCallPayload<'a> {
    #[serde(flatten)]
    call: &'a SendCallRequest,
    metadata: &'a CallMetadata,
    analysis_schema: Value,
}

impl BlandClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| ProviderError::InvalidUrl(format!("{}: {err}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(config.base_url.clone()));
        }
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::NotConfigured)
    }

    /// Appends percent-encoded segments to the base URL; ids cannot add segments or a query.
    fn url(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| segment.is_empty() || **segment == "." || **segment == "..")
        {
            return Err(ProviderError::InvalidUrl(format!("bad path segment {bad:?}")));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_json(response: Response) -> Result<Value, ProviderError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = status.as_u16(), %body, "calling provider rejected request");
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|err| ProviderError::Decode(err.to_string()))
    }
}

#[async_trait]
impl CallProvider for BlandClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send_call(
        &self,
        call: &SendCallRequest,
        metadata: &CallMetadata,
    ) -> Result<Value, ProviderError> {
        let api_key = self.api_key()?;
        let payload = OutboundCallPayload {
            call,
            metadata,
            analysis_schema: json!({ "transcript": "string", "summary": "string" }),
        };

        info!(
            phone_number = %call.phone_number,
            batch_id = metadata.batch_id.as_deref().unwrap_or("-"),
            "sending call"
        );
        let response = self
            .http
            .post(self.url(&["v1", "calls"])?)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn analyze_call(
        &self,
        call_id: &str,
        request: &AnalysisRequest,
    ) -> Result<CallAnalysis, ProviderError> {
        let api_key = self.api_key()?;
        let response = self
            .http
            .post(self.url(&["v1", "calls", call_id, "analyze"])?)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let body = Self::read_json(response).await?;
        debug!(%call_id, analysis = %body, "analysis received");
        serde_json::from_value(body).map_err(|err| ProviderError::Decode(err.to_string()))
    }

    async fn speak(&self, preview: &VoicePreview) -> Result<Value, ProviderError> {
        let api_key = self.api_key()?;
        info!(phone_number = %preview.phone_number, voice = %preview.voice, "sending voice preview");
        let response = self
            .http
            .post(self.url(&["v1", "speak"])?)
            .bearer_auth(api_key)
            .json(preview)
            .send()
            .await?;

        match Self::read_json(response).await? {
            Value::Null => Ok(json!({
                "status": "success",
                "message": format!("Test call initiated to {}.", preview.phone_number),
            })),
            body => Ok(body),
        }
    }

    async fn recording(&self, call_id: &str) -> Result<Value, ProviderError> {
        let api_key = self.api_key()?;
        info!(%call_id, "fetching recording");
        let response = self
            .http
            .get(self.url(&["v1", "recordings", call_id])?)
            .bearer_auth(api_key)
            .send()
            .await?;

        Self::read_json(response).await
    }
}
