//! Post-call webhook ingestion.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::calls::{CallLog, CallOutcome, Sentiment};
use crate::embedding::TranscriptEmbedder;
use crate::error::AppError;
use crate::followup::{parse_follow_up_time, FollowUpJob, FollowUpScheduler};
use crate::provider::{AnalysisRequest, CallProvider};
use crate::state::AppContext;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookMetadata {
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub pathway_id: Option<String>,
}

/// Fields of the provider's post-call payload this service uses; the rest is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub concatenated_transcript: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub call_length: Option<f64>,
    #[serde(default)]
    pub metadata: Option<WebhookMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FollowUpDecision {
    None,
    Scheduled { delay_seconds: u64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookReceipt {
    pub status: &'static str,
    pub message: &'static str,
    pub call_id: String,
    pub sentiment: Sentiment,
    pub follow_up: FollowUpDecision,
}

#[derive(Clone)]
pub struct WebhookProcessor {
    calls: CallLog,
    provider: Arc<dyn CallProvider>,
    embedder: Arc<dyn TranscriptEmbedder>,
    follow_ups: FollowUpScheduler,
    default_delay: Duration,
}

impl WebhookProcessor {
    pub fn new(
        calls: CallLog,
        provider: Arc<dyn CallProvider>,
        embedder: Arc<dyn TranscriptEmbedder>,
        follow_ups: FollowUpScheduler,
        default_delay: Duration,
    ) -> Self {
        Self {
            calls,
            provider,
            embedder,
            follow_ups,
            default_delay,
        }
    }

    pub async fn process(&self, payload: WebhookPayload) -> Result<WebhookReceipt, AppError> {
        let call_id = payload
            .call_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("Missing call_id".to_string()))?
            .to_string();
        if !is_plain_call_id(&call_id) {
            return Err(AppError::Validation("Invalid call_id".to_string()));
        }
        let transcript = payload
            .concatenated_transcript
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string();
        let metadata = payload.metadata.clone().unwrap_or_default();
        info!(%call_id, batch_id = metadata.batch_id.as_deref().unwrap_or("-"), "webhook received");

        let (sentiment, follow_up_hint) = self.analyze(&call_id).await;
        let embedding = self.embedder.embed(&transcript).await;

        let outcome = CallOutcome {
            call_id: call_id.clone(),
            batch_id: metadata.batch_id.clone(),
            emotion: Some(sentiment.as_str().to_string()),
            from_phone: payload.from.clone(),
            to_phone: payload.to.clone(),
            call_length: payload.call_length,
            completed: payload.completed,
            summary: payload.summary.clone(),
            call_transcript: Some(transcript),
            embedding,
        };
        let record = self.calls.upsert(&outcome).await?;

        let follow_up = if sentiment == Sentiment::Neutral && !record.followup_scheduled {
            self.schedule_follow_up(&call_id, &metadata, payload.to.as_deref(), follow_up_hint.as_deref())
                .await?
        } else {
            FollowUpDecision::None
        };

        Ok(WebhookReceipt {
            status: "success",
            message: "Call processed",
            call_id,
            sentiment,
            follow_up,
        })
    }

    async fn analyze(&self, call_id: &str) -> (Sentiment, Option<String>) {
        if !self.provider.is_configured() {
            return (Sentiment::Unknown, None);
        }

        match self
            .provider
            .analyze_call(call_id, &AnalysisRequest::sentiment_and_callback())
            .await
        {
            Ok(analysis) => (
                Sentiment::from_answer(analysis.answer(0).as_deref()),
                analysis.answer(1),
            ),
            Err(err) => {
                error!(%call_id, error = %err, "call analysis failed");
                (Sentiment::Unknown, None)
            }
        }
    }

    async fn schedule_follow_up(
        &self,
        call_id: &str,
        metadata: &WebhookMetadata,
        to: Option<&str>,
        hint: Option<&str>,
    ) -> Result<FollowUpDecision, AppError> {
        let (Some(pathway_id), Some(phone_number)) = (
            metadata.pathway_id.as_deref().filter(|id| !id.is_empty()),
            to.filter(|to| !to.is_empty()),
        ) else {
            warn!(%call_id, "cannot schedule follow-up: missing pathway_id metadata or 'to' number");
            return Ok(FollowUpDecision::None);
        };

        let now = Utc::now();
        let delay = parse_follow_up_time(hint, now, self.default_delay);
        let fire_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|offset| now.checked_add_signed(offset))
            .unwrap_or(now);
        if !self.calls.mark_follow_up(call_id, fire_at).await? {
            return Ok(FollowUpDecision::None);
        }

        self.follow_ups.schedule(FollowUpJob {
            original_call_id: call_id.to_string(),
            phone_number: phone_number.to_string(),
            pathway_id: pathway_id.to_string(),
            delay,
        });
        Ok(FollowUpDecision::Scheduled {
            delay_seconds: delay.as_secs(),
        })
    }
}

/// Call ids are echoed into provider URLs, so path and query syntax is refused.
fn is_plain_call_id(call_id: &str) -> bool {
    call_id != "."
        && call_id != ".."
        && !call_id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control())
}

pub fn webhook_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/bland/postcall", post(webhook_handler))
        .with_state(ctx)
}

/// Accepts any JSON object so a missing `call_id` is reported as a 400.
async fn webhook_handler(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<Value>,
) -> Result<Json<WebhookReceipt>, AppError> {
    let payload: WebhookPayload = serde_json::from_value(body)
        .map_err(|err| AppError::Validation(format!("Invalid webhook payload: {err}")))?;
    Ok(Json(ctx.webhook.process(payload).await?))
}
