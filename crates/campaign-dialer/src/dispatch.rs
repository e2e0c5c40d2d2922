//! Outbound call dispatch: single calls, ad-hoc batches and campaign batches.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;
use tracing::{error, info};
use uuid::Uuid;

use crate::campaigns::{self, Campaign};
use crate::contacts::ContactRecord;
use crate::error::AppError;
use crate::provider::{CallMetadata, CallProvider, ProviderError, SendCallRequest};
use crate::validation::validate_phone;

#[derive(Debug, Clone, Deserialize)]
pub struct BatchCallItem {
    pub phone_number: String,
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
}

/// Shared call settings plus one entry per recipient.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchCallRequest {
    #[serde(default)]
    pub pathway_id: Option<String>,
    pub calls: Vec<BatchCallItem>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub record: Option<bool>,
    #[serde(default)]
    pub webhook: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchDispatch {
    pub status: &'static str,
    pub batch_id: String,
    pub results: Vec<Value>,
}

impl BatchDispatch {
    pub fn failures(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result["status"] == "error")
            .count()
    }
}

pub fn new_batch_id() -> String {
    format!("batch_{}", Uuid::new_v4())
}

#[derive(Clone)]
pub struct Dispatcher {
    pool: SqlitePool,
    provider: Arc<dyn CallProvider>,
    webhook_url: String,
}

impl Dispatcher {
    pub fn new(pool: SqlitePool, provider: Arc<dyn CallProvider>, webhook_url: String) -> Self {
        Self {
            pool,
            provider,
            webhook_url,
        }
    }

    pub fn provider(&self) -> &Arc<dyn CallProvider> {
        &self.provider
    }

    pub async fn send_single(&self, mut call: SendCallRequest) -> Result<Value, AppError> {
        call.phone_number = call.phone_number.trim().to_string();
        validate_phone(&call.phone_number).map_err(AppError::Validation)?;
        if call.webhook.is_none() {
            call.webhook = Some(self.webhook_url.clone());
        }

        let metadata = CallMetadata::for_call(&call, None);
        Ok(self.provider.send_call(&call, &metadata).await?)
    }

    /// Sends every call in order; a failed call is reported in `results` and never stops the batch.
    pub async fn dispatch_batch(&self, request: BatchCallRequest) -> Result<BatchDispatch, AppError> {
        if !self.provider.is_configured() {
            return Err(ProviderError::NotConfigured.into());
        }
        let batch_id = new_batch_id();
        Ok(self.send_batch(batch_id, request, None).await)
    }

    /// Dispatches a campaign version to its contacts and attaches the batch id to that version.
    pub async fn dispatch_campaign(
        &self,
        campaign: &Campaign,
        contacts: &[ContactRecord],
    ) -> Result<BatchDispatch, AppError> {
        if !self.provider.is_configured() {
            return Err(ProviderError::NotConfigured.into());
        }

        let request = BatchCallRequest {
            pathway_id: campaign.pathway_id.clone(),
            calls: contacts.iter().map(contact_call).collect(),
            task: campaign.task.clone(),
            voice: campaign.voice.clone(),
            record: None,
            webhook: Some(self.webhook_url.clone()),
        };

        let batch_id = new_batch_id();
        campaigns::attach_batch(&self.pool, campaign.campaign_id, &batch_id).await?;
        let campaign_id = campaign.campaign_id.to_string();
        let dispatch = self.send_batch(batch_id, request, Some(&campaign_id)).await;
        info!(
            campaign_id = %campaign.campaign_id,
            batch_id = %dispatch.batch_id,
            failures = dispatch.failures(),
            "campaign dispatched"
        );
        Ok(dispatch)
    }

    async fn send_batch(
        &self,
        batch_id: String,
        request: BatchCallRequest,
        campaign_id: Option<&str>,
    ) -> BatchDispatch {
        info!(%batch_id, calls = request.calls.len(), "starting batch");
        let mut results = Vec::with_capacity(request.calls.len());

        for item in request.calls {
            let phone_number = item.phone_number.trim().to_string();
            if let Err(reason) = validate_phone(&phone_number) {
                results.push(failed(&phone_number, &reason));
                continue;
            }

            let call = SendCallRequest {
                phone_number: phone_number.clone(),
                pathway_id: request.pathway_id.clone(),
                task: request.task.clone(),
                voice: request.voice.clone(),
                variables: item.variables,
                record: request.record,
                webhook: Some(
                    request
                        .webhook
                        .clone()
                        .unwrap_or_else(|| self.webhook_url.clone()),
                ),
            };
            let mut metadata = CallMetadata::for_call(&call, Some(&batch_id));
            metadata.campaign_id = campaign_id.map(str::to_string);

            match self.provider.send_call(&call, &metadata).await {
                Ok(data) => results.push(json!({ "status": "success", "data": data })),
                Err(err) => {
                    error!(%batch_id, %phone_number, error = %err, "batch call failed");
                    results.push(failed(&phone_number, &err.to_string()));
                }
            }
        }

        BatchDispatch {
            status: "Batch job started",
            batch_id,
            results,
        }
    }
}

fn contact_call(contact: &ContactRecord) -> BatchCallItem {
    let mut variables = Map::new();
    variables.insert("name".to_string(), Value::from(contact.name.clone()));
    variables.insert(
        "company_name".to_string(),
        contact
            .company_name
            .clone()
            .map(Value::from)
            .unwrap_or(Value::Null),
    );
    BatchCallItem {
        phone_number: contact.phone_number.clone(),
        variables: Some(variables),
    }
}

fn failed(phone_number: &str, detail: &str) -> Value {
    json!({ "status": "error", "phone_number": phone_number, "detail": detail })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::provider::testing::ScriptedProvider;

    async fn dispatcher(provider: Arc<ScriptedProvider>) -> Dispatcher {
        let pool = db::connect_in_memory().await.expect("in-memory db");
        Dispatcher::new(pool, provider, "https://dialer.test/webhook".to_string())
    }

    fn item(phone_number: &str) -> BatchCallItem {
        BatchCallItem {
            phone_number: phone_number.to_string(),
            variables: None,
        }
    }

    #[tokio::test]
    async fn batch_continues_past_failures() {
        let provider = Arc::new(ScriptedProvider::default().failing_for("+14155550101"));
        let dispatcher = dispatcher(provider.clone()).await;

        let dispatch = dispatcher
            .dispatch_batch(BatchCallRequest {
                pathway_id: Some("pw-1".to_string()),
                calls: vec![item("+14155550100"), item("+14155550101"), item("0000"), item("+14155550102")],
                ..BatchCallRequest::default()
            })
            .await
            .expect("batch dispatched");

        assert!(dispatch.batch_id.starts_with("batch_"));
        assert_eq!(dispatch.status, "Batch job started");
        assert_eq!(dispatch.results.len(), 4);
        assert_eq!(dispatch.results[0]["status"], "success");
        assert_eq!(dispatch.results[1]["status"], "error");
        assert_eq!(dispatch.results[1]["phone_number"], "+14155550101");
        assert_eq!(dispatch.results[2]["status"], "error");
        assert_eq!(dispatch.results[3]["status"], "success");
        assert_eq!(dispatch.failures(), 2);

        let sent = provider.sent();
        assert_eq!(sent.len(), 2);
        for (call, metadata) in &sent {
            assert_eq!(metadata.batch_id.as_deref(), Some(dispatch.batch_id.as_str()));
            assert_eq!(metadata.pathway_id.as_deref(), Some("pw-1"));
            assert_eq!(call.webhook.as_deref(), Some("https://dialer.test/webhook"));
        }
    }

    #[tokio::test]
    async fn single_call_validates_phone_and_defaults_webhook() {
        let provider = Arc::new(ScriptedProvider::default());
        let dispatcher = dispatcher(provider.clone()).await;

        let err = dispatcher
            .send_single(SendCallRequest {
                phone_number: "not-a-number".to_string(),
                ..SendCallRequest::default()
            })
            .await
            .expect_err("invalid phone");
        assert!(matches!(err, AppError::Validation(_)));

        dispatcher
            .send_single(SendCallRequest {
                phone_number: "+14155550100".to_string(),
                webhook: Some("https://elsewhere.test/hook".to_string()),
                ..SendCallRequest::default()
            })
            .await
            .expect("call sent");
        let sent = provider.sent();
        assert_eq!(sent[0].0.webhook.as_deref(), Some("https://elsewhere.test/hook"));
        assert_eq!(sent[0].1.batch_id, None);
    }

    #[tokio::test]
    async fn unconfigured_provider_rejects_batches() {
        let provider = Arc::new(ScriptedProvider {
            unconfigured: true,
            ..ScriptedProvider::default()
        });
        let dispatcher = dispatcher(provider).await;
        let err = dispatcher
            .dispatch_batch(BatchCallRequest::default())
            .await
            .expect_err("provider missing");
        assert_eq!(err.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn contact_variables_carry_name_and_company() {
        let contact = ContactRecord {
            id: 1,
            name: "Ada".to_string(),
            phone_number: "+14155550100".to_string(),
            company_name: None,
            email: None,
            tags: None,
            created_at: chrono::Utc::now(),
        };
        let item = contact_call(&contact);
        let variables = item.variables.expect("variables set");
        assert_eq!(variables["name"], "Ada");
        assert_eq!(variables["company_name"], Value::Null);
    }
}
