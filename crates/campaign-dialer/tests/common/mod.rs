//! Shared harness: the full API router over an in-memory database, with the calling
//! provider served by wiremock.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::MockServer;

use campaign_dialer::config::ProviderConfig;
use campaign_dialer::db;
use campaign_dialer::embedding::DisabledEmbedder;
use campaign_dialer::provider::BlandClient;
use campaign_dialer::state::ServiceSettings;
use campaign_dialer::{api_router, AppContext};

pub const WEBHOOK_URL: &str = "https://dialer.test/webhook";

pub struct TestApp {
    pub router: Router,
    pub ctx: Arc<AppContext>,
    pub provider: MockServer,
}

pub async fn spawn_app() -> TestApp {
    let provider = MockServer::start().await;
    let pool = db::connect_in_memory().await.expect("in-memory db");
    let client = BlandClient::new(&ProviderConfig {
        api_key: Some("test-key".to_string()),
        base_url: provider.uri(),
        webhook_url: WEBHOOK_URL.to_string(),
        timeout: Duration::from_secs(5),
    })
    .expect("provider client builds");

    let settings = ServiceSettings {
        webhook_url: WEBHOOK_URL.to_string(),
        ..ServiceSettings::default()
    };
    let ctx = Arc::new(AppContext::new(
        pool,
        Arc::new(client),
        Arc::new(DisabledEmbedder),
        settings,
    ));

    TestApp {
        router: api_router(ctx.clone()),
        ctx,
        provider,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json payload")
        };
        (status, payload)
    }

    /// Posts a raw CSV body.
    pub async fn send_csv(&self, uri: &str, token: &str, csv: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(csv.to_string()))
            .expect("request builds");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json payload"))
    }

    /// Registers a dashboard user and returns a bearer token for it.
    pub async fn login(&self) -> String {
        let (status, _) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": "Grace Hopper",
                    "email": "grace@example.com",
                    "phone_number": "+14155550199",
                    "password": "cobol-rules",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "grace@example.com", "password": "cobol-rules" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"]
            .as_str()
            .expect("access token issued")
            .to_string()
    }
}
