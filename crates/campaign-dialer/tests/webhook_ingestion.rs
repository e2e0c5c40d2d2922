//! Provider webhooks: validation, neutral-call follow-ups and redelivery.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use common::spawn_app;

#[tokio::test]
async fn missing_call_id_is_rejected() {
    let app = spawn_app().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/webhook",
            None,
            Some(json!({ "to": "+14155550100" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing call_id");
}

#[tokio::test]
async fn neutral_call_schedules_one_follow_up() {
    let app = spawn_app().await;
    let token = app.login().await;
    Mock::given(method("POST"))
        .and(path("/v1/calls/call-n/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "answers": ["neutral", "in 2 hours"] })),
        )
        .mount(&app.provider)
        .await;

    let payload = json!({
        "call_id": "call-n",
        "to": "+14155550100",
        "completed": true,
        "concatenated_transcript": "Maybe later.",
        "metadata": { "batch_id": "batch_manual", "pathway_id": "pw-1" },
    });

    let (status, receipt) = app
        .send(Method::POST, "/bland/postcall", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["sentiment"], "neutral");
    assert_eq!(
        receipt["follow_up"],
        json!({ "status": "scheduled", "delay_seconds": 7200 })
    );
    assert_eq!(app.ctx.follow_ups.stats().pending, 1);

    let (status, call) = app
        .send(Method::GET, "/api/calls/call-n", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(call["followup_scheduled"], true);
    assert_eq!(call["batch_id"], "batch_manual");

    let (status, receipt) = app
        .send(Method::POST, "/webhook", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["follow_up"]["status"], "none");
    assert_eq!(app.ctx.follow_ups.stats().pending, 1);

    let (status, listed) = app
        .send(Method::GET, "/api/calls?limit=5000", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn failed_analysis_still_stores_the_call() {
    let app = spawn_app().await;
    let token = app.login().await;
    Mock::given(method("POST"))
        .and(path("/v1/calls/call-x/analyze"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&app.provider)
        .await;

    let (status, receipt) = app
        .send(
            Method::POST,
            "/webhook",
            None,
            Some(json!({ "call_id": "call-x", "completed": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["sentiment"], "unknown");

    let (status, call) = app
        .send(Method::GET, "/api/calls/call-x", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(call["emotion"], "unknown");
    assert_eq!(call["completed"], false);
}
