//! Contact list maintenance over HTTP: CSV import, batch creation and search.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::spawn_app;

#[tokio::test]
async fn csv_import_reports_row_errors_and_duplicates() {
    let app = spawn_app().await;
    let token = app.login().await;

    let csv = "name,phone_number,company_name,email,tags\n\
               Ada Lovelace,+14155550100,Analytical,ada@example.com,vip\n\
               ,+14155550101,,,\n\
               Ada Again,+14155550100,,,\n\
               Bob Smith,+14155550102,,,\n";
    let (status, summary) = app.send_csv("/api/contacts/import", &token, csv).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["created"], 2);
    assert_eq!(summary["errors"], 2);
    assert_eq!(summary["message"], "Import completed. Created 2 contacts.");

    let details: Vec<_> = summary["error_details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail.as_str().unwrap().to_string())
        .collect();
    assert!(details.iter().any(|detail| detail.starts_with("Row 2:")));
    assert!(details
        .iter()
        .any(|detail| detail.starts_with("Contact 'Ada Again':")));

    let (status, found) = app
        .send(Method::GET, "/api/contacts/search/analytical", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["contacts"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn csv_without_phone_column_is_rejected() {
    let app = spawn_app().await;
    let token = app.login().await;

    let (status, _) = app
        .send_csv("/api/contacts/import", &token, "name,email\nAda,ada@example.com\n")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_create_collects_errors_per_row() {
    let app = spawn_app().await;
    let token = app.login().await;

    let (status, outcome) = app
        .send(
            Method::POST,
            "/api/contacts/batch",
            Some(&token),
            Some(json!([
                { "name": "Ada", "phone_number": "+14155550100" },
                { "name": "", "phone_number": "+14155550101" },
                { "name": "Bob", "phone_number": "0123" },
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["created"], 1);
    assert_eq!(outcome["errors"], 2);
    assert_eq!(outcome["error_details"][0], "Row 2: Name is required");

    let (status, stats) = app
        .send(Method::GET, "/api/contacts/stats/summary", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["stats"]["total_contacts"], 1);
}
