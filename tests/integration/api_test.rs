// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{as_user, create_test_app, small_site, wait_for_terminal};
use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_health_and_version() {
    let test_app = create_test_app().await;

    let health = test_app.server.get("/health").await;
    health.assert_status_ok();
    health.assert_text("OK");

    let version = test_app.server.get("/api/version").await;
    version.assert_status_ok();
    version.assert_text(env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_dashboard_crawl_requires_authentication() {
    let site = small_site().await;
    let test_app = create_test_app().await;

    test_app
        .server
        .post("/api/dashboard/page-crawler/start")
        .json(&json!({ "url": site.uri() }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = as_user(
        test_app.server.post("/api/dashboard/page-crawler/start"),
        Some("member"),
    )
    .json(&json!({ "url": site.uri(), "maxPages": 3, "maxDepth": 0 }))
    .await;
    response.assert_status(StatusCode::ACCEPTED);
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let body = wait_for_terminal(
        &test_app.server,
        &format!("/api/seo-audit/site-crawl/{}", id),
        Some("member"),
    )
    .await;
    // Dashboard bounds: pages 10-100, depth 1-5
    assert_eq!(body["maxPages"], 10);
    assert_eq!(body["maxDepth"], 1);
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn test_invalid_crawl_input_is_rejected() {
    let test_app = create_test_app().await;

    for url in ["", "   ", "https://"] {
        let response = test_app
            .server
            .post("/api/seo-audit/site-crawl/start")
            .json(&json!({ "url": url }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["error"].is_string());
    }
}

#[tokio::test]
async fn test_unknown_crawl_status_and_cancel() {
    let test_app = create_test_app().await;
    let id = Uuid::new_v4();

    let body: Value = test_app
        .server
        .get(&format!("/api/seo-audit/site-crawl/{}", id))
        .await
        .json();
    assert_eq!(body, json!({ "status": "not_found" }));

    test_app
        .server
        .post(&format!("/api/seo-audit/site-crawl/{}/cancel", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
