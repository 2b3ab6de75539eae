// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{as_user, create_test_app, html_page, mount_page, wait_for_terminal};
use axum::http::StatusCode;
use seoscope::domain::models::usage::UsageKind;
use serde_json::{json, Value};
use wiremock::MockServer;

#[tokio::test]
async fn test_thirty_first_audit_is_denied() {
    let test_app = create_test_app().await;
    for _ in 0..29 {
        test_app.app.quota.increment_usage("heavy", UsageKind::Audit).await;
    }

    let site = MockServer::start().await;
    mount_page(&site, "/", 200, html_page("Quota", &[])).await;

    // 29 recorded: the 30th audit is still allowed
    let response = as_user(test_app.server.post("/api/seo-audit/start"), Some("heavy"))
        .json(&json!({ "url": site.uri() }))
        .await;
    response.assert_status(StatusCode::ACCEPTED);
    let id = response.json::<Value>()["auditId"].as_str().unwrap().to_string();
    let body = wait_for_terminal(
        &test_app.server,
        &format!("/api/seo-audit/status/{}", id),
        Some("heavy"),
    )
    .await;
    assert_eq!(body["status"], "completed");

    // 30 recorded now
    let denied = as_user(test_app.server.post("/api/seo-audit/start"), Some("heavy"))
        .json(&json!({ "url": site.uri() }))
        .await;
    denied.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: Value = denied.json();
    assert_eq!(body["upgrade"], true);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

    // Anonymous callers are never metered
    as_user(test_app.server.post("/api/seo-audit/start"), None)
        .json(&json!({ "url": site.uri() }))
        .await
        .assert_status(StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_site_crawl_quota_is_separate_from_audits() {
    let test_app = create_test_app().await;
    for _ in 0..5 {
        test_app
            .app
            .quota
            .increment_usage("crawler", UsageKind::SiteCrawl)
            .await;
    }

    as_user(
        test_app.server.post("/api/seo-audit/site-crawl/start"),
        Some("crawler"),
    )
    .json(&json!({ "url": "https://example.com" }))
    .await
    .assert_status(StatusCode::PAYMENT_REQUIRED);

    let usage: Value = as_user(test_app.server.get("/api/usage"), Some("crawler"))
        .await
        .json();
    assert_eq!(usage["siteCrawls"]["used"], 5);
    assert_eq!(usage["siteCrawls"]["level"], "exceeded");
    assert_eq!(usage["audits"]["used"], 0);
    assert_eq!(usage["audits"]["level"], "ok");
}

#[tokio::test]
async fn test_usage_levels_and_authentication() {
    let test_app = create_test_app().await;

    test_app
        .server
        .get("/api/usage")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    for _ in 0..22 {
        test_app.app.quota.increment_usage("u1", UsageKind::Audit).await;
    }
    let usage: Value = as_user(test_app.server.get("/api/usage"), Some("u1"))
        .await
        .json();
    assert_eq!(usage["audits"]["used"], 22);
    assert_eq!(usage["audits"]["limit"], 30);
    assert_eq!(usage["audits"]["level"], "high");
    assert!(usage["monthKey"].as_str().is_some_and(|k| k.len() == 7));

    for _ in 0..5 {
        test_app.app.quota.increment_usage("u1", UsageKind::Audit).await;
    }
    let usage: Value = as_user(test_app.server.get("/api/usage"), Some("u1"))
        .await
        .json();
    assert_eq!(usage["audits"]["level"], "near-limit");
}
