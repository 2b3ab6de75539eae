// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, create_test_app_with, html_page, mount_page, test_settings, wait_for_terminal};
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const START: &str = "/api/seo-audit/start";

fn status_url(id: &str) -> String {
    format!("/api/seo-audit/status/{}", id)
}

async fn start_audit(server: &axum_test::TestServer, body: Value) -> String {
    let response = server.post(START).json(&body).await;
    response.assert_status(StatusCode::ACCEPTED);
    let started: Value = response.json();
    assert_eq!(started["status"], "processing");
    started["auditId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_audit_without_pagespeed_uses_fallback_performance() {
    let site = MockServer::start().await;
    mount_page(&site, "/", 200, html_page("Fallback Page", &["/about"])).await;
    let test_app = create_test_app().await;

    let id = start_audit(
        &test_app.server,
        json!({ "url": site.uri(), "keyword": "fallback", "email": "owner@example.com" }),
    )
    .await;

    let body = wait_for_terminal(&test_app.server, &status_url(&id), None).await;
    assert_eq!(body["status"], "completed");

    let data = &body["data"];
    assert_eq!(data["keyword"], "fallback");
    assert_eq!(data["email"], "owner@example.com");
    assert_eq!(data["pageData"]["title"], "Fallback Page");
    assert_eq!(data["pageData"]["imagesMissingAlt"], 1);

    let comprehensive = &data["comprehensive"];
    assert_eq!(comprehensive["performance_source"], "fallback");
    assert!(!comprehensive["opportunities"].as_array().unwrap().is_empty());
    assert!(!comprehensive["diagnostics"].as_array().unwrap().is_empty());

    let scores = &comprehensive["scores"];
    assert_eq!(scores["performance"], 70);
    let sum: u64 = ["performance", "accessibility", "indexability", "seo", "best_practices"]
        .iter()
        .map(|k| scores[*k].as_u64().unwrap())
        .sum();
    let expected = (sum as f64 / 5.0).round() as u64;
    assert_eq!(scores["overall"].as_u64().unwrap(), expected);
    assert_eq!(data["overallScore"].as_u64().unwrap(), expected);
}

#[tokio::test]
async fn test_audit_with_pagespeed_uses_reported_score() {
    let site = MockServer::start().await;
    mount_page(&site, "/", 200, html_page("Measured Page", &[])).await;

    let psi = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runPagespeed"))
        .and(query_param("strategy", "mobile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lighthouseResult": {
                "categories": { "performance": { "score": 0.91 } },
                "audits": {
                    "largest-contentful-paint": { "numericValue": 1800.0 },
                    "first-contentful-paint": { "numericValue": 900.0 }
                }
            }
        })))
        .expect(1)
        .mount(&psi)
        .await;

    let mut settings = test_settings();
    settings.pagespeed.api_key = Some("test-key".to_string());
    settings.pagespeed.endpoint = format!("{}/runPagespeed", psi.uri());
    let test_app = create_test_app_with(settings).await;

    let id = start_audit(&test_app.server, json!({ "url": site.uri() })).await;
    let body = wait_for_terminal(&test_app.server, &status_url(&id), None).await;

    assert_eq!(body["status"], "completed");
    let comprehensive = &body["data"]["comprehensive"];
    assert_eq!(comprehensive["performance_source"], "page_speed");
    assert_eq!(comprehensive["scores"]["performance"], 91);
    assert_eq!(body["data"]["pageData"]["loadTimeMs"], 1800);
}

#[tokio::test]
async fn test_audit_of_error_page_fails() {
    let site = MockServer::start().await;
    mount_page(&site, "/", 500, "oops".to_string()).await;
    let test_app = create_test_app().await;

    let id = start_audit(&test_app.server, json!({ "url": site.uri() })).await;
    let body = wait_for_terminal(&test_app.server, &status_url(&id), None).await;

    assert_eq!(body, json!({ "status": "failed", "error": "Failed to fetch page: HTTP 500" }));
}

#[tokio::test]
async fn test_audit_over_time_budget_fails() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Slow", &[]), "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&site)
        .await;

    let mut settings = test_settings();
    settings.audit.timeout_secs = 1;
    let test_app = create_test_app_with(settings).await;

    let id = start_audit(&test_app.server, json!({ "url": site.uri() })).await;

    let processing: Value = test_app.server.get(&status_url(&id)).await.json();
    assert_eq!(processing["status"], "processing");
    assert!(processing["elapsedMs"].is_number());

    let body = wait_for_terminal(&test_app.server, &status_url(&id), None).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"], "Audit timed out");
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_any_job_starts() {
    let test_app = create_test_app().await;

    test_app
        .server
        .post(START)
        .json(&json!({ "url": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    test_app
        .server
        .post(START)
        .json(&json!({ "url": "example.com", "email": "not-an-email" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    test_app
        .server
        .post(START)
        .json(&json!({ "url": "https://" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_audit_is_not_found() {
    let test_app = create_test_app().await;
    let body: Value = test_app
        .server
        .get(&status_url(&Uuid::new_v4().to_string()))
        .await
        .json();
    assert_eq!(body, json!({ "status": "not_found" }));
}
