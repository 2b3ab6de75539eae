// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app_with, small_site, test_settings, wait_for_terminal};
use serde_json::{json, Value};
use std::time::Duration;

/// 使用单连接的内存 SQLite，保证所有查询落在同一个数据库上
fn sqlite_settings() -> seoscope::config::settings::Settings {
    let mut settings = test_settings();
    settings.database.url = Some("sqlite::memory:".to_string());
    settings.database.max_connections = Some(1);
    settings.database.min_connections = Some(1);
    settings
}

#[tokio::test]
async fn test_evicted_crawl_is_served_from_archive() {
    let site = small_site().await;
    let test_app = create_test_app_with(sqlite_settings()).await;

    let started: Value = test_app
        .server
        .post("/api/seo-audit/site-crawl/start")
        .json(&json!({ "url": site.uri(), "maxDepth": 1 }))
        .await
        .json();
    let id = started["id"].as_str().unwrap().to_string();
    let status_url = format!("/api/seo-audit/site-crawl/{}", id);

    let live = wait_for_terminal(&test_app.server, &status_url, None).await;
    assert_eq!(live["status"], "completed");

    // The archive write happens right after the job turns terminal
    tokio::time::sleep(Duration::from_millis(200)).await;
    let far_future = chrono::Utc::now() + chrono::Duration::days(30);
    assert_eq!(test_app.app.crawl_store.purge_terminal_before(far_future), 1);

    let archived: Value = test_app.server.get(&status_url).await.json();
    assert_eq!(archived["status"], "completed");
    assert_eq!(archived["pages"], live["pages"]);
    assert_eq!(archived["summary"], live["summary"]);
}

#[tokio::test]
async fn test_failed_audit_is_served_from_archive() {
    let test_app = create_test_app_with(sqlite_settings()).await;
    let site = wiremock::MockServer::start().await;
    super::helpers::mount_page(&site, "/", 503, "down".to_string()).await;

    let started: Value = test_app
        .server
        .post("/api/seo-audit/start")
        .json(&json!({ "url": site.uri() }))
        .await
        .json();
    let id = started["auditId"].as_str().unwrap().to_string();
    let status_url = format!("/api/seo-audit/status/{}", id);

    let live = wait_for_terminal(&test_app.server, &status_url, None).await;
    assert_eq!(live["status"], "failed");

    tokio::time::sleep(Duration::from_millis(200)).await;
    let far_future = chrono::Utc::now() + chrono::Duration::days(30);
    assert_eq!(test_app.app.audit_store.purge_terminal_before(far_future), 1);

    let archived: Value = test_app.server.get(&status_url).await.json();
    assert_eq!(archived, live);
}
