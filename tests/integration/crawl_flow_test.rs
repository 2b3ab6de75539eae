// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{as_user, create_test_app, mount_page, small_site, wait_for_terminal};
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const START: &str = "/api/seo-audit/site-crawl/start";

fn status_url(id: &str) -> String {
    format!("/api/seo-audit/site-crawl/{}", id)
}

#[tokio::test]
async fn test_depth_one_crawl_collects_root_and_its_links() {
    let site = small_site().await;
    let test_app = create_test_app().await;

    let response = test_app
        .server
        .post(START)
        .json(&json!({ "url": site.uri(), "maxPages": 10, "maxDepth": 1 }))
        .await;
    response.assert_status(StatusCode::ACCEPTED);
    let started: Value = response.json();
    assert_eq!(started["status"], "processing");
    let id = started["id"].as_str().unwrap().to_string();

    let body = wait_for_terminal(&test_app.server, &status_url(&id), None).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["progress"], 100);
    assert_eq!(body["pagesProcessed"], 3);

    let pages = body["pages"].as_array().unwrap();
    let urls: HashSet<String> = pages
        .iter()
        .map(|p| p["url"].as_str().unwrap().to_string())
        .collect();
    let expected: HashSet<String> = ["/", "/about", "/contact"]
        .iter()
        .map(|p| format!("{}{}", site.uri(), p))
        .collect();
    assert_eq!(urls, expected);

    assert!(pages[0].get("comprehensive").is_some());
    assert!(pages[1..].iter().all(|p| p.get("comprehensive").is_none()));
    assert_eq!(pages[0]["images"], 2);
    assert_eq!(pages[0]["imagesWithoutAlt"], 1);

    let summary = &body["summary"];
    assert_eq!(summary["totalPages"], 3);
    assert_eq!(summary["errorPages"], 0);
    assert_eq!(summary["pagesMissingMetaDescription"], 0);
}

#[tokio::test]
async fn test_depth_zero_fetches_only_the_root() {
    let site = small_site().await;
    let test_app = create_test_app().await;

    let started: Value = test_app
        .server
        .post(START)
        .json(&json!({ "url": site.uri(), "maxDepth": 0 }))
        .await
        .json();
    let id = started["id"].as_str().unwrap();

    let body = wait_for_terminal(&test_app.server, &status_url(id), None).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["pages"].as_array().unwrap().len(), 1);
    assert_eq!(body["maxDepth"], 0);
}

#[tokio::test]
async fn test_page_limits_are_clamped() {
    let site = small_site().await;
    let test_app = create_test_app().await;

    let started: Value = test_app
        .server
        .post(START)
        .json(&json!({ "url": site.uri(), "maxPages": 5000, "maxDepth": 42 }))
        .await
        .json();
    let id = started["id"].as_str().unwrap();

    let body = wait_for_terminal(&test_app.server, &status_url(id), None).await;
    assert_eq!(body["maxPages"], 200);
    assert_eq!(body["maxDepth"], 5);
    // The whole site is four pages deep-linked from the root
    assert_eq!(body["pages"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_broken_pages_do_not_abort_the_crawl() {
    let site = MockServer::start().await;
    mount_page(
        &site,
        "/",
        200,
        super::helpers::html_page("Home", &["/gone", "/ok"]),
    )
    .await;
    mount_page(&site, "/gone", 404, "missing".to_string()).await;
    mount_page(&site, "/ok", 200, super::helpers::html_page("Ok", &[])).await;
    let test_app = create_test_app().await;

    let started: Value = test_app
        .server
        .post(START)
        .json(&json!({ "url": site.uri(), "maxDepth": 1 }))
        .await
        .json();
    let id = started["id"].as_str().unwrap();

    let body = wait_for_terminal(&test_app.server, &status_url(id), None).await;
    assert_eq!(body["status"], "completed");
    let pages = body["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 3);

    let gone = pages
        .iter()
        .find(|p| p["url"].as_str().unwrap().ends_with("/gone"))
        .unwrap();
    assert_eq!(gone["status"], 404);
    assert_eq!(gone["error"], "HTTP 404");
    assert_eq!(body["summary"]["errorPages"], 1);
}

#[tokio::test]
async fn test_cancel_fails_job_and_freezes_pages() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(super::helpers::html_page("Slow", &["/a"]), "text/html")
                .set_delay(Duration::from_millis(600)),
        )
        .mount(&site)
        .await;
    let test_app = create_test_app().await;

    let started: Value = test_app
        .server
        .post(START)
        .json(&json!({ "url": site.uri() }))
        .await
        .json();
    let id = started["id"].as_str().unwrap();

    let cancel = test_app
        .server
        .post(&format!("{}/cancel", status_url(id)))
        .await;
    cancel.assert_status_ok();
    let cancelled: Value = cancel.json();
    assert_eq!(cancelled["cancelled"], true);
    assert_eq!(cancelled["status"], "failed");

    // Second cancel is a no-op
    test_app
        .server
        .post(&format!("{}/cancel", status_url(id)))
        .await
        .assert_status_ok();

    tokio::time::sleep(Duration::from_millis(900)).await;
    let body: Value = test_app.server.get(&status_url(id)).await.json();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"], "cancelled");
    assert_eq!(body["pages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_owned_crawls_are_hidden_from_other_callers() {
    let site = small_site().await;
    let test_app = create_test_app().await;

    let started: Value = as_user(test_app.server.post(START), Some("owner-1"))
        .json(&json!({ "url": site.uri(), "maxDepth": 0 }))
        .await
        .json();
    let id = started["id"].as_str().unwrap();

    let body = wait_for_terminal(&test_app.server, &status_url(id), Some("owner-1")).await;
    assert_eq!(body["status"], "completed");

    let other: Value = as_user(test_app.server.get(&status_url(id)), Some("owner-2"))
        .await
        .json();
    assert_eq!(other, json!({ "status": "not_found" }));

    let anonymous: Value = test_app.server.get(&status_url(id)).await.json();
    assert_eq!(anonymous["status"], "not_found");

    as_user(
        test_app.server.post(&format!("{}/cancel", status_url(id))),
        Some("owner-2"),
    )
    .await
    .assert_status(StatusCode::NOT_FOUND);
}
