// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use seoscope::bootstrap::{self, Application};
use seoscope::config::settings::Settings;
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub app: Application,
}

/// 测试配置：允许访问本地地址，关闭指标导出与 PageSpeed
pub fn test_settings() -> Settings {
    let mut settings = Settings::defaults().expect("default settings");
    settings.fetch.block_private_networks = false;
    settings.fetch.timeout_secs = 5;
    settings.metrics.enabled = false;
    settings.pagespeed.api_key = None;
    settings
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(test_settings()).await
}

pub async fn create_test_app_with(settings: Settings) -> TestApp {
    let app = bootstrap::build(&settings).await.expect("build application");
    let server = TestServer::new(app.router.clone()).expect("test server");
    TestApp { server, app }
}

/// 给请求加上身份头
pub fn as_user(request: TestRequest, user: Option<&str>) -> TestRequest {
    match user {
        Some(user) => request.add_header(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_str(user).expect("header value"),
        ),
        None => request,
    }
}

/// 轮询直到任务离开 processing 状态
pub async fn wait_for_terminal(server: &TestServer, url: &str, user: Option<&str>) -> Value {
    for _ in 0..200 {
        let body: Value = as_user(server.get(url), user).await.json();
        if body["status"] != "processing" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job at {} did not finish in time", url);
}

pub fn html_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect();
    format!(
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8">
<title>{title}</title><meta name="description" content="About {title}">
<meta name="viewport" content="width=device-width"></head>
<body><h1>{title}</h1><p>Plain words for counting on this page.</p>
<img src="/logo.png" alt="logo"><img src="/hero.png"><ul>{anchors}</ul></body></html>"#,
        title = title,
        anchors = anchors
    )
}

/// 挂载一个返回HTML的页面
pub async fn mount_page(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

/// 根页面链接到 /about 与 /contact，/about 再链接到 /deep
pub async fn small_site() -> MockServer {
    let site = MockServer::start().await;
    mount_page(&site, "/", 200, html_page("Home", &["/about", "/contact", "#top", "mailto:x@y.z"])).await;
    mount_page(&site, "/about", 200, html_page("About", &["/", "/deep"])).await;
    mount_page(&site, "/contact", 200, html_page("Contact", &[])).await;
    mount_page(&site, "/deep", 200, html_page("Deep", &[])).await;
    site
}
