// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::{
    audit_use_case::AuditUseCase, crawl_use_case::CrawlUseCase, usage_use_case::UsageUseCase,
};
use crate::presentation::handlers::{audit_handler, crawl_handler, usage_handler};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 路由依赖的用例集合
#[derive(Clone)]
pub struct AppServices {
    pub crawl: Arc<CrawlUseCase>,
    pub audit: Arc<AuditUseCase>,
    pub usage: Arc<UsageUseCase>,
}

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(services: AppServices) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/version", get(version));

    let api_routes = Router::new()
        .route(
            "/api/seo-audit/site-crawl/start",
            post(crawl_handler::start_crawl),
        )
        .route(
            "/api/dashboard/page-crawler/start",
            post(crawl_handler::start_dashboard_crawl),
        )
        .route(
            "/api/seo-audit/site-crawl/{id}",
            get(crawl_handler::get_crawl_status),
        )
        .route(
            "/api/seo-audit/site-crawl/{id}/cancel",
            post(crawl_handler::cancel_crawl),
        )
        .route("/api/seo-audit/start", post(audit_handler::start_audit))
        .route(
            "/api/seo-audit/status/{id}",
            get(audit_handler::get_audit_status),
        )
        .route("/api/usage", get(usage_handler::get_usage))
        .layer(Extension(services.crawl))
        .layer(Extension(services.audit))
        .layer(Extension(services.usage));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
