// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;

/// 安装 Prometheus 导出器并注册指标说明
///
/// 地址无效或端口被占用时只记录警告，服务照常运行
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(listen_addr = %settings.listen_addr, error = %e, "Invalid metrics address");
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!("crawl_jobs_started_total", "Site crawls accepted");
    describe_counter!("crawl_jobs_completed_total", "Site crawls finished");
    describe_counter!(
        "crawl_jobs_failed_total",
        "Site crawls that failed or were cancelled"
    );
    describe_counter!("crawl_pages_fetched_total", "Pages fetched by site crawls");
    describe_counter!(
        "crawl_page_errors_total",
        "Crawled pages that failed to fetch or returned non-2xx"
    );
    describe_histogram!(
        "crawl_duration_seconds",
        Unit::Seconds,
        "Wall-clock duration of site crawls"
    );
    describe_counter!("audit_jobs_started_total", "Single-page audits accepted");
    describe_counter!("audit_jobs_completed_total", "Single-page audits finished");
    describe_counter!("audit_jobs_failed_total", "Single-page audits that failed");
    describe_counter!(
        "pagespeed_failures_total",
        "PageSpeed lookups replaced by fallback metrics"
    );
    describe_counter!("quota_denied_total", "Job starts rejected by the monthly quota");
}
