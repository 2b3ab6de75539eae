// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::settings::PageSpeedSettings;
use crate::domain::models::audit_report::{MetricsSource, PerformanceMetrics};
use crate::domain::services::pagespeed::{
    diagnostics_for, fallback_metrics, opportunities_for, PageSpeedError, PageSpeedProvider,
    PerformanceReport, Strategy,
};
use crate::utils::retry_policy::RetryPolicy;

const CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};
const FAILURE_WINDOW: Duration = Duration::from_secs(10 * 60);
const FAILURE_THRESHOLD: u32 = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PsiResponse {
    loading_experience: Option<LoadingExperience>,
    lighthouse_result: Option<LighthouseResult>,
}

/// 真实用户数据（CrUX）
#[derive(Debug, Deserialize)]
struct LoadingExperience {
    #[serde(default)]
    metrics: HashMap<String, FieldMetric>,
}

#[derive(Debug, Deserialize)]
struct FieldMetric {
    percentile: Option<f64>,
}

/// 实验室数据（Lighthouse）
#[derive(Debug, Deserialize)]
struct LighthouseResult {
    #[serde(default)]
    audits: HashMap<String, LabAudit>,
    categories: Option<Categories>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabAudit {
    numeric_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Categories {
    performance: Option<CategoryScore>,
}

#[derive(Debug, Deserialize)]
struct CategoryScore {
    score: Option<f64>,
}

impl PsiResponse {
    fn field(&self, name: &str) -> Option<f64> {
        self.loading_experience
            .as_ref()?
            .metrics
            .get(name)?
            .percentile
            .filter(|v| *v > 0.0)
    }

    fn lab(&self, audit: &str) -> Option<f64> {
        self.lighthouse_result
            .as_ref()?
            .audits
            .get(audit)?
            .numeric_value
            .filter(|v| *v > 0.0)
    }

    fn score(&self) -> Option<f64> {
        self.lighthouse_result
            .as_ref()?
            .categories
            .as_ref()?
            .performance
            .as_ref()?
            .score
    }
}

/// 将接口响应转换为性能结果
///
/// LCP、CLS、INP 优先使用真实用户数据，其余指标取实验室数据；
/// 单项缺失时使用占位值，缺少总分视为无效响应
fn parse_report(data: &PsiResponse) -> Result<PerformanceReport, PageSpeedError> {
    let raw_score = data
        .score()
        .ok_or_else(|| PageSpeedError::InvalidResponse("missing performance score".to_string()))?;
    let score = (raw_score * 100.0).round().clamp(0.0, 100.0) as u8;

    let defaults = fallback_metrics();
    let seconds = |ms: f64| ms / 1000.0;

    let metrics = PerformanceMetrics {
        largest_contentful_paint: data
            .field("LARGEST_CONTENTFUL_PAINT_MS")
            .or_else(|| data.lab("largest-contentful-paint"))
            .map(seconds)
            .unwrap_or(defaults.largest_contentful_paint),
        // Field CLS percentile is reported x100
        cumulative_layout_shift: data
            .field("CUMULATIVE_LAYOUT_SHIFT_SCORE")
            .map(|v| v / 100.0)
            .or_else(|| data.lab("cumulative-layout-shift"))
            .unwrap_or(defaults.cumulative_layout_shift),
        interaction_to_next_paint: data
            .field("INTERACTION_TO_NEXT_PAINT")
            .or_else(|| data.field("INTERACTION_TO_NEXT_PAINT_MS"))
            .or_else(|| data.lab("interaction-to-next-paint")),
        first_contentful_paint: data
            .lab("first-contentful-paint")
            .map(seconds)
            .unwrap_or(defaults.first_contentful_paint),
        total_blocking_time: data
            .lab("total-blocking-time")
            .unwrap_or(defaults.total_blocking_time),
        speed_index: data
            .lab("speed-index")
            .map(seconds)
            .unwrap_or(defaults.speed_index),
        time_to_interactive: data
            .lab("interactive")
            .map(seconds)
            .unwrap_or(defaults.time_to_interactive),
        max_potential_fid: data
            .lab("max-potential-fid")
            .unwrap_or(defaults.max_potential_fid),
    };

    Ok(PerformanceReport {
        score,
        opportunities: opportunities_for(&metrics),
        diagnostics: diagnostics_for(score),
        metrics,
        source: MetricsSource::PageSpeed,
    })
}

/// 失败率监控窗口
struct FailureWindow {
    started: Instant,
    count: u32,
}

/// Google PageSpeed Insights v5 客户端
///
/// 带指数退避重试、进程内 TTL 缓存（键为 `url|strategy`）和失败率告警
pub struct PsiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    retry: RetryPolicy,
    cache_ttl: Duration,
    cache: Mutex<LruCache<String, (Instant, PerformanceReport)>>,
    failures: Mutex<FailureWindow>,
}

impl PsiClient {
    /// 创建客户端
    ///
    /// # 参数
    ///
    /// * `api_key` - PageSpeed Insights API 密钥
    /// * `settings` - 接口地址、超时、重试与缓存配置
    pub fn new(api_key: String, settings: &PageSpeedSettings) -> Result<Self, PageSpeedError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PageSpeedError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key,
            timeout: Duration::from_secs(settings.timeout_secs),
            retry: RetryPolicy::with_max_retries(settings.max_retries),
            cache_ttl: Duration::from_secs(settings.cache_ttl_secs),
            cache: Mutex::new(LruCache::new(CACHE_CAPACITY)),
            failures: Mutex::new(FailureWindow {
                started: Instant::now(),
                count: 0,
            }),
        })
    }

    /// 仅在配置了非空密钥时创建客户端
    pub fn from_settings(settings: &PageSpeedSettings) -> Result<Option<Self>, PageSpeedError> {
        match settings.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Self::new(key.to_string(), settings).map(Some),
            _ => {
                info!("PageSpeed API key not set, performance scores will use fallback data");
                Ok(None)
            }
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn cached(&self, key: &str) -> Option<PerformanceReport> {
        let mut cache = self.cache.lock();
        let fresh = cache
            .get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.cache_ttl)
            .map(|(_, report)| report.clone());
        if fresh.is_none() {
            cache.pop(key);
        }
        fresh
    }

    fn record_failure(&self) {
        let mut window = self.failures.lock();
        if window.started.elapsed() > FAILURE_WINDOW {
            window.started = Instant::now();
            window.count = 0;
        }
        window.count += 1;
        if window.count >= FAILURE_THRESHOLD {
            warn!(
                failures = window.count,
                "PageSpeed API failing repeatedly in the last 10 minutes, check quota or service health"
            );
        }
    }

    async fn request_once(
        &self,
        url: &str,
        strategy: Strategy,
    ) -> Result<PerformanceReport, PageSpeedError> {
        let strategy = strategy.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", url),
                ("key", self.api_key.as_str()),
                ("strategy", strategy.as_str()),
                ("category", "performance"),
                ("prettyPrint", "false"),
            ])
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PageSpeedError::Timeout
                } else {
                    PageSpeedError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageSpeedError::Status(status.as_u16()));
        }

        let body: PsiResponse = response
            .json()
            .await
            .map_err(|e| PageSpeedError::InvalidResponse(e.to_string()))?;
        parse_report(&body)
    }
}

#[async_trait]
impl PageSpeedProvider for PsiClient {
    async fn analyze(
        &self,
        url: &str,
        strategy: Strategy,
    ) -> Result<PerformanceReport, PageSpeedError> {
        let cache_key = format!("{}|{}", url, strategy);
        if let Some(report) = self.cached(&cache_key) {
            debug!(url, %strategy, "PageSpeed cache hit");
            return Ok(report);
        }

        let mut attempt = 0;
        loop {
            match self.request_once(url, strategy).await {
                Ok(report) => {
                    debug!(url, %strategy, score = report.score, "PageSpeed data retrieved");
                    self.cache
                        .lock()
                        .put(cache_key, (Instant::now(), report.clone()));
                    return Ok(report);
                }
                Err(e) => {
                    self.record_failure();
                    warn!(url, attempt = attempt + 1, error = %e, "PageSpeed request failed");
                    if !e.is_retryable() || !self.retry.should_retry(attempt) {
                        return Err(e);
                    }
                    attempt += 1;
                    tokio::time::sleep(self.retry.calculate_backoff(attempt)).await;
                }
            }
        }
    }
}
