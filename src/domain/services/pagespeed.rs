// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::models::audit_report::{MetricsSource, PerformanceMetrics};

/// 无法获取真实数据时的性能得分
pub const FALLBACK_PERFORMANCE_SCORE: u8 = 70;

/// PageSpeed 服务错误
#[derive(Error, Debug)]
pub enum PageSpeedError {
    /// 未配置 API 密钥
    #[error("PageSpeed API key not configured")]
    NotConfigured,
    /// 请求失败
    #[error("PageSpeed request failed: {0}")]
    Request(String),
    /// 请求超时
    #[error("PageSpeed request timed out")]
    Timeout,
    /// 服务返回非成功状态码
    #[error("PageSpeed returned HTTP {0}")]
    Status(u16),
    /// 响应无法解析
    #[error("Invalid PageSpeed response: {0}")]
    InvalidResponse(String),
}

impl PageSpeedError {
    /// 判断错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            PageSpeedError::Request(_) | PageSpeedError::Timeout => true,
            PageSpeedError::Status(code) => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// 测试设备策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Mobile,
    Desktop,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strategy::Mobile => write!(f, "mobile"),
            Strategy::Desktop => write!(f, "desktop"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mobile" => Ok(Strategy::Mobile),
            "desktop" => Ok(Strategy::Desktop),
            _ => Err(()),
        }
    }
}

/// 性能评估结果
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub score: u8,
    pub metrics: PerformanceMetrics,
    pub opportunities: Vec<String>,
    pub diagnostics: Vec<String>,
    pub source: MetricsSource,
}

/// 外部页面性能评分服务
#[async_trait]
pub trait PageSpeedProvider: Send + Sync {
    async fn analyze(&self, url: &str, strategy: Strategy)
        -> Result<PerformanceReport, PageSpeedError>;
}

/// 占位性能指标
pub fn fallback_metrics() -> PerformanceMetrics {
    PerformanceMetrics {
        first_contentful_paint: 0.7,
        largest_contentful_paint: 0.7,
        total_blocking_time: 60.0,
        cumulative_layout_shift: 0.021,
        speed_index: 0.7,
        time_to_interactive: 1.0,
        max_potential_fid: 110.0,
        interaction_to_next_paint: None,
    }
}

/// 构造占位性能结果
///
/// 得分固定为 70，机会与诊断列表的第一条说明原因，其余为固定条目
pub fn fallback_report(reason: &str) -> PerformanceReport {
    let mut opportunities = vec![format!(
        "Live performance data unavailable ({}); showing typical estimates",
        reason
    )];
    opportunities.extend(
        [
            "Use efficient cache lifetimes - Est savings of 4 KiB",
            "Eliminate render-blocking resources - Est savings of 390 ms",
            "Reduce unused CSS - Est savings of 12 KiB",
            "Reduce unused JavaScript - Est savings of 90 KiB",
            "Legacy JavaScript - Est savings of 13 KiB",
        ]
        .into_iter()
        .map(String::from),
    );

    let mut diagnostics = vec![format!(
        "Configure a PageSpeed Insights API key to replace placeholder metrics ({})",
        reason
    )];
    diagnostics.extend(
        [
            "Document request latency",
            "Optimize DOM size",
            "Duplicated JavaScript",
            "Font display",
            "Forced reflow",
            "Improve image delivery",
        ]
        .into_iter()
        .map(String::from),
    );

    PerformanceReport {
        score: FALLBACK_PERFORMANCE_SCORE,
        metrics: fallback_metrics(),
        opportunities,
        diagnostics,
        source: MetricsSource::Fallback,
    }
}

/// 依据 Core Web Vitals 阈值生成优化建议
///
/// LCP ≤ 2.5s、CLS ≤ 0.1、INP ≤ 200ms、FCP ≤ 1.8s、TBT ≤ 200ms、SI ≤ 3.4s
pub fn opportunities_for(metrics: &PerformanceMetrics) -> Vec<String> {
    let mut out = Vec::new();
    if metrics.largest_contentful_paint > 2.5 {
        out.push(format!(
            "Largest Contentful Paint is {:.1}s; optimize the hero image and server response time",
            metrics.largest_contentful_paint
        ));
    }
    if metrics.cumulative_layout_shift > 0.1 {
        out.push(format!(
            "Cumulative Layout Shift is {:.3}; reserve space for images, ads and embeds",
            metrics.cumulative_layout_shift
        ));
    }
    if let Some(inp) = metrics.interaction_to_next_paint {
        if inp > 200.0 {
            out.push(format!(
                "Interaction to Next Paint is {:.0}ms; break up long JavaScript tasks",
                inp
            ));
        }
    }
    if metrics.first_contentful_paint > 1.8 {
        out.push(format!(
            "First Contentful Paint is {:.1}s; eliminate render-blocking resources",
            metrics.first_contentful_paint
        ));
    }
    if metrics.total_blocking_time > 200.0 {
        out.push(format!(
            "Total Blocking Time is {:.0}ms; reduce unused JavaScript",
            metrics.total_blocking_time
        ));
    }
    if metrics.speed_index > 3.4 {
        out.push(format!(
            "Speed Index is {:.1}s; minimize main-thread work",
            metrics.speed_index
        ));
    }
    out
}

/// 按得分区间给出诊断
pub fn diagnostics_for(score: u8) -> Vec<String> {
    let lines: &[&str] = if score >= 90 {
        &["Performance is good; keep monitoring Core Web Vitals after each release"]
    } else if score >= 70 {
        &[
            "Performance needs improvement on slower devices",
            "Review image formats and caching headers",
        ]
    } else if score >= 50 {
        &[
            "Performance is below average",
            "Audit third-party scripts and defer non-critical JavaScript",
            "Compress and resize images",
        ]
    } else {
        &[
            "Performance is poor and likely hurts rankings and conversions",
            "Reduce JavaScript execution time",
            "Serve static assets from a CDN with long cache lifetimes",
            "Optimize the critical rendering path",
        ]
    };
    lines.iter().map(|s| s.to_string()).collect()
}
