// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::audit_report::{ComprehensiveAudit, Issue, Severity};

/// 单页审计对外返回的统一结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedAuditResult {
    pub url: String,
    pub audited_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub overall_score: u8,
    pub page_data: PageData,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<Recommendation>,
    pub comprehensive: ComprehensiveAudit,
}

/// 页面元数据概览
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_count: u32,
    pub h2_count: u32,
    pub h3_count: u32,
    pub word_count: u32,
    pub images_total: u32,
    pub images_missing_alt: u32,
    pub internal_links: u32,
    pub external_links: u32,
    /// 由 LCP 估算的加载时间（毫秒）
    pub load_time_ms: u64,
    pub canonical: Option<String>,
    pub noindex: bool,
}

/// 建议级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationLevel {
    Critical,
    Warning,
    Suggestion,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub level: RecommendationLevel,
    /// 1 最高，3 最低
    pub priority: u8,
    pub category: String,
    pub title: String,
    pub description: String,
}

impl From<&Issue> for Recommendation {
    fn from(issue: &Issue) -> Self {
        let (level, priority) = match issue.severity {
            Severity::High => (RecommendationLevel::Critical, 1),
            Severity::Medium => (RecommendationLevel::Warning, 2),
            Severity::Low => (RecommendationLevel::Suggestion, 3),
        };
        Self {
            level,
            priority,
            category: "Issue".to_string(),
            title: issue.title.clone(),
            description: issue.recommendation.clone(),
        }
    }
}

impl UnifiedAuditResult {
    /// 由综合审计结果组装统一结果
    ///
    /// 建议列表先按问题映射（high→critical/1，medium→warning/2，low→suggestion/3），
    /// 再追加快速改进项
    pub fn build(
        url: &str,
        keyword: Option<String>,
        email: Option<String>,
        comprehensive: ComprehensiveAudit,
    ) -> Self {
        let page_data = PageData {
            title: comprehensive.meta.title.clone(),
            meta_description: comprehensive.meta.meta_description.clone(),
            h1_count: comprehensive.h_tags.h1.len() as u32,
            h2_count: comprehensive.h_tags.h2.len() as u32,
            h3_count: comprehensive.h_tags.h3.len() as u32,
            word_count: comprehensive.stats.word_count,
            images_total: comprehensive.stats.images,
            images_missing_alt: comprehensive.stats.images_without_alt,
            internal_links: comprehensive.stats.internal_links,
            external_links: comprehensive.stats.external_links,
            load_time_ms: (comprehensive.performance_metrics.largest_contentful_paint * 1000.0)
                .round()
                .max(0.0) as u64,
            canonical: comprehensive.meta.canonical.clone(),
            noindex: comprehensive.meta.is_noindex(),
        };

        let mut recommendations: Vec<Recommendation> =
            comprehensive.issues.iter().map(Recommendation::from).collect();
        recommendations.extend(comprehensive.quick_wins.iter().map(|win| Recommendation {
            level: RecommendationLevel::Suggestion,
            priority: 3,
            category: "Quick Win".to_string(),
            title: win.title.clone(),
            description: win.description.clone(),
        }));

        Self {
            url: url.to_string(),
            audited_at: comprehensive.audited_at,
            keyword,
            email,
            overall_score: comprehensive.scores.overall,
            page_data,
            issues: comprehensive.issues.clone(),
            recommendations,
            comprehensive,
        }
    }
}
