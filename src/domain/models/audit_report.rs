// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 综合审计结果
///
/// 单个页面的完整审计输出：分项得分、原始统计、标题结构、社交元数据、
/// 各类规则检查、性能指标以及由失败检查派生出的问题列表。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComprehensiveAudit {
    /// 被审计的URL
    pub url: String,
    /// 审计完成时间
    pub audited_at: DateTime<Utc>,
    /// 分项得分
    pub scores: Scores,
    /// 页面头部元数据
    pub meta: PageMeta,
    /// 原始统计数据
    pub stats: PageStats,
    /// H1/H2/H3 文本
    pub h_tags: HeadingTags,
    /// 社交元数据
    pub social_meta: SocialMeta,
    /// JSON-LD 结构化数据
    pub structured_data: StructuredData,
    /// 可访问性检查
    pub accessibility: Vec<Check>,
    /// 可索引性检查
    pub indexability: Vec<Check>,
    /// SEO 检查
    pub seo_checks: Vec<Check>,
    /// 最佳实践检查
    pub best_practices: Vec<Check>,
    /// 性能指标
    pub performance_metrics: PerformanceMetrics,
    /// 性能数据来源
    pub performance_source: MetricsSource,
    /// 性能优化机会
    pub opportunities: Vec<String>,
    /// 性能诊断
    pub diagnostics: Vec<String>,
    /// 问题列表
    pub issues: Vec<Issue>,
    /// 快速改进项（前四个问题）
    pub quick_wins: Vec<QuickWin>,
}

/// 附加在爬取根页面上的精简综合审计
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComprehensiveSummary {
    pub scores: Scores,
    pub stats: PageStats,
    pub h_tags: HeadingTags,
    pub social_meta: SocialMeta,
    pub accessibility: Vec<Check>,
    pub indexability: Vec<Check>,
    pub seo_checks: Vec<Check>,
    pub performance_metrics: PerformanceMetrics,
}

impl From<&ComprehensiveAudit> for ComprehensiveSummary {
    fn from(audit: &ComprehensiveAudit) -> Self {
        Self {
            scores: audit.scores.clone(),
            stats: audit.stats.clone(),
            h_tags: audit.h_tags.clone(),
            social_meta: audit.social_meta.clone(),
            accessibility: audit.accessibility.clone(),
            indexability: audit.indexability.clone(),
            seo_checks: audit.seo_checks.clone(),
            performance_metrics: audit.performance_metrics.clone(),
        }
    }
}

/// 分项得分（0-100）
///
/// `overall` 为五个分项的算术平均值，四舍五入取整
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scores {
    pub performance: u8,
    pub accessibility: u8,
    pub indexability: u8,
    pub seo: u8,
    pub best_practices: u8,
    pub overall: u8,
}

impl Scores {
    pub fn new(
        performance: u8,
        accessibility: u8,
        indexability: u8,
        seo: u8,
        best_practices: u8,
    ) -> Self {
        let sum = performance as u32
            + accessibility as u32
            + indexability as u32
            + seo as u32
            + best_practices as u32;
        let overall = (sum as f64 / 5.0).round() as u8;
        Self {
            performance,
            accessibility,
            indexability,
            seo,
            best_practices,
            overall,
        }
    }
}

/// 页面头部元数据
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
    pub lang: Option<String>,
    pub robots: Option<String>,
    pub charset: Option<String>,
    pub viewport: Option<String>,
    pub has_favicon: bool,
}

impl PageMeta {
    /// meta robots 是否禁止索引
    pub fn is_noindex(&self) -> bool {
        self.robots
            .as_deref()
            .is_some_and(|r| r.to_ascii_lowercase().contains("noindex"))
    }
}

/// 原始统计数据
///
/// 资源大小为估算值：图片按每张 50 KiB、脚本按每个约 10 KiB 计算
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageStats {
    pub total_links: u32,
    pub internal_links: u32,
    pub external_links: u32,
    pub images: u32,
    pub images_without_alt: u32,
    pub image_bytes: u64,
    pub scripts: u32,
    pub script_bytes: u64,
    pub stylesheets: u32,
    pub html_bytes: u64,
    pub text_bytes: u64,
    pub word_count: u32,
    pub reading_time_minutes: u32,
    pub text_rate: f64,
}

/// 标题文本
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeadingTags {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
}

/// Open Graph 与 Twitter 元数据
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialMeta {
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub og_url: Option<String>,
    pub og_type: Option<String>,
    pub twitter_card: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub twitter_image: Option<String>,
}

impl SocialMeta {
    pub fn has_open_graph(&self) -> bool {
        self.og_title.is_some() || self.og_description.is_some() || self.og_image.is_some()
    }

    pub fn has_twitter(&self) -> bool {
        self.twitter_card.is_some() || self.twitter_title.is_some()
    }
}

/// JSON-LD 结构化数据概览
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructuredData {
    pub present: bool,
    pub blocks: u32,
    pub types: Vec<String>,
}

/// 单条规则检查结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Check {
    pub fn new(name: &str, passed: bool) -> Self {
        Self {
            name: name.to_string(),
            passed,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// 按通过率计算分类得分，空分类记为满分
pub fn pass_ratio_score(checks: &[Check]) -> u8 {
    if checks.is_empty() {
        return 100;
    }
    let passed = checks.iter().filter(|c| c.passed).count();
    ((passed as f64 / checks.len() as f64) * 100.0).round() as u8
}

/// 问题严重程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// 审计发现的问题
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub title: String,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
}

/// 快速改进项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuickWin {
    pub title: String,
    pub description: String,
}

impl From<&Issue> for QuickWin {
    fn from(issue: &Issue) -> Self {
        Self {
            title: issue.title.clone(),
            description: issue.recommendation.clone(),
        }
    }
}

/// 性能指标
///
/// 时间类指标单位：FCP/LCP/SI/TTI 为秒，TBT/FID/INP 为毫秒
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMetrics {
    pub first_contentful_paint: f64,
    pub largest_contentful_paint: f64,
    pub total_blocking_time: f64,
    pub cumulative_layout_shift: f64,
    pub speed_index: f64,
    pub time_to_interactive: f64,
    pub max_potential_fid: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_to_next_paint: Option<f64>,
}

/// 性能数据来源
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricsSource {
    PageSpeed,
    Fallback,
}
