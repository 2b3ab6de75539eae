// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit_report::ComprehensiveSummary;
use super::job_status::JobStatus;
use super::page_audit::LightAudit;

/// 取消时记录的失败原因
pub const CANCELLED_REASON: &str = "cancelled";

/// 爬取任务初始化参数
#[derive(Debug, Clone)]
pub struct CrawlParams {
    pub root_url: String,
    pub max_pages: u32,
    pub max_depth: u32,
    pub owner_id: Option<String>,
}

/// 站点爬取任务
///
/// 记录一次爬取的进度、页面结果与最终汇总。任务只由对应的爬取工作器修改，
/// 状态一旦进入终态便不再变化。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrawlJob {
    pub id: Uuid,
    pub owner_id: Option<String>,
    pub root_url: String,
    pub status: JobStatus,
    pub cancelled: bool,
    pub max_pages: u32,
    pub max_depth: u32,
    /// 已处理页面数，始终等于 `pages.len()`
    pub processed: u32,
    /// 待抓取队列长度
    pub queued: u32,
    pub progress: u8,
    pub stage: String,
    pub message: String,
    pub error: Option<String>,
    pub pages: Vec<PageResult>,
    pub summary: Option<CrawlSummary>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CrawlJob {
    pub fn new(id: Uuid, params: CrawlParams, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id: params.owner_id,
            root_url: params.root_url,
            status: JobStatus::Processing,
            cancelled: false,
            max_pages: params.max_pages.max(1),
            max_depth: params.max_depth,
            processed: 0,
            queued: 1,
            progress: 0,
            stage: "crawling".to_string(),
            message: "Crawl queued".to_string(),
            error: None,
            pages: Vec::new(),
            summary: None,
            started_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// 进度百分比：`min(100, round(processed / max_pages * 100))`
    pub fn compute_progress(processed: u32, max_pages: u32) -> u8 {
        if max_pages == 0 {
            return 100;
        }
        let ratio = (processed as f64 / max_pages as f64) * 100.0;
        ratio.round().min(100.0) as u8
    }

    /// 追加页面结果并同步已处理计数
    pub fn push_page(&mut self, page: PageResult) {
        self.message = format!("Processed {}", page.url);
        self.pages.push(page);
        self.processed = self.pages.len() as u32;
    }

    /// 每次修改后刷新更新时间与进度
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.progress = if self.status == JobStatus::Completed {
            100
        } else {
            Self::compute_progress(self.processed, self.max_pages)
        };
    }

    /// 标记完成并计算汇总，已处于终态时返回 false
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.stage = "completed".to_string();
        self.message = format!("Crawl finished with {} pages", self.pages.len());
        self.summary = Some(CrawlSummary::from_pages(&self.pages));
        self.queued = 0;
        self.touch(now);
        true
    }

    /// 标记失败，已处于终态时返回 false
    pub fn fail(&mut self, error: &str, now: DateTime<Utc>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.stage = "failed".to_string();
        self.message = format!("Crawl failed: {}", error);
        self.error = Some(error.to_string());
        self.touch(now);
        true
    }

    /// 设置取消标记；仍在处理中时立即以 "cancelled" 失败
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.cancelled = true;
        if !self.is_terminal() {
            self.fail(CANCELLED_REASON, now);
        }
    }

    /// 处理中的任务在停滞窗口内没有任何更新
    pub fn is_stalled(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.status == JobStatus::Processing && now - self.updated_at > window
    }
}

/// 单个页面的抓取与审计结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub url: String,
    /// HTTP 状态码，网络层失败时为空
    pub status: Option<u16>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h1_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_without_alt: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_link_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comprehensive: Option<Box<ComprehensiveSummary>>,
}

impl PageResult {
    /// 抓取失败的页面
    pub fn failed(
        url: impl Into<String>,
        status: Option<u16>,
        error: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            fetched_at,
            error: Some(error.into()),
            title: None,
            meta_description: None,
            word_count: None,
            h1_count: None,
            h2_count: None,
            images: None,
            images_without_alt: None,
            internal_link_count: None,
            comprehensive: None,
        }
    }

    /// 成功抓取并完成轻量审计的页面
    pub fn audited(
        url: impl Into<String>,
        status: u16,
        audit: LightAudit,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            fetched_at,
            error: None,
            title: audit.title,
            meta_description: audit.meta_description,
            word_count: Some(audit.word_count),
            h1_count: Some(audit.h1_count),
            h2_count: Some(audit.h2_count),
            images: Some(audit.images),
            images_without_alt: Some(audit.images_without_alt),
            internal_link_count: Some(audit.internal_link_count),
            comprehensive: None,
        }
    }

    pub fn with_comprehensive(mut self, summary: ComprehensiveSummary) -> Self {
        self.comprehensive = Some(Box::new(summary));
        self
    }

    /// 是否带有审计字段
    pub fn is_audited(&self) -> bool {
        self.error.is_none() && self.word_count.is_some()
    }

    fn has_issues(&self) -> bool {
        self.title.as_deref().is_none_or(|t| t.trim().is_empty())
            || self.meta_description.is_none()
            || self.h1_count == Some(0)
            || self.images_without_alt.unwrap_or(0) > 0
    }
}

/// 爬取完成时计算的汇总
///
/// 平均值只基于成功审计的页面计算
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSummary {
    pub total_pages: u32,
    pub audited_pages: u32,
    pub error_pages: u32,
    pub average_word_count: u32,
    pub average_images_per_page: f64,
    pub pages_missing_meta_description: u32,
    pub pages_with_issues: u32,
    pub missing_titles: u32,
    pub missing_h1: u32,
    pub total_images: u32,
    pub images_without_alt: u32,
}

impl CrawlSummary {
    pub fn from_pages(pages: &[PageResult]) -> Self {
        let audited: Vec<&PageResult> = pages.iter().filter(|p| p.is_audited()).collect();
        let audited_count = audited.len() as u32;

        let total_words: u32 = audited.iter().filter_map(|p| p.word_count).sum();
        let total_images: u32 = audited.iter().filter_map(|p| p.images).sum();

        let (average_word_count, average_images_per_page) = if audited_count == 0 {
            (0, 0.0)
        } else {
            let avg_images = total_images as f64 / audited_count as f64;
            (
                (total_words as f64 / audited_count as f64).round() as u32,
                (avg_images * 10.0).round() / 10.0,
            )
        };

        Self {
            total_pages: pages.len() as u32,
            audited_pages: audited_count,
            error_pages: pages.len() as u32 - audited_count,
            average_word_count,
            average_images_per_page,
            pages_missing_meta_description: audited
                .iter()
                .filter(|p| p.meta_description.is_none())
                .count() as u32,
            pages_with_issues: audited.iter().filter(|p| p.has_issues()).count() as u32,
            missing_titles: audited
                .iter()
                .filter(|p| p.title.as_deref().is_none_or(|t| t.trim().is_empty()))
                .count() as u32,
            missing_h1: audited.iter().filter(|p| p.h1_count == Some(0)).count() as u32,
            total_images,
            images_without_alt: audited.iter().filter_map(|p| p.images_without_alt).sum(),
        }
    }
}
