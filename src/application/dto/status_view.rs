// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::models::audit_job::{AuditJob, AuditStage};
use crate::domain::models::crawl_job::{CrawlJob, CrawlSummary, PageResult};
use crate::domain::models::job_status::JobStatus;
use crate::domain::models::unified_report::UnifiedAuditResult;

/// 爬取状态查询结果，按 `status` 字段区分
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrawlStatusView {
    Processing(CrawlSnapshot),
    Completed(CrawlSnapshot),
    Failed(CrawlSnapshot),
    NotFound,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSnapshot {
    pub id: Uuid,
    pub root_url: String,
    pub progress: u8,
    pub pages_processed: u32,
    pub queued: u32,
    pub max_pages: u32,
    pub max_depth: u32,
    pub stage: String,
    pub message: String,
    pub pages: Vec<PageResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CrawlSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CrawlJob> for CrawlStatusView {
    fn from(job: CrawlJob) -> Self {
        let status = job.status;
        let snapshot = CrawlSnapshot {
            id: job.id,
            root_url: job.root_url,
            progress: job.progress,
            pages_processed: job.processed,
            queued: job.queued,
            max_pages: job.max_pages,
            max_depth: job.max_depth,
            stage: job.stage,
            message: job.message,
            pages: job.pages,
            summary: job.summary,
            error: job.error,
            started_at: job.started_at,
            updated_at: job.updated_at,
        };
        match status {
            JobStatus::Processing => CrawlStatusView::Processing(snapshot),
            JobStatus::Completed => CrawlStatusView::Completed(snapshot),
            JobStatus::Failed => CrawlStatusView::Failed(snapshot),
        }
    }
}

/// 单页审计状态查询结果
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditStatusView {
    Processing {
        stage: AuditStage,
        progress: u8,
        message: String,
        #[serde(rename = "elapsedMs")]
        elapsed_ms: i64,
    },
    Completed {
        data: Box<UnifiedAuditResult>,
    },
    Failed {
        error: String,
    },
    NotFound,
}

impl AuditStatusView {
    pub fn from_job(job: AuditJob, now: DateTime<Utc>) -> Self {
        match job.status {
            JobStatus::Processing => AuditStatusView::Processing {
                stage: job.stage,
                progress: job.progress,
                elapsed_ms: job.elapsed_ms(now),
                message: job.message,
            },
            JobStatus::Completed => match job.result {
                Some(data) => AuditStatusView::Completed { data },
                None => AuditStatusView::Failed {
                    error: "Audit result missing".to_string(),
                },
            },
            JobStatus::Failed => AuditStatusView::Failed {
                error: job.error.unwrap_or_else(|| "Audit failed".to_string()),
            },
        }
    }
}
