// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::job_status::JobStatus;
use super::unified_report::UnifiedAuditResult;

/// 单页审计阶段
///
/// queued → fetching → analyzing → saving → completed，失败时为 failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    #[default]
    Queued,
    Fetching,
    Analyzing,
    Saving,
    Completed,
    Failed,
}

impl fmt::Display for AuditStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            AuditStage::Queued => "queued",
            AuditStage::Fetching => "fetching",
            AuditStage::Analyzing => "analyzing",
            AuditStage::Saving => "saving",
            AuditStage::Completed => "completed",
            AuditStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// 单页审计任务
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditJob {
    pub id: Uuid,
    pub owner_id: Option<String>,
    pub url: String,
    pub status: JobStatus,
    pub stage: AuditStage,
    pub progress: u8,
    pub message: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<Box<UnifiedAuditResult>>,
    pub error: Option<String>,
}

impl AuditJob {
    pub fn new(id: Uuid, url: String, owner_id: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            url,
            status: JobStatus::Processing,
            stage: AuditStage::Queued,
            progress: 0,
            message: "Audit queued".to_string(),
            started_at: now,
            updated_at: now,
            result: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// 更新阶段与进度，终态任务忽略后续更新
    pub fn set_progress(
        &mut self,
        stage: AuditStage,
        progress: u8,
        message: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.stage = stage;
        self.progress = progress.min(100);
        self.message = message.to_string();
        self.updated_at = now;
        true
    }

    pub fn set_completed(&mut self, result: UnifiedAuditResult, now: DateTime<Utc>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.stage = AuditStage::Completed;
        self.progress = 100;
        self.message = "Audit completed".to_string();
        self.result = Some(Box::new(result));
        self.updated_at = now;
        true
    }

    pub fn set_failed(&mut self, error: &str, now: DateTime<Utc>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.stage = AuditStage::Failed;
        self.message = format!("Audit failed: {}", error);
        self.error = Some(error.to_string());
        self.updated_at = now;
        true
    }

    pub fn is_stalled(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.status == JobStatus::Processing && now - self.updated_at > window
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_milliseconds().max(0)
    }
}
