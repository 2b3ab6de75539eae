// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::audit_job::{AuditJob, AuditStage};
use crate::domain::models::unified_report::UnifiedAuditResult;
use crate::domain::repositories::job_store::AuditJobStore;

/// 内存单页审计任务存储
#[derive(Default)]
pub struct MemoryAuditStore {
    jobs: DashMap<Uuid, AuditJob>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 把任务的最后更新时间前移
    #[cfg(test)]
    pub(crate) fn backdate(&self, id: Uuid, by: chrono::Duration) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.updated_at -= by;
        }
    }
}

impl AuditJobStore for MemoryAuditStore {
    fn init(&self, id: Uuid, url: String, owner_id: Option<String>) {
        if let Entry::Vacant(slot) = self.jobs.entry(id) {
            slot.insert(AuditJob::new(id, url, owner_id, Utc::now()));
        }
    }

    fn set_progress(&self, id: Uuid, stage: AuditStage, progress: u8, message: &str) -> bool {
        self.jobs
            .get_mut(&id)
            .is_some_and(|mut job| job.set_progress(stage, progress, message, Utc::now()))
    }

    fn set_completed(&self, id: Uuid, result: UnifiedAuditResult) -> bool {
        self.jobs
            .get_mut(&id)
            .is_some_and(|mut job| job.set_completed(result, Utc::now()))
    }

    fn set_failed(&self, id: Uuid, error: &str) -> bool {
        self.jobs
            .get_mut(&id)
            .is_some_and(|mut job| job.set_failed(error, Utc::now()))
    }

    fn get(&self, id: Uuid) -> Option<AuditJob> {
        self.jobs.get(&id).map(|job| job.clone())
    }

    fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.jobs.len();
        self.jobs
            .retain(|_, job| !(job.is_terminal() && job.updated_at < cutoff));
        let purged = before.saturating_sub(self.jobs.len());
        if purged > 0 {
            debug!(purged, "Purged terminal audit jobs");
        }
        purged
    }
}
