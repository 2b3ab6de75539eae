// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::crawl_job::{CrawlJob, CrawlParams};
use crate::domain::repositories::job_store::{CrawlJobStore, CrawlMutation};

/// 内存爬取任务存储
#[derive(Default)]
pub struct MemoryCrawlStore {
    jobs: DashMap<Uuid, CrawlJob>,
}

impl MemoryCrawlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// 把任务的最后更新时间前移
    #[cfg(test)]
    pub(crate) fn backdate(&self, id: Uuid, by: chrono::Duration) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.updated_at -= by;
        }
    }
}

impl CrawlJobStore for MemoryCrawlStore {
    fn init(&self, id: Uuid, params: CrawlParams) {
        if let Entry::Vacant(slot) = self.jobs.entry(id) {
            slot.insert(CrawlJob::new(id, params, Utc::now()));
        }
    }

    fn mutate(&self, id: Uuid, mutation: CrawlMutation) -> bool {
        match self.jobs.get_mut(&id) {
            Some(mut job) if !job.is_terminal() => {
                mutation(job.value_mut());
                job.touch(Utc::now());
                true
            }
            _ => false,
        }
    }

    fn complete(&self, id: Uuid) -> bool {
        self.jobs
            .get_mut(&id)
            .is_some_and(|mut job| job.complete(Utc::now()))
    }

    fn fail(&self, id: Uuid, error: &str) -> bool {
        self.jobs
            .get_mut(&id)
            .is_some_and(|mut job| job.fail(error, Utc::now()))
    }

    fn cancel(&self, id: Uuid) -> bool {
        match self.jobs.get_mut(&id) {
            Some(mut job) => {
                job.cancel(Utc::now());
                true
            }
            None => false,
        }
    }

    fn get(&self, id: Uuid) -> Option<CrawlJob> {
        self.jobs.get(&id).map(|job| job.clone())
    }

    fn is_cancelled(&self, id: Uuid) -> bool {
        self.jobs
            .get(&id)
            .is_none_or(|job| job.cancelled || job.is_terminal())
    }

    fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.jobs.len();
        self.jobs
            .retain(|_, job| !(job.is_terminal() && job.updated_at < cutoff));
        let purged = before.saturating_sub(self.jobs.len());
        if purged > 0 {
            debug!(purged, "Purged terminal crawl jobs");
        }
        purged
    }
}
