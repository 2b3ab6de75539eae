// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::job_store::{AuditJobStore, CrawlJobStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// 终态任务过期清理工作器
///
/// 定期从内存任务存储中移除超过保留期的已完成/已失败任务，
/// 处理中的任务不受影响（停滞判定在读取时进行）。
pub struct ExpirationWorker {
    crawl_store: Arc<dyn CrawlJobStore>,
    audit_store: Arc<dyn AuditJobStore>,
    retention: chrono::Duration,
    interval: Duration,
}

impl ExpirationWorker {
    pub fn new(
        crawl_store: Arc<dyn CrawlJobStore>,
        audit_store: Arc<dyn AuditJobStore>,
        retention: chrono::Duration,
        interval: Duration,
    ) -> Self {
        Self {
            crawl_store,
            audit_store,
            retention,
            interval,
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!(
            retention_secs = self.retention.num_seconds(),
            "Job expiration worker started"
        );

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;
            let removed = self.sweep_once(Utc::now());
            if removed > 0 {
                info!("Evicted {} expired jobs", removed);
            } else {
                debug!("No expired jobs to evict");
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// 执行一次清理，返回移除的任务数
    pub fn sweep_once(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.retention;
        self.crawl_store.purge_terminal_before(cutoff) + self.audit_store.purge_terminal_before(cutoff)
    }
}

#[cfg(test)]
#[path = "expiration_worker_test.rs"]
mod tests;
