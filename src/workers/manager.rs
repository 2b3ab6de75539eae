// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::workers::audit_worker::{AuditRequest, AuditWorker};
use crate::workers::crawl_worker::CrawlWorker;
use crate::workers::expiration_worker::ExpirationWorker;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// 工作管理器
///
/// 为每个爬取/审计任务派生独立的后台任务，请求处理方在任务结束前即可返回。
/// 任务只通过任务存储汇报结果。
pub struct WorkerManager {
    crawl_worker: Arc<CrawlWorker>,
    audit_worker: Arc<AuditWorker>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerManager {
    pub fn new(crawl_worker: Arc<CrawlWorker>, audit_worker: Arc<AuditWorker>) -> Self {
        Self {
            crawl_worker,
            audit_worker,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// 派生爬取任务
    pub fn launch_crawl(&self, job_id: Uuid) -> JoinHandle<()> {
        debug!(%job_id, "Launching crawl task");
        let worker = self.crawl_worker.clone();
        tokio::spawn(async move {
            worker.run(job_id).await;
        })
    }

    /// 派生单页审计任务
    pub fn launch_audit(&self, job_id: Uuid, request: AuditRequest) -> JoinHandle<()> {
        debug!(%job_id, "Launching audit task");
        let worker = self.audit_worker.clone();
        tokio::spawn(async move {
            worker.run(job_id, request).await;
        })
    }

    /// 启动过期清理工作器
    pub fn start_expiration_worker(&self, worker: ExpirationWorker) {
        self.handles.lock().push(worker.start());
    }

    /// 由给定任务存储组装、不接入性能服务与持久化的管理器
    #[cfg(test)]
    pub(crate) fn for_stores(
        crawl_store: Arc<dyn crate::domain::repositories::job_store::CrawlJobStore>,
        audit_store: Arc<dyn crate::domain::repositories::job_store::AuditJobStore>,
        quota: Arc<crate::domain::services::quota_service::QuotaService>,
    ) -> Self {
        use crate::config::settings::FetchSettings;
        use crate::domain::services::comprehensive_auditor::ComprehensiveAuditor;
        use crate::engines::reqwest_engine::ReqwestEngine;
        use std::time::Duration;

        let engine = Arc::new(
            ReqwestEngine::new(&FetchSettings {
                timeout_secs: 5,
                user_agent: "seoscope-test/1.0".to_string(),
                block_private_networks: true,
            })
            .expect("engine"),
        );
        let auditor = Arc::new(ComprehensiveAuditor::without_pagespeed());
        Self::new(
            Arc::new(CrawlWorker::new(
                crawl_store,
                engine.clone(),
                auditor.clone(),
                quota.clone(),
                None,
                Duration::from_secs(5),
                Duration::from_secs(60),
            )),
            Arc::new(AuditWorker::new(
                audit_store,
                engine,
                auditor,
                quota,
                None,
                Duration::from_secs(5),
                Duration::from_secs(45),
            )),
        )
    }

    /// 停止所有后台工作器
    ///
    /// 正在运行的爬取/审计任务不受影响，随进程退出而结束
    pub fn shutdown(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        info!("Shutting down {} background workers", handles.len());
        for handle in handles {
            handle.abort();
        }
    }
}
