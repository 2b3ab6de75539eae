// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{anyhow, bail, Context, Result};
use futures::FutureExt;
use metrics::counter;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::models::audit_job::AuditStage;
use crate::domain::models::job_status::JobStatus;
use crate::domain::models::unified_report::UnifiedAuditResult;
use crate::domain::models::usage::UsageKind;
use crate::domain::repositories::job_archive_repository::JobArchive;
use crate::domain::repositories::job_store::AuditJobStore;
use crate::domain::services::comprehensive_auditor::{ComprehensiveAuditor, ProgressCallback};
use crate::domain::services::quota_service::QuotaService;
use crate::engines::traits::{FetchEngine, FetchRequest};

pub const AUDIT_TIMEOUT_MESSAGE: &str = "Audit timed out";
pub const AUDIT_PANIC_MESSAGE: &str = "Audit task panicked";
/// 为生成与保存结果预留的时间
const SAVE_MARGIN: Duration = Duration::from_secs(2);

/// 单页审计请求参数
#[derive(Debug, Clone)]
pub struct AuditRequest {
    pub url: String,
    pub keyword: Option<String>,
    pub email: Option<String>,
    pub owner_id: Option<String>,
}

/// 单页审计工作器
///
/// 抓取 → 综合审计 → 生成统一结果，整个过程受一个总超时约束
pub struct AuditWorker {
    store: Arc<dyn AuditJobStore>,
    engine: Arc<dyn FetchEngine>,
    auditor: Arc<ComprehensiveAuditor>,
    quota: Arc<QuotaService>,
    archive: Option<Arc<dyn JobArchive>>,
    fetch_timeout: Duration,
    timeout: Duration,
}

impl AuditWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn AuditJobStore>,
        engine: Arc<dyn FetchEngine>,
        auditor: Arc<ComprehensiveAuditor>,
        quota: Arc<QuotaService>,
        archive: Option<Arc<dyn JobArchive>>,
        fetch_timeout: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            engine,
            auditor,
            quota,
            archive,
            fetch_timeout,
            timeout,
        }
    }

    /// 执行审计并把结果写入任务存储
    ///
    /// 超时、错误与 panic 都会转换为失败状态。只有成功完成的审计计入配额。
    #[instrument(skip(self, request), fields(job_id = %job_id, url = %request.url))]
    pub async fn run(&self, job_id: Uuid, request: AuditRequest) {
        counter!("audit_jobs_started_total").increment(1);
        let deadline = Instant::now() + self.timeout;

        let outcome = tokio::time::timeout(
            self.timeout,
            AssertUnwindSafe(self.audit(job_id, &request, deadline)).catch_unwind(),
        )
        .await;

        match outcome {
            Ok(Ok(Ok(()))) => info!("Audit completed"),
            Ok(Ok(Err(e))) => {
                warn!("Audit failed: {:#}", e);
                self.store.set_failed(job_id, &e.to_string());
            }
            Ok(Err(_)) => {
                error!("{}", AUDIT_PANIC_MESSAGE);
                self.store.set_failed(job_id, AUDIT_PANIC_MESSAGE);
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Audit exceeded its time budget");
                self.store.set_failed(job_id, AUDIT_TIMEOUT_MESSAGE);
            }
        }

        let Some(job) = self.store.get(job_id) else {
            return;
        };
        match job.status {
            JobStatus::Completed => {
                counter!("audit_jobs_completed_total").increment(1);
                if let Some(owner) = request.owner_id.as_deref() {
                    self.quota.increment_usage(owner, UsageKind::Audit).await;
                }
            }
            JobStatus::Failed => counter!("audit_jobs_failed_total").increment(1),
            JobStatus::Processing => {}
        }
        if let Some(archive) = &self.archive {
            if let Err(e) = archive.save_audit(&job).await {
                warn!("Failed to archive audit job: {}", e);
            }
        }
    }

    async fn audit(&self, job_id: Uuid, request: &AuditRequest, deadline: Instant) -> Result<()> {
        let url = Url::parse(&request.url)
            .with_context(|| format!("Invalid URL {}", request.url))?;

        self.store
            .set_progress(job_id, AuditStage::Fetching, 10, "Fetching page");
        let response = self
            .engine
            .fetch(&FetchRequest::new(url.as_str(), self.fetch_timeout))
            .await
            .map_err(|e| anyhow!("Failed to fetch page: {}", e))?;
        if !response.is_success() {
            bail!("Failed to fetch page: HTTP {}", response.status_code);
        }

        self.store
            .set_progress(job_id, AuditStage::Analyzing, 30, "Analyzing page");
        let store = self.store.clone();
        let progress: ProgressCallback = Arc::new(move |percent, message| {
            store.set_progress(job_id, AuditStage::Analyzing, percent, message);
        });
        // Performance scoring must give up before the audit itself times out
        let pagespeed_budget = deadline
            .saturating_duration_since(Instant::now())
            .saturating_sub(SAVE_MARGIN);
        let comprehensive = self
            .auditor
            .audit_within(
                &response.content,
                url.as_str(),
                Some(&progress),
                Some(pagespeed_budget),
            )
            .await;

        self.store
            .set_progress(job_id, AuditStage::Saving, 90, "Saving results");
        let result = UnifiedAuditResult::build(
            url.as_str(),
            request.keyword.clone(),
            request.email.clone(),
            comprehensive,
        );
        self.store.set_completed(job_id, result);
        Ok(())
    }
}

#[cfg(test)]
#[path = "audit_worker_test.rs"]
mod tests;
