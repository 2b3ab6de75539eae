// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::FutureExt;
use metrics::{counter, histogram};
use std::collections::{HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::models::audit_report::ComprehensiveSummary;
use crate::domain::models::crawl_job::PageResult;
use crate::domain::models::job_status::JobStatus;
use crate::domain::models::usage::UsageKind;
use crate::domain::repositories::job_archive_repository::JobArchive;
use crate::domain::repositories::job_store::CrawlJobStore;
use crate::domain::services::comprehensive_auditor::ComprehensiveAuditor;
use crate::domain::services::light_auditor::light_page_audit;
use crate::domain::services::link_extractor::LinkExtractor;
use crate::domain::services::quota_service::QuotaService;
use crate::engines::traits::{FetchEngine, FetchRequest};

/// 站点爬取工作器
///
/// 以广度优先顺序逐页抓取同源页面，每页执行轻量审计，
/// 第一个成功抓取的页面额外执行综合审计。结果只通过任务存储对外可见。
pub struct CrawlWorker {
    store: Arc<dyn CrawlJobStore>,
    engine: Arc<dyn FetchEngine>,
    auditor: Arc<ComprehensiveAuditor>,
    quota: Arc<QuotaService>,
    archive: Option<Arc<dyn JobArchive>>,
    fetch_timeout: Duration,
    max_duration: Duration,
}

/// 单页抓取结果：页面记录、可用于提取链接的HTML以及重定向后的地址
struct FetchedPage {
    page: PageResult,
    html: Option<String>,
    final_url: Option<Url>,
}

impl CrawlWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn CrawlJobStore>,
        engine: Arc<dyn FetchEngine>,
        auditor: Arc<ComprehensiveAuditor>,
        quota: Arc<QuotaService>,
        archive: Option<Arc<dyn JobArchive>>,
        fetch_timeout: Duration,
        max_duration: Duration,
    ) -> Self {
        Self {
            store,
            engine,
            auditor,
            quota,
            archive,
            fetch_timeout,
            max_duration,
        }
    }

    /// 执行一次爬取直到结束
    ///
    /// 任何逃逸出爬取循环的错误或 panic 都会把任务标记为失败，
    /// 不会向调用方传播。
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn run(&self, job_id: Uuid) {
        let started = std::time::Instant::now();
        counter!("crawl_jobs_started_total").increment(1);

        match AssertUnwindSafe(self.crawl(job_id)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Crawl failed: {:#}", e);
                self.store.fail(job_id, &e.to_string());
            }
            Err(_) => {
                error!("Crawl task panicked");
                self.store.fail(job_id, "Crawl task panicked");
            }
        }

        histogram!("crawl_duration_seconds").record(started.elapsed().as_secs_f64());
        self.finish(job_id).await;
    }

    async fn crawl(&self, job_id: Uuid) -> Result<()> {
        let job = self
            .store
            .get(job_id)
            .ok_or_else(|| anyhow!("Crawl job {} not found", job_id))?;
        let root = Url::parse(&job.root_url)
            .with_context(|| format!("Invalid root URL {}", job.root_url))?;
        let max_pages = job.max_pages as usize;
        let max_depth = job.max_depth;
        let deadline = Instant::now() + self.max_duration;

        info!(root = %root, max_pages, max_depth, "Crawl started");

        let mut frontier: VecDeque<(Url, u32)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut enqueued: HashSet<String> = HashSet::new();
        enqueued.insert(root.as_str().to_string());
        frontier.push_back((root, 0));

        let mut collected = 0usize;
        let mut root_audited = false;

        while collected < max_pages {
            if self.store.is_cancelled(job_id) {
                info!(collected, "Crawl cancelled");
                break;
            }
            if Instant::now() >= deadline {
                warn!(collected, "Crawl reached its time limit");
                break;
            }
            let Some((url, depth)) = frontier.pop_front() else {
                break;
            };
            if !visited.insert(url.as_str().to_string()) {
                continue;
            }

            let fetched = self.fetch_page(&url, !root_audited).await;
            if fetched.page.is_audited() {
                root_audited = true;
            }
            collected += 1;

            // The root may redirect to its canonical host; later pages keep their requested URL
            let base = match fetched.final_url {
                Some(final_url) if depth == 0 && final_url != url => {
                    debug!(from = %url, to = %final_url, "Root redirected, following its origin");
                    visited.insert(final_url.as_str().to_string());
                    enqueued.insert(final_url.as_str().to_string());
                    final_url
                }
                _ => url.clone(),
            };

            if depth < max_depth {
                if let Some(html) = fetched.html.as_deref() {
                    for link in LinkExtractor::extract_links(html, &base) {
                        if frontier.len() + collected >= max_pages {
                            break;
                        }
                        let key = link.as_str().to_string();
                        if visited.contains(&key) || !enqueued.insert(key) {
                            continue;
                        }
                        frontier.push_back((link, depth + 1));
                    }
                }
            }

            let page = fetched.page;
            let queued = frontier.len() as u32;
            self.store.mutate(
                job_id,
                Box::new(move |job| {
                    job.push_page(page);
                    job.queued = queued;
                }),
            );
        }

        self.store.complete(job_id);
        info!(collected, "Crawl loop finished");

        // Jobs failed from outside (stall detection) are not charged
        let chargeable = self
            .store
            .get(job_id)
            .is_some_and(|j| j.status == JobStatus::Completed || j.cancelled);
        if let Some(owner) = job.owner_id.as_deref().filter(|_| chargeable) {
            self.quota.increment_usage(owner, UsageKind::SiteCrawl).await;
        }
        Ok(())
    }

    /// 抓取并审计单个页面，失败被记录在页面结果中
    async fn fetch_page(&self, url: &Url, audit_root: bool) -> FetchedPage {
        let fetched_at = Utc::now();
        let request = FetchRequest::new(url.as_str(), self.fetch_timeout);

        match self.engine.fetch(&request).await {
            Ok(response) if response.is_success() => {
                counter!("crawl_pages_fetched_total").increment(1);
                debug!(url = %url, status = response.status_code, "Page fetched");

                let audit = light_page_audit(&response.content, url);
                let mut page =
                    PageResult::audited(url.as_str(), response.status_code, audit, fetched_at);
                if audit_root {
                    if let Some(summary) = self.audit_root(&response.content, url).await {
                        page = page.with_comprehensive(summary);
                    }
                }
                FetchedPage {
                    page,
                    final_url: Url::parse(&response.final_url).ok(),
                    html: Some(response.content),
                }
            }
            Ok(response) => {
                counter!("crawl_page_errors_total").increment(1);
                warn!(url = %url, status = response.status_code, "Page returned non-success status");
                FetchedPage {
                    page: PageResult::failed(
                        url.as_str(),
                        Some(response.status_code),
                        format!("HTTP {}", response.status_code),
                        fetched_at,
                    ),
                    html: None,
                    final_url: None,
                }
            }
            Err(e) => {
                counter!("crawl_page_errors_total").increment(1);
                warn!(url = %url, "Page fetch failed: {}", e);
                FetchedPage {
                    page: PageResult::failed(url.as_str(), None, e.to_string(), fetched_at),
                    html: None,
                    final_url: None,
                }
            }
        }
    }

    /// 根页面综合审计，panic 被记录后丢弃
    async fn audit_root(&self, html: &str, url: &Url) -> Option<ComprehensiveSummary> {
        match AssertUnwindSafe(self.auditor.audit(html, url.as_str(), None))
            .catch_unwind()
            .await
        {
            Ok(audit) => Some(ComprehensiveSummary::from(&audit)),
            Err(_) => {
                warn!(url = %url, "Comprehensive audit of root page panicked");
                None
            }
        }
    }

    async fn finish(&self, job_id: Uuid) {
        let Some(job) = self.store.get(job_id) else {
            return;
        };
        match job.status {
            JobStatus::Completed => counter!("crawl_jobs_completed_total").increment(1),
            JobStatus::Failed => counter!("crawl_jobs_failed_total").increment(1),
            _ => {}
        }
        if let Some(archive) = &self.archive {
            if let Err(e) = archive.save_crawl(&job).await {
                warn!("Failed to archive crawl job: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "crawl_worker_test.rs"]
mod tests;
