// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::use_cases::{
    audit_use_case::AuditUseCase, crawl_use_case::CrawlUseCase, usage_use_case::UsageUseCase,
};
use crate::config::settings::Settings;
use crate::domain::repositories::job_archive_repository::JobArchive;
use crate::domain::repositories::job_store::{AuditJobStore, CrawlJobStore};
use crate::domain::repositories::usage_repository::UsageRepository;
use crate::domain::services::comprehensive_auditor::ComprehensiveAuditor;
use crate::domain::services::pagespeed::{PageSpeedProvider, Strategy};
use crate::domain::services::quota_service::QuotaService;
use crate::engines::reqwest_engine::ReqwestEngine;
use crate::engines::traits::FetchEngine;
use crate::infrastructure::database::connection;
use crate::infrastructure::pagespeed::psi_client::PsiClient;
use crate::infrastructure::repositories::job_archive_impl::JobArchiveImpl;
use crate::infrastructure::repositories::memory_usage_repo::MemoryUsageRepository;
use crate::infrastructure::repositories::usage_repo_impl::UsageRepositoryImpl;
use crate::infrastructure::stores::memory_audit_store::MemoryAuditStore;
use crate::infrastructure::stores::memory_crawl_store::MemoryCrawlStore;
use crate::presentation::routes::{self, AppServices};
use crate::workers::audit_worker::AuditWorker;
use crate::workers::crawl_worker::CrawlWorker;
use crate::workers::expiration_worker::ExpirationWorker;
use crate::workers::WorkerManager;

/// 组装完成的应用
pub struct Application {
    pub router: Router,
    pub workers: Arc<WorkerManager>,
    pub crawl_store: Arc<dyn CrawlJobStore>,
    pub audit_store: Arc<dyn AuditJobStore>,
    pub quota: Arc<QuotaService>,
}

/// 根据配置组装全部组件并启动后台清理工作器
///
/// 配置了数据库时使用 SeaORM 持久化用量计数与终态任务归档，
/// 否则完全在内存中运行。
pub async fn build(settings: &Settings) -> anyhow::Result<Application> {
    let (usage_repo, archive): (Arc<dyn UsageRepository>, Option<Arc<dyn JobArchive>>) =
        match settings.database.url {
            Some(_) => {
                let db = Arc::new(
                    connection::connect_and_migrate(&settings.database)
                        .await
                        .context("Failed to initialize database")?,
                );
                info!("Database connection established");
                (
                    Arc::new(UsageRepositoryImpl::new(db.clone())),
                    Some(Arc::new(JobArchiveImpl::new(db))),
                )
            }
            None => {
                warn!("No database configured, usage counters and job history are in-memory only");
                (Arc::new(MemoryUsageRepository::new()), None)
            }
        };

    let quota = Arc::new(QuotaService::new(usage_repo, settings.quota.clone()));

    let strategy = settings
        .pagespeed
        .strategy
        .parse::<Strategy>()
        .unwrap_or_else(|_| {
            warn!(strategy = %settings.pagespeed.strategy, "Unknown PageSpeed strategy, using mobile");
            Strategy::Mobile
        });
    let pagespeed: Option<Arc<dyn PageSpeedProvider>> =
        match PsiClient::from_settings(&settings.pagespeed)? {
            Some(client) => {
                info!(%strategy, "PageSpeed Insights enabled");
                Some(Arc::new(client))
            }
            None => {
                info!("PageSpeed API key not configured, using fallback performance data");
                None
            }
        };
    let auditor = Arc::new(
        ComprehensiveAuditor::new(pagespeed, strategy)
            .with_pagespeed_budget(settings.audit.pagespeed_budget()),
    );

    let engine: Arc<dyn FetchEngine> = Arc::new(ReqwestEngine::new(&settings.fetch)?);

    let crawl_store: Arc<dyn CrawlJobStore> = Arc::new(MemoryCrawlStore::new());
    let audit_store: Arc<dyn AuditJobStore> = Arc::new(MemoryAuditStore::new());

    let crawl_worker = Arc::new(CrawlWorker::new(
        crawl_store.clone(),
        engine.clone(),
        auditor.clone(),
        quota.clone(),
        archive.clone(),
        settings.fetch.timeout(),
        settings.crawl.max_duration(),
    ));
    let audit_worker = Arc::new(AuditWorker::new(
        audit_store.clone(),
        engine,
        auditor,
        quota.clone(),
        archive.clone(),
        settings.audit.fetch_timeout(),
        settings.audit.timeout(),
    ));
    let workers = Arc::new(WorkerManager::new(crawl_worker, audit_worker));

    workers.start_expiration_worker(ExpirationWorker::new(
        crawl_store.clone(),
        audit_store.clone(),
        chrono::Duration::seconds(settings.crawl.retention_secs as i64),
        std::time::Duration::from_secs(settings.crawl.sweep_interval_secs.max(1)),
    ));

    let services = AppServices {
        crawl: Arc::new(CrawlUseCase::new(
            crawl_store.clone(),
            archive.clone(),
            quota.clone(),
            workers.clone(),
            settings.crawl.clone(),
        )),
        audit: Arc::new(AuditUseCase::new(
            audit_store.clone(),
            archive,
            quota.clone(),
            workers.clone(),
            settings.audit.clone(),
        )),
        usage: Arc::new(UsageUseCase::new(quota.clone())),
    };

    Ok(Application {
        router: routes::routes(services),
        workers,
        crawl_store,
        audit_store,
        quota,
    })
}
