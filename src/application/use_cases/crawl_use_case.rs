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

use crate::{
    application::dto::{
        crawl_request::{CancelCrawlResponse, CrawlBounds, StartCrawlRequest, StartCrawlResponse},
        status_view::CrawlStatusView,
    },
    config::settings::CrawlSettings,
    domain::{
        models::{crawl_job::CrawlParams, job_status::JobStatus, usage::UsageKind},
        repositories::{job_archive_repository::JobArchive, job_store::CrawlJobStore},
        services::quota_service::{QuotaResult, QuotaService},
    },
    utils::url_utils::normalize_start_url,
    workers::WorkerManager,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Error, Debug)]
pub enum CrawlUseCaseError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("{0}")]
    QuotaExceeded(String),
    #[error("Crawl not found")]
    NotFound,
}

/// 爬取入口类型，决定参数范围以及是否要求登录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlVariant {
    Standard,
    Dashboard,
}

impl CrawlVariant {
    fn bounds(&self, settings: &CrawlSettings) -> CrawlBounds {
        match self {
            CrawlVariant::Standard => CrawlBounds::STANDARD
                .with_defaults(settings.default_max_pages, settings.default_max_depth),
            CrawlVariant::Dashboard => CrawlBounds::DASHBOARD,
        }
    }
}

/// 属于某个用户的任务对其他调用方不可见
pub(crate) fn visible_to(owner: Option<&str>, caller: Option<&str>) -> bool {
    owner.is_none_or(|owner| caller == Some(owner))
}

pub struct CrawlUseCase {
    store: Arc<dyn CrawlJobStore>,
    archive: Option<Arc<dyn JobArchive>>,
    quota: Arc<QuotaService>,
    workers: Arc<WorkerManager>,
    settings: CrawlSettings,
}

impl CrawlUseCase {
    pub fn new(
        store: Arc<dyn CrawlJobStore>,
        archive: Option<Arc<dyn JobArchive>>,
        quota: Arc<QuotaService>,
        workers: Arc<WorkerManager>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            store,
            archive,
            quota,
            workers,
            settings,
        }
    }

    /// 校验请求、检查配额并派生爬取任务，立即返回任务ID
    pub async fn start_crawl(
        &self,
        user_id: Option<&str>,
        variant: CrawlVariant,
        dto: StartCrawlRequest,
    ) -> Result<StartCrawlResponse, CrawlUseCaseError> {
        if variant == CrawlVariant::Dashboard && user_id.is_none() {
            return Err(CrawlUseCaseError::AuthenticationRequired);
        }
        dto.validate()
            .map_err(|e| CrawlUseCaseError::ValidationError(e.to_string()))?;
        let root = normalize_start_url(&dto.url).map_err(CrawlUseCaseError::ValidationError)?;

        if let Some(user) = user_id {
            if let QuotaResult::Denied { reason } =
                self.quota.enforce_quota(user, UsageKind::SiteCrawl).await
            {
                return Err(CrawlUseCaseError::QuotaExceeded(reason));
            }
        }

        let (max_pages, max_depth) = variant
            .bounds(&self.settings)
            .clamp(dto.max_pages, dto.max_depth);

        let id = Uuid::new_v4();
        self.store.init(
            id,
            CrawlParams {
                root_url: root.to_string(),
                max_pages,
                max_depth,
                owner_id: user_id.map(str::to_string),
            },
        );
        self.workers.launch_crawl(id);
        info!(%id, root = %root, max_pages, max_depth, ?variant, "Crawl job created");

        Ok(StartCrawlResponse {
            id,
            status: JobStatus::Processing,
        })
    }

    /// 查询爬取状态
    ///
    /// 内存中没有记录时回退到归档快照；处理中但超过停滞窗口未更新的任务被判定为失败
    pub async fn get_status(&self, id: Uuid, user_id: Option<&str>) -> CrawlStatusView {
        if let Some(job) = self.store.get(id) {
            if !visible_to(job.owner_id.as_deref(), user_id) {
                return CrawlStatusView::NotFound;
            }
            let window = self.settings.stall_timeout();
            if job.is_stalled(Utc::now(), window) {
                warn!(%id, "Crawl stalled, marking as failed");
                let message = format!("Crawl stalled: no progress for {} seconds", window.num_seconds());
                self.store.fail(id, &message);
                return self
                    .store
                    .get(id)
                    .map(CrawlStatusView::from)
                    .unwrap_or(CrawlStatusView::NotFound);
            }
            return job.into();
        }

        let Some(archive) = &self.archive else {
            return CrawlStatusView::NotFound;
        };
        match archive.find_crawl(id).await {
            Ok(Some(job)) if visible_to(job.owner_id.as_deref(), user_id) => job.into(),
            Ok(_) => CrawlStatusView::NotFound,
            Err(e) => {
                warn!(%id, "Failed to read archived crawl: {}", e);
                CrawlStatusView::NotFound
            }
        }
    }

    /// 取消爬取，可重复调用
    pub fn cancel(
        &self,
        id: Uuid,
        user_id: Option<&str>,
    ) -> Result<CancelCrawlResponse, CrawlUseCaseError> {
        let job = self.store.get(id).ok_or(CrawlUseCaseError::NotFound)?;
        if !visible_to(job.owner_id.as_deref(), user_id) {
            return Err(CrawlUseCaseError::NotFound);
        }
        self.store.cancel(id);
        info!(%id, "Crawl cancel requested");

        let status = self.store.get(id).map_or(job.status, |j| j.status);
        Ok(CancelCrawlResponse {
            id,
            cancelled: true,
            status,
        })
    }
}
