// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::{
    application::{
        dto::{
            audit_request::{StartAuditRequest, StartAuditResponse},
            status_view::AuditStatusView,
        },
        use_cases::crawl_use_case::visible_to,
    },
    config::settings::AuditSettings,
    domain::{
        models::{job_status::JobStatus, usage::UsageKind},
        repositories::{job_archive_repository::JobArchive, job_store::AuditJobStore},
        services::quota_service::{QuotaResult, QuotaService},
    },
    utils::url_utils::normalize_start_url,
    workers::{audit_worker::AuditRequest, WorkerManager},
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Error, Debug)]
pub enum AuditUseCaseError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("{0}")]
    QuotaExceeded(String),
    #[error("Audit not found")]
    NotFound,
}

pub struct AuditUseCase {
    store: Arc<dyn AuditJobStore>,
    archive: Option<Arc<dyn JobArchive>>,
    quota: Arc<QuotaService>,
    workers: Arc<WorkerManager>,
    settings: AuditSettings,
}

impl AuditUseCase {
    pub fn new(
        store: Arc<dyn AuditJobStore>,
        archive: Option<Arc<dyn JobArchive>>,
        quota: Arc<QuotaService>,
        workers: Arc<WorkerManager>,
        settings: AuditSettings,
    ) -> Self {
        Self {
            store,
            archive,
            quota,
            workers,
            settings,
        }
    }

    pub async fn start_audit(
        &self,
        user_id: Option<&str>,
        dto: StartAuditRequest,
    ) -> Result<StartAuditResponse, AuditUseCaseError> {
        dto.validate()
            .map_err(|e| AuditUseCaseError::ValidationError(e.to_string()))?;
        let url = normalize_start_url(&dto.url).map_err(AuditUseCaseError::ValidationError)?;

        if let Some(user) = user_id {
            if let QuotaResult::Denied { reason } =
                self.quota.enforce_quota(user, UsageKind::Audit).await
            {
                return Err(AuditUseCaseError::QuotaExceeded(reason));
            }
        }

        let id = Uuid::new_v4();
        let owner_id = user_id.map(str::to_string);
        self.store.init(id, url.to_string(), owner_id.clone());
        self.workers.launch_audit(
            id,
            AuditRequest {
                url: url.to_string(),
                keyword: dto.keyword.filter(|k| !k.trim().is_empty()),
                email: dto.email,
                owner_id,
            },
        );
        info!(%id, url = %url, "Audit job created");

        Ok(StartAuditResponse {
            audit_id: id,
            status: JobStatus::Processing,
        })
    }

    /// 查询审计状态，规则与爬取状态查询一致
    pub async fn get_status(&self, id: Uuid, user_id: Option<&str>) -> AuditStatusView {
        let now = Utc::now();
        if let Some(job) = self.store.get(id) {
            if !visible_to(job.owner_id.as_deref(), user_id) {
                return AuditStatusView::NotFound;
            }
            let window = self.settings.stall_timeout();
            if job.is_stalled(now, window) {
                warn!(%id, "Audit stalled, marking as failed");
                let message = format!("Audit stalled: no progress for {} seconds", window.num_seconds());
                self.store.set_failed(id, &message);
                return self
                    .store
                    .get(id)
                    .map(|job| AuditStatusView::from_job(job, now))
                    .unwrap_or(AuditStatusView::NotFound);
            }
            return AuditStatusView::from_job(job, now);
        }

        let Some(archive) = &self.archive else {
            return AuditStatusView::NotFound;
        };
        match archive.find_audit(id).await {
            Ok(Some(job)) if visible_to(job.owner_id.as_deref(), user_id) => {
                AuditStatusView::from_job(job, now)
            }
            Ok(_) => AuditStatusView::NotFound,
            Err(e) => {
                warn!(%id, "Failed to read archived audit: {}", e);
                AuditStatusView::NotFound
            }
        }
    }
}
