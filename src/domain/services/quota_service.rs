// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::settings::QuotaSettings;
use crate::domain::models::usage::{month_key, UsageCounter, UsageKind, UsageLevel};
use crate::domain::repositories::usage_repository::{RepositoryError, UsageRepository};

/// 配额检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaResult {
    /// 允许执行
    Allowed,
    /// 本月额度已用完
    Denied { reason: String },
}

impl QuotaResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaResult::Allowed)
    }
}

/// 单个配额桶的用量
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBucket {
    pub used: u32,
    pub limit: u32,
    pub level: UsageLevel,
}

impl UsageBucket {
    fn new(used: u32, limit: u32) -> Self {
        Self {
            used,
            limit,
            level: UsageLevel::from_usage(used, limit),
        }
    }
}

/// 用户当月用量报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub month_key: String,
    pub audits: UsageBucket,
    pub site_crawls: UsageBucket,
}

/// 配额门禁服务
///
/// 按用户、按自然月计数，审计与站点爬取分开计数。
/// 配额只是建议性的：存储不可用时放行，计数失败只记录日志。
pub struct QuotaService {
    repo: Arc<dyn UsageRepository>,
    limits: QuotaSettings,
}

impl QuotaService {
    pub fn new(repo: Arc<dyn UsageRepository>, limits: QuotaSettings) -> Self {
        Self { repo, limits }
    }

    /// 操作类型对应的月度上限
    pub fn limit_for(&self, kind: UsageKind) -> u32 {
        match kind {
            UsageKind::Audit => self.limits.audit_monthly_limit,
            UsageKind::SiteCrawl => self.limits.site_crawl_monthly_limit,
        }
    }

    pub async fn enforce_quota(&self, user_id: &str, kind: UsageKind) -> QuotaResult {
        self.enforce_quota_at(user_id, kind, Utc::now()).await
    }

    /// 检查用户在 `now` 所在月份是否还能执行一次 `kind` 操作
    ///
    /// 计数行不存在时以当月创建；月份变化时先清零再比较
    pub async fn enforce_quota_at(
        &self,
        user_id: &str,
        kind: UsageKind,
        now: DateTime<Utc>,
    ) -> QuotaResult {
        let month = month_key(now);

        let counter = match self.repo.find(user_id).await {
            Ok(Some(mut counter)) => {
                if counter.roll_to(&month) {
                    debug!(user_id, month = %month, "Rolling usage counter into new month");
                    self.persist(&counter).await;
                }
                counter
            }
            Ok(None) => {
                let counter = UsageCounter::new(user_id, &month);
                self.persist(&counter).await;
                counter
            }
            Err(e) => {
                warn!(user_id, error = %e, "Usage lookup failed, allowing request");
                return QuotaResult::Allowed;
            }
        };

        let limit = self.limit_for(kind);
        if counter.count(kind) >= limit {
            metrics::counter!("quota_denied_total", "kind" => kind.to_string()).increment(1);
            return QuotaResult::Denied {
                reason: denial_reason(kind, limit),
            };
        }
        QuotaResult::Allowed
    }

    pub async fn increment_usage(&self, user_id: &str, kind: UsageKind) {
        self.increment_usage_at(user_id, kind, Utc::now()).await
    }

    /// 成功执行后计数加一，失败只记录日志
    pub async fn increment_usage_at(&self, user_id: &str, kind: UsageKind, now: DateTime<Utc>) {
        let month = month_key(now);
        if let Err(e) = self.repo.increment(user_id, &month, kind).await {
            warn!(user_id, kind = %kind, error = %e, "Failed to increment usage counter");
        }
    }

    pub async fn usage_report(&self, user_id: &str) -> Result<UsageReport, RepositoryError> {
        self.usage_report_at(user_id, Utc::now()).await
    }

    /// 当月用量与警示级别，读取时不写回
    pub async fn usage_report_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UsageReport, RepositoryError> {
        let month = month_key(now);
        let mut counter = self
            .repo
            .find(user_id)
            .await?
            .unwrap_or_else(|| UsageCounter::new(user_id, &month));
        counter.roll_to(&month);

        Ok(UsageReport {
            audits: UsageBucket::new(
                counter.audits_this_month,
                self.limits.audit_monthly_limit,
            ),
            site_crawls: UsageBucket::new(
                counter.site_crawls_this_month,
                self.limits.site_crawl_monthly_limit,
            ),
            month_key: month,
        })
    }

    async fn persist(&self, counter: &UsageCounter) {
        if let Err(e) = self.repo.upsert(counter).await {
            warn!(user_id = %counter.user_id, error = %e, "Failed to store usage counter");
        }
    }
}

fn denial_reason(kind: UsageKind, limit: u32) -> String {
    let action = match kind {
        UsageKind::Audit => "audits",
        UsageKind::SiteCrawl => "site crawls",
    };
    format!(
        "Monthly limit of {} {} reached. Upgrade your plan for more.",
        limit, action
    )
}
