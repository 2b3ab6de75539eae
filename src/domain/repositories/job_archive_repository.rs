// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{audit_job::AuditJob, crawl_job::CrawlJob};
use crate::domain::repositories::usage_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 终态任务归档特质
///
/// 内存中的任务记录在进程重启后丢失，状态查询会回退到这里保存的终态快照
#[async_trait]
pub trait JobArchive: Send + Sync {
    /// 保存爬取任务的终态快照
    async fn save_crawl(&self, job: &CrawlJob) -> Result<(), RepositoryError>;
    /// 查找爬取任务快照
    async fn find_crawl(&self, id: Uuid) -> Result<Option<CrawlJob>, RepositoryError>;
    /// 保存单页审计任务的终态快照
    async fn save_audit(&self, job: &AuditJob) -> Result<(), RepositoryError>;
    /// 查找单页审计任务快照
    async fn find_audit(&self, id: Uuid) -> Result<Option<AuditJob>, RepositoryError>;
}
