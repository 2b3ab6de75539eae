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

use crate::domain::models::{audit_job::AuditJob, crawl_job::CrawlJob};
use crate::domain::repositories::job_archive_repository::JobArchive;
use crate::domain::repositories::usage_repository::RepositoryError;
use crate::infrastructure::database::entities::{audit_record, crawl_record};
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 终态任务归档实现
///
/// 完整任务以 JSON 快照保存，常用字段单独成列便于查询
pub struct JobArchiveImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobArchiveImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobArchive for JobArchiveImpl {
    async fn save_crawl(&self, job: &CrawlJob) -> Result<(), RepositoryError> {
        let model = crawl_record::ActiveModel {
            id: Set(job.id),
            owner_id: Set(job.owner_id.clone()),
            root_url: Set(job.root_url.clone()),
            status: Set(job.status.to_string()),
            pages: Set(job.pages.len() as i32),
            snapshot: Set(serde_json::to_value(job)?),
            started_at: Set(job.started_at.fixed_offset()),
            completed_at: Set(job.updated_at.fixed_offset()),
        };

        crawl_record::Entity::insert(model)
            .on_conflict(
                OnConflict::column(crawl_record::Column::Id)
                    .update_columns([
                        crawl_record::Column::Status,
                        crawl_record::Column::Pages,
                        crawl_record::Column::Snapshot,
                        crawl_record::Column::CompletedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn find_crawl(&self, id: Uuid) -> Result<Option<CrawlJob>, RepositoryError> {
        let record = crawl_record::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(record
            .map(|r| serde_json::from_value(r.snapshot))
            .transpose()?)
    }

    async fn save_audit(&self, job: &AuditJob) -> Result<(), RepositoryError> {
        let model = audit_record::ActiveModel {
            id: Set(job.id),
            owner_id: Set(job.owner_id.clone()),
            url: Set(job.url.clone()),
            status: Set(job.status.to_string()),
            overall_score: Set(job.result.as_ref().map(|r| r.overall_score as i32)),
            snapshot: Set(serde_json::to_value(job)?),
            started_at: Set(job.started_at.fixed_offset()),
            completed_at: Set(job.updated_at.fixed_offset()),
        };

        audit_record::Entity::insert(model)
            .on_conflict(
                OnConflict::column(audit_record::Column::Id)
                    .update_columns([
                        audit_record::Column::Status,
                        audit_record::Column::OverallScore,
                        audit_record::Column::Snapshot,
                        audit_record::Column::CompletedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn find_audit(&self, id: Uuid) -> Result<Option<AuditJob>, RepositoryError> {
        let record = audit_record::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(record
            .map(|r| serde_json::from_value(r.snapshot))
            .transpose()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::crawl_job::{CrawlParams, PageResult};
    use crate::domain::models::job_status::JobStatus;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn archive() -> JobArchiveImpl {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        JobArchiveImpl::new(Arc::new(db))
    }

    #[tokio::test]
    async fn test_crawl_snapshot_round_trip() {
        let archive = archive().await;
        let id = Uuid::new_v4();
        let mut job = CrawlJob::new(
            id,
            CrawlParams {
                root_url: "https://acme.test/".to_string(),
                max_pages: 5,
                max_depth: 1,
                owner_id: Some("u1".to_string()),
            },
            Utc::now(),
        );
        job.push_page(PageResult::failed(
            "https://acme.test/",
            Some(404),
            "HTTP 404",
            Utc::now(),
        ));
        job.complete(Utc::now());

        archive.save_crawl(&job).await.unwrap();
        // Saving twice updates in place
        archive.save_crawl(&job).await.unwrap();

        let stored = archive.find_crawl(id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.pages.len(), 1);
        assert_eq!(stored.owner_id.as_deref(), Some("u1"));
        assert!(archive.find_crawl(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_audit_snapshot_round_trip() {
        let archive = archive().await;
        let id = Uuid::new_v4();
        let mut job = AuditJob::new(id, "https://acme.test/".to_string(), None, Utc::now());
        job.set_failed("Audit timed out", Utc::now());

        archive.save_audit(&job).await.unwrap();
        let stored = archive.find_audit(id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error.as_deref(), Some("Audit timed out"));
    }
}
