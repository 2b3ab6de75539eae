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

use crate::domain::models::usage::{UsageCounter, UsageKind};
use crate::domain::repositories::usage_repository::{RepositoryError, UsageRepository};
use crate::infrastructure::database::entities::usage_counter;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;

/// 用量计数仓库实现
pub struct UsageRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl UsageRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_domain(model: usage_counter::Model) -> UsageCounter {
    UsageCounter {
        user_id: model.user_id,
        month_key: model.month_key,
        audits_this_month: model.audits_this_month.max(0) as u32,
        site_crawls_this_month: model.site_crawls_this_month.max(0) as u32,
    }
}

fn counter_column(kind: UsageKind) -> usage_counter::Column {
    match kind {
        UsageKind::Audit => usage_counter::Column::AuditsThisMonth,
        UsageKind::SiteCrawl => usage_counter::Column::SiteCrawlsThisMonth,
    }
}

#[async_trait]
impl UsageRepository for UsageRepositoryImpl {
    async fn find(&self, user_id: &str) -> Result<Option<UsageCounter>, RepositoryError> {
        let model = usage_counter::Entity::find_by_id(user_id.to_string())
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(to_domain))
    }

    async fn upsert(&self, counter: &UsageCounter) -> Result<(), RepositoryError> {
        let model = usage_counter::ActiveModel {
            user_id: Set(counter.user_id.clone()),
            month_key: Set(counter.month_key.clone()),
            audits_this_month: Set(counter.audits_this_month as i32),
            site_crawls_this_month: Set(counter.site_crawls_this_month as i32),
            updated_at: Set(Utc::now().fixed_offset()),
        };

        usage_counter::Entity::insert(model)
            .on_conflict(
                OnConflict::column(usage_counter::Column::UserId)
                    .update_columns([
                        usage_counter::Column::MonthKey,
                        usage_counter::Column::AuditsThisMonth,
                        usage_counter::Column::SiteCrawlsThisMonth,
                        usage_counter::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn increment(
        &self,
        user_id: &str,
        month_key: &str,
        kind: UsageKind,
    ) -> Result<(), RepositoryError> {
        let column = counter_column(kind);
        let result = usage_counter::Entity::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .col_expr(
                usage_counter::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(usage_counter::Column::UserId.eq(user_id))
            .filter(usage_counter::Column::MonthKey.eq(month_key))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            // Missing row or a stale month: restart the counter with this action recorded
            let mut counter = UsageCounter::new(user_id, month_key);
            counter.increment(kind);
            self.upsert(&counter).await?;
        }
        Ok(())
    }
}
