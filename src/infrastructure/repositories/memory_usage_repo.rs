// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::usage::{UsageCounter, UsageKind};
use crate::domain::repositories::usage_repository::{RepositoryError, UsageRepository};
use async_trait::async_trait;
use dashmap::DashMap;

/// 内存用量计数仓库，未配置数据库时使用
#[derive(Default)]
pub struct MemoryUsageRepository {
    counters: DashMap<String, UsageCounter>,
}

impl MemoryUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageRepository for MemoryUsageRepository {
    async fn find(&self, user_id: &str) -> Result<Option<UsageCounter>, RepositoryError> {
        Ok(self.counters.get(user_id).map(|c| c.clone()))
    }

    async fn upsert(&self, counter: &UsageCounter) -> Result<(), RepositoryError> {
        self.counters
            .insert(counter.user_id.clone(), counter.clone());
        Ok(())
    }

    async fn increment(
        &self,
        user_id: &str,
        month_key: &str,
        kind: UsageKind,
    ) -> Result<(), RepositoryError> {
        let mut counter = self
            .counters
            .entry(user_id.to_string())
            .or_insert_with(|| UsageCounter::new(user_id, month_key));
        counter.roll_to(month_key);
        counter.increment(kind);
        Ok(())
    }
}
