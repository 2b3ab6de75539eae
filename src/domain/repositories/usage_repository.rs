// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::usage::{UsageCounter, UsageKind};
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 快照序列化错误
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 用量计数仓库特质
///
/// 每个用户一行计数，`month_key` 标记计数所属的自然月
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// 查找用户的计数行
    async fn find(&self, user_id: &str) -> Result<Option<UsageCounter>, RepositoryError>;
    /// 写入（新建或覆盖）计数行
    async fn upsert(&self, counter: &UsageCounter) -> Result<(), RepositoryError>;
    /// 为指定月份的计数加一；行不存在或月份不同则先以该月份重建
    async fn increment(
        &self,
        user_id: &str,
        month_key: &str,
        kind: UsageKind,
    ) -> Result<(), RepositoryError>;
}
