// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::usage_repository::RepositoryError;
use crate::domain::services::quota_service::{QuotaService, UsageReport};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UsageUseCaseError {
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 当月用量查询
pub struct UsageUseCase {
    quota: Arc<QuotaService>,
}

impl UsageUseCase {
    pub fn new(quota: Arc<QuotaService>) -> Self {
        Self { quota }
    }

    pub async fn get_usage(&self, user_id: Option<&str>) -> Result<UsageReport, UsageUseCaseError> {
        let user = user_id.ok_or(UsageUseCaseError::AuthenticationRequired)?;
        Ok(self.quota.usage_report(user).await?)
    }
}
