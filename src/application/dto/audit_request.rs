// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job_status::JobStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 启动单页审计请求
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartAuditRequest {
    #[validate(length(min = 1, max = 2048, message = "url required"))]
    pub url: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 200))]
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAuditResponse {
    pub audit_id: Uuid,
    pub status: JobStatus,
}
