// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{dto::audit_request::StartAuditRequest, use_cases::audit_use_case::AuditUseCase},
    presentation::{errors::AppError, extractors::current_user::CurrentUser},
};

/// 启动单页审计
pub async fn start_audit(
    Extension(use_case): Extension<Arc<AuditUseCase>>,
    user: CurrentUser,
    Json(payload): Json<StartAuditRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = use_case.start_audit(user.id(), payload).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// 查询审计状态
pub async fn get_audit_status(
    Extension(use_case): Extension<Arc<AuditUseCase>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    Json(use_case.get_status(id, user.id()).await)
}
