// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::use_cases::{
    audit_use_case::AuditUseCaseError, crawl_use_case::CrawlUseCaseError,
    usage_use_case::UsageUseCaseError,
};
use crate::domain::repositories::usage_repository::RepositoryError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口。
/// 配额超限返回 402 并在响应体中带上 `upgrade: true`。
#[derive(Debug)]
pub struct AppError(anyhow::Error);

/// 错误分类：HTTP状态码以及是否提示升级
fn classify(err: &anyhow::Error) -> (StatusCode, bool) {
    if let Some(e) = err.downcast_ref::<CrawlUseCaseError>() {
        return match e {
            CrawlUseCaseError::ValidationError(_) => (StatusCode::BAD_REQUEST, false),
            CrawlUseCaseError::AuthenticationRequired => (StatusCode::UNAUTHORIZED, false),
            CrawlUseCaseError::QuotaExceeded(_) => (StatusCode::PAYMENT_REQUIRED, true),
            CrawlUseCaseError::NotFound => (StatusCode::NOT_FOUND, false),
        };
    }
    if let Some(e) = err.downcast_ref::<AuditUseCaseError>() {
        return match e {
            AuditUseCaseError::ValidationError(_) => (StatusCode::BAD_REQUEST, false),
            AuditUseCaseError::QuotaExceeded(_) => (StatusCode::PAYMENT_REQUIRED, true),
            AuditUseCaseError::NotFound => (StatusCode::NOT_FOUND, false),
        };
    }
    if let Some(e) = err.downcast_ref::<UsageUseCaseError>() {
        return match e {
            UsageUseCaseError::AuthenticationRequired => (StatusCode::UNAUTHORIZED, false),
            UsageUseCaseError::Repository(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, false)
            }
            UsageUseCaseError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, false),
        };
    }
    match err.downcast_ref::<RepositoryError>() {
        Some(RepositoryError::NotFound) => (StatusCode::NOT_FOUND, false),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, false),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_message = self.0.to_string();
        let (status, upgrade) = classify(&self.0);

        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.0);
        }

        let body = if upgrade {
            Json(json!({ "error": error_message, "upgrade": true }))
        } else {
            Json(json!({ "error": error_message }))
        };
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
