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

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{
        dto::crawl_request::StartCrawlRequest,
        use_cases::crawl_use_case::{CrawlUseCase, CrawlVariant},
    },
    presentation::{errors::AppError, extractors::current_user::CurrentUser},
};

/// 启动站点爬取（公开入口）
pub async fn start_crawl(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
    user: CurrentUser,
    Json(payload): Json<StartCrawlRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = use_case
        .start_crawl(user.id(), CrawlVariant::Standard, payload)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// 启动站点爬取（控制台入口，需要登录）
pub async fn start_dashboard_crawl(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
    user: CurrentUser,
    Json(payload): Json<StartCrawlRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = use_case
        .start_crawl(user.id(), CrawlVariant::Dashboard, payload)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// 查询爬取状态，未知任务返回 `{"status":"not_found"}`
pub async fn get_crawl_status(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    Json(use_case.get_status(id, user.id()).await)
}

/// 取消爬取
pub async fn cancel_crawl(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let response = use_case.cancel(id, user.id())?;
    Ok(Json(response))
}
