// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;

use crate::{
    application::use_cases::usage_use_case::UsageUseCase,
    presentation::{errors::AppError, extractors::current_user::CurrentUser},
};

/// 当月用量与警示级别
pub async fn get_usage(
    Extension(use_case): Extension<Arc<UsageUseCase>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let report = use_case.get_usage(user.id()).await?;
    Ok(Json(report))
}
