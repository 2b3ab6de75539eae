// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供HTML查询、URL处理、重试退避和日志初始化等通用工具
pub mod html;
pub mod retry_policy;
pub mod telemetry;
pub mod url_utils;
