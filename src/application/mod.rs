// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 请求DTO、状态视图以及编排领域服务与工作器的用例
pub mod dto;
pub mod use_cases;
