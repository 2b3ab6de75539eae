// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：作业、页面结果、审计报告与用量计数
/// - 仓库接口（repositories）：作业存储、归档与用量持久化抽象
/// - 服务（services）：页面审计、链接提取、性能评分与配额门禁
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod repositories;
pub mod services;
