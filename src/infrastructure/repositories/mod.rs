// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口的具体实现：
/// 基于 SeaORM 的用量计数与任务归档，以及无数据库时使用的内存用量计数
pub mod job_archive_impl;
pub mod memory_usage_repo;
pub mod usage_repo_impl;
