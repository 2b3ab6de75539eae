// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义领域层依赖的存储抽象，具体实现由基础设施层提供：
/// - 任务存储（job_store）：爬取与单页审计任务的进程内注册表
/// - 用量仓库（usage_repository）：用户月度配额计数
/// - 任务归档（job_archive_repository）：终态任务的持久化快照
pub mod job_archive_repository;
pub mod job_store;
pub mod usage_repository;
