// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供后台任务处理和工作器管理功能：
/// 站点爬取、单页审计以及终态任务的过期清理
pub mod audit_worker;
pub mod crawl_worker;
pub mod expiration_worker;
pub mod manager;

pub use manager::WorkerManager;
