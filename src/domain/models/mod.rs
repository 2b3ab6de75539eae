// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 定义爬取任务、单页审计任务、审计结果与用量计数等核心实体
pub mod audit_job;
pub mod audit_report;
pub mod crawl_job;
pub mod job_status;
pub mod page_audit;
pub mod unified_report;
pub mod usage;
