// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 使用SeaORM框架进行对象关系映射：
/// 用量计数（usage_counter）、爬取归档（crawl_record）、审计归档（audit_record）
pub mod audit_record;
pub mod crawl_record;
pub mod usage_counter;
