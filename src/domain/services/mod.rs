// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 轻量审计（light_auditor）：逐页提取基础 SEO 信号
/// - 综合审计（comprehensive_auditor）：规则检查、评分与问题汇总
/// - 链接提取（link_extractor）：同源候选链接的发现与规范化
/// - 性能评分（pagespeed）：外部性能服务接口与占位数据
/// - 配额门禁（quota_service）：按用户、按月的用量控制
pub mod comprehensive_auditor;
pub mod light_auditor;
pub mod link_extractor;
pub mod pagespeed;
pub mod quota_service;
