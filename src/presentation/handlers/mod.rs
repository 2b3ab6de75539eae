// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP 处理器模块
pub mod audit_handler;
pub mod crawl_handler;
pub mod usage_handler;
