// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 进程内任务存储
///
/// 基于分片哈希表实现，每个键的写操作在分片锁内完成，读取返回快照副本
pub mod memory_audit_store;
pub mod memory_crawl_store;
