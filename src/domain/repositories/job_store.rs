// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{
    audit_job::{AuditJob, AuditStage},
    crawl_job::{CrawlJob, CrawlParams},
    unified_report::UnifiedAuditResult,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 爬取任务修改闭包
pub type CrawlMutation = Box<dyn FnOnce(&mut CrawlJob) + Send>;

/// 爬取任务存储特质
///
/// 进程内共享的任务注册表。每个任务只有一个写入者（其爬取工作器），
/// 读取（状态轮询）可以来自任意数量的请求。所有方法对未知ID都是空操作。
pub trait CrawlJobStore: Send + Sync {
    /// 创建处理中的任务，ID 已存在时不做任何事
    fn init(&self, id: Uuid, params: CrawlParams);
    /// 对处理中的任务应用修改并刷新更新时间与进度，返回是否应用
    fn mutate(&self, id: Uuid, mutation: CrawlMutation) -> bool;
    /// 标记完成并计算汇总
    fn complete(&self, id: Uuid) -> bool;
    /// 标记失败
    fn fail(&self, id: Uuid, error: &str) -> bool;
    /// 设置取消标记，处理中的任务立即失败
    fn cancel(&self, id: Uuid) -> bool;
    /// 获取当前快照
    fn get(&self, id: Uuid) -> Option<CrawlJob>;
    /// 是否应停止爬取：已取消、已终止或任务不存在
    fn is_cancelled(&self, id: Uuid) -> bool;
    /// 移除在 `cutoff` 之前进入终态的任务
    fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> usize;
}

/// 单页审计任务存储特质
pub trait AuditJobStore: Send + Sync {
    fn init(&self, id: Uuid, url: String, owner_id: Option<String>);
    /// 仅在处理中时更新阶段、进度与消息
    fn set_progress(&self, id: Uuid, stage: AuditStage, progress: u8, message: &str) -> bool;
    fn set_completed(&self, id: Uuid, result: UnifiedAuditResult) -> bool;
    fn set_failed(&self, id: Uuid, error: &str) -> bool;
    fn get(&self, id: Uuid) -> Option<AuditJob>;
    fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> usize;
}
