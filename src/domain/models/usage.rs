// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 受配额限制的操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageKind {
    Audit,
    SiteCrawl,
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UsageKind::Audit => write!(f, "AUDIT"),
            UsageKind::SiteCrawl => write!(f, "SITE_CRAWL"),
        }
    }
}

impl FromStr for UsageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUDIT" => Ok(UsageKind::Audit),
            "SITE_CRAWL" => Ok(UsageKind::SiteCrawl),
            _ => Err(()),
        }
    }
}

/// 当前自然月的键，格式 `YYYY-MM`
pub fn month_key(now: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", now.year(), now.month())
}

/// 用户月度用量计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounter {
    pub user_id: String,
    pub month_key: String,
    pub audits_this_month: u32,
    pub site_crawls_this_month: u32,
}

impl UsageCounter {
    pub fn new(user_id: &str, month_key: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            month_key: month_key.to_string(),
            audits_this_month: 0,
            site_crawls_this_month: 0,
        }
    }

    pub fn count(&self, kind: UsageKind) -> u32 {
        match kind {
            UsageKind::Audit => self.audits_this_month,
            UsageKind::SiteCrawl => self.site_crawls_this_month,
        }
    }

    /// 跨月时清零，返回是否发生了重置
    pub fn roll_to(&mut self, month_key: &str) -> bool {
        if self.month_key == month_key {
            return false;
        }
        self.month_key = month_key.to_string();
        self.audits_this_month = 0;
        self.site_crawls_this_month = 0;
        true
    }

    pub fn increment(&mut self, kind: UsageKind) {
        match kind {
            UsageKind::Audit => self.audits_this_month += 1,
            UsageKind::SiteCrawl => self.site_crawls_this_month += 1,
        }
    }
}

/// 用量警示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageLevel {
    /// 低于 70%
    Ok,
    /// 不低于 70%
    High,
    /// 不低于 90%
    NearLimit,
    /// 达到或超过上限
    Exceeded,
}

impl UsageLevel {
    pub fn from_usage(used: u32, limit: u32) -> Self {
        if limit == 0 {
            return UsageLevel::Exceeded;
        }
        let percent = used as u64 * 100;
        let limit = limit as u64;
        if percent >= limit * 100 {
            UsageLevel::Exceeded
        } else if percent >= limit * 90 {
            UsageLevel::NearLimit
        } else if percent >= limit * 70 {
            UsageLevel::High
        } else {
            UsageLevel::Ok
        }
    }
}
