// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job_status::JobStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 启动站点爬取请求
///
/// `maxPages`/`maxDepth` 超出范围时被截断而不是拒绝
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartCrawlRequest {
    #[validate(length(min = 1, max = 2048, message = "url required"))]
    pub url: String,
    pub max_pages: Option<i64>,
    pub max_depth: Option<i64>,
}

/// 爬取参数的取值范围与默认值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBounds {
    pub min_pages: u32,
    pub max_pages: u32,
    pub default_pages: u32,
    pub min_depth: u32,
    pub max_depth: u32,
    pub default_depth: u32,
}

impl CrawlBounds {
    /// 公开审计入口：页面 1-200（默认 20），深度 0-5（默认 2）
    pub const STANDARD: Self = Self {
        min_pages: 1,
        max_pages: 200,
        default_pages: 20,
        min_depth: 0,
        max_depth: 5,
        default_depth: 2,
    };

    /// 控制台入口：页面 10-100（默认 50），深度 1-5（默认 3）
    pub const DASHBOARD: Self = Self {
        min_pages: 10,
        max_pages: 100,
        default_pages: 50,
        min_depth: 1,
        max_depth: 5,
        default_depth: 3,
    };

    /// 替换默认值，默认值本身也会被截断到范围内
    pub fn with_defaults(mut self, pages: u32, depth: u32) -> Self {
        self.default_pages = pages.clamp(self.min_pages, self.max_pages);
        self.default_depth = depth.clamp(self.min_depth, self.max_depth);
        self
    }

    /// 返回截断后的 `(max_pages, max_depth)`
    pub fn clamp(&self, pages: Option<i64>, depth: Option<i64>) -> (u32, u32) {
        let pages = pages
            .map(|p| p.clamp(self.min_pages as i64, self.max_pages as i64) as u32)
            .unwrap_or(self.default_pages);
        let depth = depth
            .map(|d| d.clamp(self.min_depth as i64, self.max_depth as i64) as u32)
            .unwrap_or(self.default_depth);
        (pages, depth)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartCrawlResponse {
    pub id: Uuid,
    pub status: JobStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelCrawlResponse {
    pub id: Uuid,
    pub cancelled: bool,
    pub status: JobStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_bounds() {
        let b = CrawlBounds::STANDARD;
        assert_eq!(b.clamp(None, None), (20, 2));
        assert_eq!(b.clamp(Some(0), Some(-3)), (1, 0));
        assert_eq!(b.clamp(Some(5000), Some(9)), (200, 5));
        assert_eq!(b.clamp(Some(42), Some(3)), (42, 3));
    }

    #[test]
    fn test_dashboard_bounds() {
        let b = CrawlBounds::DASHBOARD;
        assert_eq!(b.clamp(None, None), (50, 3));
        assert_eq!(b.clamp(Some(1), Some(0)), (10, 1));
        assert_eq!(b.clamp(Some(101), Some(6)), (100, 5));
    }

    #[test]
    fn test_configured_defaults_are_clamped() {
        let b = CrawlBounds::STANDARD.with_defaults(500, 1);
        assert_eq!(b.clamp(None, None), (200, 1));
    }

    #[test]
    fn test_request_accepts_camel_case() {
        let req: StartCrawlRequest =
            serde_json::from_str(r#"{"url":"example.com","maxPages":5,"maxDepth":1}"#).unwrap();
        assert_eq!(req.max_pages, Some(5));
        assert_eq!(req.max_depth, Some(1));
        assert!(req.validate().is_ok());

        let empty: StartCrawlRequest = serde_json::from_str(r#"{"url":""}"#).unwrap();
        assert!(empty.validate().is_err());
    }
}
