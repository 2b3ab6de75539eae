// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含服务器、数据库、抓取、爬取、审计、PageSpeed、配额和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置（未配置URL时完全运行在内存中）
    pub database: DatabaseSettings,
    /// 页面抓取配置
    pub fetch: FetchSettings,
    /// 站点爬取配置
    pub crawl: CrawlSettings,
    /// 单页审计配置
    pub audit: AuditSettings,
    /// PageSpeed 服务配置
    pub pagespeed: PageSpeedSettings,
    /// 月度配额配置
    pub quota: QuotaSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: Option<String>,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 页面抓取配置
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    /// 单次请求超时时间（秒）
    pub timeout_secs: u64,
    /// 请求使用的 User-Agent
    pub user_agent: String,
    /// 是否拒绝解析到私有网段的地址
    pub block_private_networks: bool,
}

/// 站点爬取配置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// 默认最大页面数
    pub default_max_pages: u32,
    /// 默认最大深度
    pub default_max_depth: u32,
    /// 单次爬取的最长运行时间（秒）
    pub max_duration_secs: u64,
    /// 停滞判定窗口（秒）
    pub stall_timeout_secs: u64,
    /// 终态任务在内存中的保留时间（秒）
    pub retention_secs: u64,
    /// 清理任务的执行间隔（秒）
    pub sweep_interval_secs: u64,
}

/// 单页审计配置
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSettings {
    /// 整体审计的墙钟预算（秒）
    pub timeout_secs: u64,
    /// 页面抓取超时时间（秒）
    pub fetch_timeout_secs: u64,
    /// 停滞判定窗口（秒）
    pub stall_timeout_secs: u64,
}

/// PageSpeed 服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct PageSpeedSettings {
    /// API 密钥，缺省时使用占位性能数据
    pub api_key: Option<String>,
    /// 接口地址
    pub endpoint: String,
    /// 单次请求超时时间（秒）
    pub timeout_secs: u64,
    /// 最大重试次数
    pub max_retries: u32,
    /// 结果缓存时间（秒）
    pub cache_ttl_secs: u64,
    /// 测试策略 (mobile, desktop)
    pub strategy: String,
}

/// 月度配额配置
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaSettings {
    /// 每月单页审计次数上限
    pub audit_monthly_limit: u32,
    /// 每月站点爬取次数上限
    pub site_crawl_monthly_limit: u32,
}

/// 指标导出配置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen_addr: String,
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CrawlSettings {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn stall_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stall_timeout_secs as i64)
    }
}

impl AuditSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn stall_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stall_timeout_secs as i64)
    }

    /// 性能服务调用（含重试）可用的最长时间：总超时减去页面抓取超时
    pub fn pagespeed_budget(&self) -> Duration {
        self.timeout().saturating_sub(self.fetch_timeout())
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default.toml`、`config/{APP_ENVIRONMENT}.toml`
    /// 以及 `SEOSCOPE__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let settings: Settings = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SEOSCOPE").separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验各项超时之间的关系
    ///
    /// 启用 PageSpeed 时，审计总超时必须能容纳一次页面抓取加一次完整的性能请求，
    /// 否则性能数据永远拿不到。超出预算的重试会在运行时被截断并回退到占位数据。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagespeed.api_key.is_none() {
            return Ok(());
        }
        let single_attempt = Duration::from_secs(self.pagespeed.timeout_secs);
        if single_attempt >= self.audit.pagespeed_budget() {
            return Err(ConfigError::Message(format!(
                "pagespeed.timeout_secs ({}) must be shorter than audit.timeout_secs ({}) minus audit.fetch_timeout_secs ({})",
                self.pagespeed.timeout_secs, self.audit.timeout_secs, self.audit.fetch_timeout_secs
            )));
        }
        Ok(())
    }

    /// 仅包含内置默认值的配置
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Fetching
            .set_default("fetch.timeout_secs", 12)?
            .set_default(
                "fetch.user_agent",
                "Mozilla/5.0 (compatible; SEO-Audit-Crawler/1.0)",
            )?
            .set_default("fetch.block_private_networks", true)?
            // Site crawl
            .set_default("crawl.default_max_pages", 20)?
            .set_default("crawl.default_max_depth", 2)?
            .set_default("crawl.max_duration_secs", 600)?
            .set_default("crawl.stall_timeout_secs", 120)?
            .set_default("crawl.retention_secs", 86_400)?
            .set_default("crawl.sweep_interval_secs", 600)?
            // Single page audit
            .set_default("audit.timeout_secs", 45)?
            .set_default("audit.fetch_timeout_secs", 15)?
            .set_default("audit.stall_timeout_secs", 120)?
            // PageSpeed Insights
            .set_default(
                "pagespeed.endpoint",
                "https://www.googleapis.com/pagespeedonline/v5/runPagespeed",
            )?
            .set_default("pagespeed.timeout_secs", 20)?
            .set_default("pagespeed.max_retries", 2)?
            .set_default("pagespeed.cache_ttl_secs", 1800)?
            .set_default("pagespeed.strategy", "mobile")?
            // Monthly quota
            .set_default("quota.audit_monthly_limit", 30)?
            .set_default("quota.site_crawl_monthly_limit", 5)?
            // Metrics
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
