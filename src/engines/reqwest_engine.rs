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

use crate::config::settings::FetchSettings;
use crate::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse};
use crate::engines::validators;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// 抓取引擎
///
/// 基于reqwest实现的HTTP抓取引擎，所有请求共享一个连接池。
/// 重定向由引擎逐跳跟随，开启 SSRF 防护时每一跳的目标都要重新校验。
pub struct ReqwestEngine {
    client: reqwest::Client,
    block_private_networks: bool,
}

impl ReqwestEngine {
    /// 按抓取配置创建引擎
    ///
    /// # 参数
    ///
    /// * `settings` - 抓取配置（User-Agent、SSRF 防护开关）
    pub fn new(settings: &FetchSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            block_private_networks: settings.block_private_networks,
        })
    }

    async fn check_target(&self, url: &str) -> Result<(), EngineError> {
        if self.block_private_networks {
            validators::validate_url(url)
                .await
                .map_err(|e| EngineError::Blocked(e.to_string()))?;
        }
        Ok(())
    }

    /// 解析重定向响应的下一跳并校验
    ///
    /// 非重定向响应或缺少 `Location` 时返回 `None`
    pub(crate) async fn next_hop(
        &self,
        current: &Url,
        status: StatusCode,
        headers: &HeaderMap,
    ) -> Result<Option<Url>, EngineError> {
        if !status.is_redirection() {
            return Ok(None);
        }
        let Some(location) = headers.get(LOCATION).and_then(|v| v.to_str().ok()) else {
            return Ok(None);
        };
        let next = current
            .join(location.trim())
            .map_err(|e| EngineError::Other(format!("Invalid redirect location {}: {}", location, e)))?;
        if let Err(e) = self.check_target(next.as_str()).await {
            warn!(from = %current, to = %next, "Redirect target rejected");
            return Err(e);
        }
        Ok(Some(next))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Timeout
    } else {
        EngineError::RequestFailed(e)
    }
}

#[async_trait]
impl FetchEngine for ReqwestEngine {
    /// 执行HTTP GET抓取
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 抓取响应（包含非 2xx 响应）
    /// * `Err(EngineError)` - 网络错误、超时或被 SSRF 防护拒绝
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        self.check_target(&request.url).await?;
        let mut url = Url::parse(&request.url)
            .map_err(|e| EngineError::Other(format!("Invalid URL {}: {}", request.url, e)))?;

        let start = Instant::now();
        let mut redirects = 0;
        let response = loop {
            let remaining = request.timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return Err(EngineError::Timeout);
            }
            let response = self
                .client
                .get(url.clone())
                .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
                .timeout(remaining)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            match self
                .next_hop(&url, response.status(), response.headers())
                .await?
            {
                Some(next) if redirects < MAX_REDIRECTS => {
                    redirects += 1;
                    url = next;
                }
                Some(_) => {
                    return Err(EngineError::Other(format!(
                        "Too many redirects (more than {})",
                        MAX_REDIRECTS
                    )))
                }
                None => break response,
            }
        };

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or("text/html")
            .to_string();

        let content = response.text().await.map_err(map_reqwest_error)?;
        let response_time_ms = start.elapsed().as_millis() as u64;
        debug!(url = %request.url, status_code, response_time_ms, "Fetched page");

        Ok(FetchResponse {
            status_code,
            content,
            content_type,
            final_url,
            response_time_ms,
        })
    }

    /// 获取引擎名称
    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
