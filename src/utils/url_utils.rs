// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 规范化用户输入的起始URL
///
/// 未带协议时补全 `https://`，随后必须能解析为带主机名的 http(s) 绝对地址
pub fn normalize_start_url(input: &str) -> Result<Url, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("url required".to_string());
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&candidate).map_err(|e| format!("invalid url: {}", e))?;
    if url.host_str().is_none_or(|h| h.is_empty()) {
        return Err("invalid url: missing host".to_string());
    }
    url.set_fragment(None);
    Ok(url)
}

/// 去掉片段部分
pub fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// 两个URL是否同源（协议、主机、端口一致）
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// href 是否为不可跟随的链接（空、仅片段、mailto:、javascript:）
pub fn is_non_navigational(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return true;
    }
    let lower = href.to_ascii_lowercase();
    lower.starts_with("mailto:") || lower.starts_with("javascript:")
}
