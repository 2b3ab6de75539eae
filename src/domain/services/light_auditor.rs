// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::Html;
use url::Url;

use crate::domain::models::page_audit::LightAudit;
use crate::utils::html::{body_text, count, element_text, first_attr, select_all, select_first, word_count};
use crate::utils::url_utils::{is_non_navigational, resolve_url, same_origin};

/// 轻量页面审计
///
/// 纯函数，不做任何网络访问。相对链接按 `base` 解析，
/// 与 `base` 同源的链接计入内部链接数。HTML 损坏时字段退化为空值或零。
pub fn light_page_audit(html: &str, base: &Url) -> LightAudit {
    let document = Html::parse_document(html);
    audit_document(&document, base)
}

pub(crate) fn audit_document(document: &Html, base: &Url) -> LightAudit {
    let title = select_first(document, "title")
        .map(element_text)
        .filter(|t| !t.is_empty());

    let meta_description = first_attr(document, r#"meta[name="description"]"#, "content")
        .or_else(|| first_attr(document, r#"meta[property="og:description"]"#, "content"));

    let images = select_all(document, "img");
    let images_without_alt = images
        .iter()
        .filter(|img| img.value().attr("alt").is_none())
        .count() as u32;

    LightAudit {
        title,
        meta_description,
        h1_count: count(document, "h1"),
        h2_count: count(document, "h2"),
        word_count: word_count(&body_text(document)),
        images: images.len() as u32,
        images_without_alt,
        internal_link_count: internal_link_count(document, base),
    }
}

fn internal_link_count(document: &Html, base: &Url) -> u32 {
    select_all(document, "a[href]")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| !is_non_navigational(href))
        .filter_map(|href| resolve_url(base, href.trim()).ok())
        .filter(|url| same_origin(url, base))
        .count() as u32
}
