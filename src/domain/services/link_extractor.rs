// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::Html;
use std::collections::HashSet;
use url::Url;

use crate::utils::html::select_all;
use crate::utils::url_utils::{is_non_navigational, resolve_url, same_origin, strip_fragment};

/// 链接发现器
///
/// 负责从HTML内容中提取可继续爬取的同源链接
pub struct LinkExtractor;

impl LinkExtractor {
    /// 提取同源候选链接
    ///
    /// 来源为 `<a href>` 以及同源的 `<link rel="canonical">`。结果去掉片段、
    /// 去重并保持文档顺序；无法解析的地址直接跳过。
    ///
    /// # 参数
    ///
    /// * `html` - 页面HTML
    /// * `base` - 页面URL，用于解析相对链接并判断同源
    pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
        let document = Html::parse_document(html);
        Self::extract_from_document(&document, base)
    }

    pub(crate) fn extract_from_document(document: &Html, base: &Url) -> Vec<Url> {
        let anchors = select_all(document, "a[href]")
            .into_iter()
            .filter_map(|a| a.value().attr("href"));
        let canonical = select_all(document, "link[rel][href]")
            .into_iter()
            .filter(|link| {
                link.value()
                    .attr("rel")
                    .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("canonical")))
            })
            .filter_map(|link| link.value().attr("href"));

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for href in anchors.chain(canonical) {
            if is_non_navigational(href) {
                continue;
            }
            let Ok(url) = resolve_url(base, href.trim()) else {
                continue;
            };
            if !same_origin(&url, base) {
                continue;
            }
            let url = strip_fragment(url);
            if seen.insert(url.as_str().to_string()) {
                links.push(url);
            }
        }

        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Vec<String> {
        let base = Url::parse("https://example.com/docs/").unwrap();
        LinkExtractor::extract_links(html, &base)
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn test_extracts_same_origin_links_without_fragments() {
        let links = extract(
            r##"<a href="/a#one">A</a><a href="/a#two">A again</a><a href="b">B</a>
                <a href="https://example.com/c?x=1">C</a><a href="https://cdn.example.com/d">D</a>"##,
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/a",
                "https://example.com/docs/b",
                "https://example.com/c?x=1",
            ]
        );
    }

    #[test]
    fn test_includes_same_origin_canonical_only() {
        let links = extract(
            r#"<head><link rel="canonical" href="https://example.com/canonical"></head><body></body>"#,
        );
        assert_eq!(links, vec!["https://example.com/canonical"]);

        let links = extract(r#"<head><link rel="canonical" href="https://elsewhere.com/x"></head>"#);
        assert!(links.is_empty());
    }

    #[test]
    fn test_skips_pseudo_and_malformed_links() {
        let links = extract(
            r##"<a href="#">Top</a><a href="mailto:x@example.com">Mail</a>
                <a href="javascript:alert(1)">JS</a><a href="http://[::1">Broken</a><a href="">Empty</a>"##,
        );
        assert!(links.is_empty());
    }
}
