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

use chrono::Utc;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::domain::models::audit_report::{
    pass_ratio_score, Check, ComprehensiveAudit, HeadingTags, Issue, PageMeta, PageStats,
    QuickWin, Scores, Severity, SocialMeta, StructuredData,
};
use crate::domain::services::pagespeed::{
    fallback_report, PageSpeedError, PageSpeedProvider, PerformanceReport, Strategy,
};
use crate::utils::html::{
    body_text, count, element_text, first_attr, select_all, select_first, select_within,
    word_count,
};
use crate::utils::url_utils::{is_non_navigational, resolve_url, same_origin};

/// 估算的单张图片大小（字节）
const MOCK_IMAGE_BYTES: u64 = 51_200;
/// 估算的单个脚本大小（字节）
const MOCK_SCRIPT_BYTES: u64 = 10_500;
/// 阅读速度（词/分钟）
const WORDS_PER_MINUTE: u32 = 200;
const MAX_RENDER_BLOCKING: u32 = 10;
const MIN_CONTENT_RATE: f64 = 0.1;
const QUICK_WIN_COUNT: usize = 4;

const VALID_HEAD_ELEMENTS: &[&str] = &["title", "meta", "link", "script", "style", "base"];

/// 进度回调：`(百分比, 描述)`
///
/// 回调中的 panic 会被捕获并记录，不会中断审计
pub type ProgressCallback = Arc<dyn Fn(u8, &str) + Send + Sync>;

/// 综合页面审计器
///
/// 在轻量审计的基础上解析结构化数据、执行可访问性/可索引性/SEO/最佳实践规则检查，
/// 并可选调用外部 PageSpeed 服务获取性能数据。审计本身不会失败：
/// 性能服务缺失或出错时使用固定的占位数据。
pub struct ComprehensiveAuditor {
    pagespeed: Option<Arc<dyn PageSpeedProvider>>,
    strategy: Strategy,
    pagespeed_budget: Option<Duration>,
}

impl ComprehensiveAuditor {
    pub fn new(pagespeed: Option<Arc<dyn PageSpeedProvider>>, strategy: Strategy) -> Self {
        Self {
            pagespeed,
            strategy,
            pagespeed_budget: None,
        }
    }

    /// 设置性能服务调用（含全部重试）的时间上限，超时后使用占位数据
    pub fn with_pagespeed_budget(mut self, budget: Duration) -> Self {
        self.pagespeed_budget = Some(budget);
        self
    }

    /// 不接入性能服务的审计器
    pub fn without_pagespeed() -> Self {
        Self::new(None, Strategy::Mobile)
    }

    /// 执行综合审计
    ///
    /// # 参数
    ///
    /// * `html` - 页面HTML
    /// * `url` - 页面URL，用于解析相对链接并查询性能服务
    /// * `progress` - 可选的进度回调，在解析、性能测量和评分三个节点调用
    pub async fn audit(
        &self,
        html: &str,
        url: &str,
        progress: Option<&ProgressCallback>,
    ) -> ComprehensiveAudit {
        self.audit_within(html, url, progress, None).await
    }

    /// 在给定时间内完成综合审计
    ///
    /// `budget` 与构造时设置的上限取较小值，只约束性能服务调用；
    /// 超出时性能数据退化为占位数据，审计照常完成。
    pub async fn audit_within(
        &self,
        html: &str,
        url: &str,
        progress: Option<&ProgressCallback>,
        budget: Option<Duration>,
    ) -> ComprehensiveAudit {
        notify(progress, 40, "Analyzing page structure");
        // Parsed document never crosses an await point
        let analysis = analyze_document(html, url);

        notify(progress, 60, "Measuring performance");
        let budget = match (budget, self.pagespeed_budget) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let performance = self.measure_performance(url, budget).await;

        notify(progress, 85, "Calculating scores");
        assemble(url, analysis, performance)
    }

    async fn measure_performance(&self, url: &str, budget: Option<Duration>) -> PerformanceReport {
        let Some(provider) = &self.pagespeed else {
            return fallback_report(&PageSpeedError::NotConfigured.to_string());
        };

        let outcome = match budget {
            Some(budget) => tokio::time::timeout(budget, provider.analyze(url, self.strategy))
                .await
                .unwrap_or(Err(PageSpeedError::Timeout)),
            None => provider.analyze(url, self.strategy).await,
        };
        match outcome {
            Ok(report) => report,
            Err(e) => {
                warn!(url = %url, error = %e, "PageSpeed unavailable, using fallback metrics");
                metrics::counter!("pagespeed_failures_total").increment(1);
                fallback_report(&e.to_string())
            }
        }
    }
}

fn notify(progress: Option<&ProgressCallback>, percent: u8, message: &str) {
    if let Some(callback) = progress {
        if catch_unwind(AssertUnwindSafe(|| callback(percent, message))).is_err() {
            warn!(message, "Audit progress callback panicked");
        }
    }
}

/// 文档分析的中间结果（不含性能数据）
struct DocumentAnalysis {
    meta: PageMeta,
    stats: PageStats,
    h_tags: HeadingTags,
    social_meta: SocialMeta,
    structured_data: StructuredData,
    accessibility: Vec<Check>,
    indexability: Vec<Check>,
    seo_checks: Vec<Check>,
    best_practices: Vec<Check>,
    issues: Vec<Issue>,
}

fn analyze_document(html: &str, url: &str) -> DocumentAnalysis {
    let document = Html::parse_document(html);
    let base = Url::parse(url).ok();

    let meta = extract_meta(&document);
    let h_tags = HeadingTags {
        h1: texts(&document, "h1"),
        h2: texts(&document, "h2"),
        h3: texts(&document, "h3"),
    };
    let social_meta = extract_social_meta(&document);
    let structured_data = extract_structured_data(&document);
    let stats = compute_stats(&document, html, base.as_ref());

    let buttons_without_text = select_all(&document, "button")
        .into_iter()
        .filter(|b| !has_accessible_name(*b))
        .count();

    let accessibility = accessibility_checks(&document, &meta, &stats, buttons_without_text);
    let indexability = indexability_checks(&document, &meta);
    let seo_checks = seo_checks(&document, &meta, &h_tags, &stats, &social_meta, &structured_data);
    let best_practices = best_practice_checks(&document, html, &meta, url);
    let issues = collect_issues(&meta, &h_tags, &stats, &structured_data, buttons_without_text);

    DocumentAnalysis {
        meta,
        stats,
        h_tags,
        social_meta,
        structured_data,
        accessibility,
        indexability,
        seo_checks,
        best_practices,
        issues,
    }
}

fn assemble(url: &str, analysis: DocumentAnalysis, performance: PerformanceReport) -> ComprehensiveAudit {
    let scores = Scores::new(
        performance.score,
        pass_ratio_score(&analysis.accessibility),
        pass_ratio_score(&analysis.indexability),
        pass_ratio_score(&analysis.seo_checks),
        pass_ratio_score(&analysis.best_practices),
    );
    debug!(url = %url, overall = scores.overall, "Comprehensive audit scored");

    let quick_wins = analysis
        .issues
        .iter()
        .take(QUICK_WIN_COUNT)
        .map(QuickWin::from)
        .collect();

    ComprehensiveAudit {
        url: url.to_string(),
        audited_at: Utc::now(),
        scores,
        meta: analysis.meta,
        stats: analysis.stats,
        h_tags: analysis.h_tags,
        social_meta: analysis.social_meta,
        structured_data: analysis.structured_data,
        accessibility: analysis.accessibility,
        indexability: analysis.indexability,
        seo_checks: analysis.seo_checks,
        best_practices: analysis.best_practices,
        performance_metrics: performance.metrics,
        performance_source: performance.source,
        opportunities: performance.opportunities,
        diagnostics: performance.diagnostics,
        issues: analysis.issues,
        quick_wins,
    }
}

fn texts(document: &Html, css: &str) -> Vec<String> {
    select_all(document, css).into_iter().map(element_text).collect()
}

fn has_rel(element: &ElementRef<'_>, wanted: &str) -> bool {
    element
        .value()
        .attr("rel")
        .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case(wanted)))
}

fn canonical_links<'a>(document: &'a Html) -> Vec<ElementRef<'a>> {
    select_all(document, "link[rel]")
        .into_iter()
        .filter(|link| has_rel(link, "canonical"))
        .collect()
}

fn extract_meta(document: &Html) -> PageMeta {
    let canonical = canonical_links(document)
        .into_iter()
        .filter_map(|link| link.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string);

    let charset = first_attr(document, "meta[charset]", "charset").or_else(|| {
        select_all(document, "meta[http-equiv][content]")
            .into_iter()
            .filter(|m| {
                m.value()
                    .attr("http-equiv")
                    .is_some_and(|v| v.eq_ignore_ascii_case("content-type"))
            })
            .filter_map(|m| m.value().attr("content"))
            .find_map(|content| {
                content
                    .to_ascii_lowercase()
                    .split("charset=")
                    .nth(1)
                    .map(|c| c.trim().to_string())
            })
    });

    let has_favicon = select_all(document, "link[rel]")
        .into_iter()
        .any(|link| has_rel(&link, "icon") || has_rel(&link, "apple-touch-icon"));

    PageMeta {
        title: select_first(document, "title")
            .map(element_text)
            .filter(|t| !t.is_empty()),
        meta_description: first_attr(document, r#"meta[name="description"]"#, "content"),
        canonical,
        lang: first_attr(document, "html[lang]", "lang"),
        robots: first_attr(document, r#"meta[name="robots"]"#, "content"),
        charset,
        viewport: first_attr(document, r#"meta[name="viewport"]"#, "content"),
        has_favicon,
    }
}

fn extract_social_meta(document: &Html) -> SocialMeta {
    let property = |name: &str| {
        first_attr(document, &format!(r#"meta[property="{}"]"#, name), "content")
            .or_else(|| first_attr(document, &format!(r#"meta[name="{}"]"#, name), "content"))
    };

    SocialMeta {
        og_title: property("og:title"),
        og_description: property("og:description"),
        og_image: property("og:image"),
        og_url: property("og:url"),
        og_type: property("og:type"),
        twitter_card: property("twitter:card"),
        twitter_title: property("twitter:title"),
        twitter_description: property("twitter:description"),
        twitter_image: property("twitter:image"),
    }
}

fn extract_structured_data(document: &Html) -> StructuredData {
    let blocks = select_all(document, r#"script[type="application/ld+json"]"#);
    let mut types = Vec::new();

    for block in &blocks {
        let raw: String = block.text().collect();
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => collect_schema_types(&value, &mut types),
            Err(e) => debug!(error = %e, "Skipping malformed JSON-LD block"),
        }
    }

    let mut seen = HashSet::new();
    types.retain(|t| seen.insert(t.clone()));

    StructuredData {
        present: !blocks.is_empty(),
        blocks: blocks.len() as u32,
        types,
    }
}

fn collect_schema_types(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                collect_schema_types(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            match map.get("@type") {
                Some(serde_json::Value::String(t)) => out.push(t.clone()),
                Some(serde_json::Value::Array(ts)) => {
                    out.extend(ts.iter().filter_map(|t| t.as_str().map(String::from)))
                }
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_schema_types(graph, out);
            }
        }
        _ => {}
    }
}

fn compute_stats(document: &Html, html: &str, base: Option<&Url>) -> PageStats {
    let hrefs: Vec<&str> = select_all(document, "a[href]")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| !is_non_navigational(href))
        .collect();

    let (internal_links, external_links) = match base {
        Some(base) => hrefs
            .iter()
            .filter_map(|href| resolve_url(base, href.trim()).ok())
            .fold((0u32, 0u32), |(internal, external), url| {
                if same_origin(&url, base) {
                    (internal + 1, external)
                } else {
                    (internal, external + 1)
                }
            }),
        None => (0, hrefs.len() as u32),
    };

    let images = select_all(document, "img");
    let images_without_alt = images
        .iter()
        .filter(|img| img.value().attr("alt").is_none())
        .count() as u32;
    let scripts = count(document, "script[src]");

    let text = body_text(document);
    let words = word_count(&text);
    let text_bytes = text.split_whitespace().collect::<Vec<_>>().join(" ").len() as u64;
    let html_bytes = html.len() as u64;

    PageStats {
        total_links: hrefs.len() as u32,
        internal_links,
        external_links,
        images: images.len() as u32,
        images_without_alt,
        image_bytes: images.len() as u64 * MOCK_IMAGE_BYTES,
        scripts,
        script_bytes: scripts as u64 * MOCK_SCRIPT_BYTES,
        stylesheets: count(document, r#"link[rel="stylesheet"]"#),
        html_bytes,
        text_bytes,
        word_count: words,
        reading_time_minutes: words.div_ceil(WORDS_PER_MINUTE),
        text_rate: if html_bytes == 0 {
            0.0
        } else {
            ((text_bytes as f64 / html_bytes as f64) * 1000.0).round() / 1000.0
        },
    }
}

/// 元素是否有可被辅助技术读取的名称
fn has_accessible_name(element: ElementRef<'_>) -> bool {
    if !element_text(element).is_empty() {
        return true;
    }
    let value = element.value();
    let labelled = ["aria-label", "aria-labelledby", "title"]
        .iter()
        .any(|attr| value.attr(attr).is_some_and(|v| !v.trim().is_empty()));
    labelled
        || select_within(element, "img[alt]")
            .iter()
            .any(|img| img.value().attr("alt").is_some_and(|alt| !alt.trim().is_empty()))
}

fn accessibility_checks(
    document: &Html,
    meta: &PageMeta,
    stats: &PageStats,
    buttons_without_text: usize,
) -> Vec<Check> {
    let links_without_text = select_all(document, "a[href]")
        .into_iter()
        .filter(|a| !has_accessible_name(*a))
        .count();

    let mut ids = HashSet::new();
    let duplicate_ids: Vec<String> = select_all(document, "[id]")
        .into_iter()
        .filter_map(|el| el.value().attr("id"))
        .filter(|id| !ids.insert(*id))
        .map(str::to_string)
        .collect();

    let deprecated = count(document, "blink, marquee");

    let mut no_deprecated = Check::new("No deprecated elements", deprecated == 0);
    if deprecated > 0 {
        no_deprecated = no_deprecated.with_details(format!("{} deprecated elements", deprecated));
    }
    let mut unique_ids = Check::new("Unique ID attributes", duplicate_ids.is_empty());
    if !duplicate_ids.is_empty() {
        unique_ids = unique_ids.with_details(duplicate_ids.join(", "));
    }

    let mut checks = vec![
        Check::new("HTML lang attribute", meta.lang.is_some()),
        no_deprecated,
        Check::new("Images have alt text", stats.images_without_alt == 0),
        Check::new("Links have discernible text", links_without_text == 0),
        unique_ids,
        Check::new("Document has title", meta.title.is_some()),
    ];

    if buttons_without_text > 0 {
        checks.push(
            Check::new("Buttons without discernible text", false)
                .with_details(format!("{} buttons", buttons_without_text)),
        );
    }
    checks
}

fn indexability_checks(document: &Html, meta: &PageMeta) -> Vec<Check> {
    let head = select_first(document, "head");
    let invalid_head_children: Vec<String> = head
        .map(|head| {
            head.children()
                .filter_map(ElementRef::wrap)
                .map(|el| el.value().name().to_string())
                .filter(|name| !VALID_HEAD_ELEMENTS.contains(&name.as_str()))
                .collect()
        })
        .unwrap_or_default();

    let canonical_elements = canonical_links(document);
    let canonical_has_href = canonical_elements.iter().all(|link| {
        link.value()
            .attr("href")
            .is_some_and(|href| !href.trim().is_empty())
    });
    let canonical_valid = meta.canonical.as_deref().is_some_and(|c| {
        let lower = c.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    });
    let robots_block = meta.robots.as_deref().is_some_and(|r| {
        let r = r.to_ascii_lowercase();
        r.contains("noindex") || r.contains("none")
    });

    let mut valid_head = Check::new("Valid head elements", invalid_head_children.is_empty());
    if !invalid_head_children.is_empty() {
        valid_head = valid_head.with_details(invalid_head_children.join(", "));
    }

    let mut checks = vec![
        valid_head,
        Check::new("Canonical URL is valid", canonical_valid),
        Check::new("Canonical link has href", canonical_has_href),
        Check::new("Not blocked by meta robots", !robots_block),
    ];

    let noscript_in_head = head
        .map(|head| !select_within(head, "noscript").is_empty())
        .unwrap_or(false);
    if noscript_in_head {
        checks.push(Check::new("Noscript in head", false));
    }
    checks
}

fn seo_checks(
    document: &Html,
    meta: &PageMeta,
    h_tags: &HeadingTags,
    stats: &PageStats,
    social: &SocialMeta,
    structured_data: &StructuredData,
) -> Vec<Check> {
    let title_len = meta.title.as_deref().map(|t| t.chars().count()).unwrap_or(0);
    let insecure_links = count(document, r#"a[href^="http://"]"#);

    let body_html_len = select_first(document, "body")
        .map(|b| b.inner_html().len())
        .unwrap_or(0);
    let content_rate = if body_html_len == 0 {
        0.0
    } else {
        stats.text_bytes as f64 / body_html_len as f64
    };
    let render_blocking = stats.scripts + stats.stylesheets;

    let mut checks = vec![
        Check::new("Title Length", (10..=60).contains(&title_len))
            .with_details(format!("{} characters", title_len)),
        Check::new("Canonical Tag Present", meta.canonical.is_some()),
        Check::new("H1 Tag", h_tags.h1.len() == 1)
            .with_details(format!("{} H1 tags", h_tags.h1.len())),
        Check::new("Images Have Alt Text", stats.images_without_alt == 0),
        Check::new("No HTTPS to HTTP Links", insecure_links == 0),
        Check::new("Good Content Rate", content_rate > MIN_CONTENT_RATE)
            .with_details(format!("{:.2}", content_rate)),
        Check::new(
            "Minimal Render Blocking Resources",
            render_blocking <= MAX_RENDER_BLOCKING,
        )
        .with_details(format!("{} resources", render_blocking)),
        Check::new(
            "Social Media Tags Present",
            social.has_open_graph() || social.has_twitter(),
        ),
    ];

    if meta.meta_description.is_none() {
        checks.push(Check::new("Missing Description", false));
    }
    if !meta.has_favicon {
        checks.push(Check::new("No Favicon", false));
    }
    if !structured_data.present {
        checks.push(Check::new("Missing Structured Data", false));
    }
    checks
}

fn best_practice_checks(document: &Html, html: &str, meta: &PageMeta, url: &str) -> Vec<Check> {
    let https = url.to_ascii_lowercase().starts_with("https://");
    let doctype = html
        .trim_start()
        .get(..9)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<!doctype"));
    let mixed = if https {
        count(
            document,
            r#"img[src^="http://"], script[src^="http://"], iframe[src^="http://"], link[rel="stylesheet"][href^="http://"]"#,
        )
    } else {
        0
    };

    vec![
        Check::new("Uses HTTPS", https),
        Check::new("Has doctype", doctype),
        Check::new("Charset declared", meta.charset.is_some()),
        Check::new("Viewport meta tag", meta.viewport.is_some()),
        Check::new("No mixed content resources", mixed == 0),
    ]
}

fn issue(title: &str, severity: Severity, description: &str, recommendation: &str) -> Issue {
    Issue {
        title: title.to_string(),
        severity,
        description: description.to_string(),
        recommendation: recommendation.to_string(),
    }
}

fn collect_issues(
    meta: &PageMeta,
    h_tags: &HeadingTags,
    stats: &PageStats,
    structured_data: &StructuredData,
    buttons_without_text: usize,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    if meta.title.is_none() {
        issues.push(issue(
            "Missing Title Tag",
            Severity::High,
            "The page has no <title> element.",
            "Add a unique, descriptive title between 10 and 60 characters.",
        ));
    }
    if meta.meta_description.is_none() {
        issues.push(issue(
            "Missing Meta Description",
            Severity::Medium,
            "The page has no meta description.",
            "Add a compelling meta description of 120-160 characters.",
        ));
    }
    match h_tags.h1.len() {
        0 => issues.push(issue(
            "Missing H1 Heading",
            Severity::High,
            "The page has no H1 heading.",
            "Add a single H1 that describes the main topic of the page.",
        )),
        1 => {}
        n => issues.push(issue(
            "Multiple H1 Headings",
            Severity::Medium,
            &format!("The page has {} H1 headings.", n),
            "Keep exactly one H1 and demote the others to H2.",
        )),
    }
    if meta.is_noindex() {
        issues.push(issue(
            "Page Blocked From Indexing",
            Severity::High,
            "A meta robots tag prevents search engines from indexing this page.",
            "Remove the noindex directive if the page should appear in search results.",
        ));
    }
    if stats.images_without_alt > 0 {
        issues.push(issue(
            "Images Missing Alt Text",
            Severity::Medium,
            &format!("{} images have no alt attribute.", stats.images_without_alt),
            "Describe every meaningful image with an alt attribute.",
        ));
    }
    if meta.canonical.is_none() {
        issues.push(issue(
            "Missing Canonical Tag",
            Severity::Low,
            "The page does not declare a canonical URL.",
            "Add a <link rel=\"canonical\"> pointing at the preferred URL.",
        ));
    }
    if !meta.has_favicon {
        issues.push(issue(
            "Missing Favicon",
            Severity::Low,
            "No favicon link was found.",
            "Add a favicon so the site is recognizable in tabs and search results.",
        ));
    }
    if !structured_data.present {
        issues.push(issue(
            "Missing Structured Data",
            Severity::Medium,
            "No JSON-LD structured data was found.",
            "Add schema.org markup (Organization, Article, Product...) to qualify for rich results.",
        ));
    }
    if buttons_without_text > 0 {
        issues.push(issue(
            "Buttons Without Discernible Text",
            Severity::Medium,
            &format!("{} buttons have no accessible name.", buttons_without_text),
            "Give every button visible text or an aria-label.",
        ));
    }

    issues
}

#[cfg(test)]
#[path = "comprehensive_auditor_test.rs"]
mod tests;
