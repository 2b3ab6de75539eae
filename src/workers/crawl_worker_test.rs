use super::*;
use crate::config::settings::QuotaSettings;
use crate::domain::models::crawl_job::{CrawlParams, CANCELLED_REASON};
use crate::engines::traits::{EngineError, FetchResponse};
use crate::infrastructure::repositories::memory_usage_repo::MemoryUsageRepository;
use crate::infrastructure::stores::memory_crawl_store::MemoryCrawlStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

type FetchHook = Box<dyn Fn(&str) + Send + Sync>;

/// 预置页面的内存站点
#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, (u16, String)>,
    redirects: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
    on_fetch: Option<FetchHook>,
}

impl FakeSite {
    fn page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(url.to_string(), (status, body.to_string()));
        self
    }

    fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }
}

#[async_trait]
impl FetchEngine for FakeSite {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        self.fetched.lock().push(request.url.clone());
        if let Some(hook) = &self.on_fetch {
            hook(&request.url);
        }
        let target = self
            .redirects
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| request.url.clone());
        match self.pages.get(&target) {
            Some((status, body)) => Ok(FetchResponse {
                status_code: *status,
                content: body.clone(),
                content_type: "text/html".to_string(),
                final_url: target,
                response_time_ms: 1,
            }),
            None => Err(EngineError::Other("connection refused".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn page_html(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><h1>{}</h1><p>some words here</p>{}</body></html>",
        title, title, anchors
    )
}

fn quota() -> Arc<QuotaService> {
    Arc::new(QuotaService::new(
        Arc::new(MemoryUsageRepository::new()),
        QuotaSettings {
            audit_monthly_limit: 30,
            site_crawl_monthly_limit: 5,
        },
    ))
}

fn worker(store: Arc<MemoryCrawlStore>, site: Arc<FakeSite>, quota: Arc<QuotaService>) -> CrawlWorker {
    CrawlWorker::new(
        store,
        site,
        Arc::new(ComprehensiveAuditor::without_pagespeed()),
        quota,
        None,
        Duration::from_secs(5),
        Duration::from_secs(60),
    )
}

fn start(store: &MemoryCrawlStore, root: &str, max_pages: u32, max_depth: u32, owner: Option<&str>) -> Uuid {
    let id = Uuid::new_v4();
    store.init(
        id,
        CrawlParams {
            root_url: root.to_string(),
            max_pages,
            max_depth,
            owner_id: owner.map(str::to_string),
        },
    );
    id
}

fn three_page_site() -> FakeSite {
    FakeSite::default()
        .page("https://site.test/", 200, &page_html("Home", &["/a", "/b", "#top"]))
        .page("https://site.test/a", 200, &page_html("Page A", &["/", "/c"]))
        .page("https://site.test/b", 200, &page_html("Page B", &[]))
        .page("https://site.test/c", 200, &page_html("Page C", &[]))
}

#[tokio::test]
async fn test_depth_one_collects_root_and_direct_links() {
    let store = Arc::new(MemoryCrawlStore::new());
    let site = Arc::new(three_page_site());
    let id = start(&store, "https://site.test/", 10, 1, None);

    worker(store.clone(), site.clone(), quota()).run(id).await;

    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    let urls: Vec<_> = job.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, vec!["https://site.test/", "https://site.test/a", "https://site.test/b"]);
    assert!(job.pages[0].comprehensive.is_some());
    assert!(job.pages[1..].iter().all(|p| p.comprehensive.is_none()));
    assert_eq!(job.processed, 3);
    assert_eq!(job.queued, 0);

    let summary = job.summary.unwrap();
    assert_eq!(summary.total_pages, 3);
    assert_eq!(summary.error_pages, 0);
}

#[tokio::test]
async fn test_depth_zero_never_follows_links() {
    let store = Arc::new(MemoryCrawlStore::new());
    let site = Arc::new(three_page_site());
    let id = start(&store, "https://site.test/", 10, 0, None);

    worker(store.clone(), site.clone(), quota()).run(id).await;

    let job = store.get(id).unwrap();
    assert_eq!(job.pages.len(), 1);
    assert_eq!(site.fetched(), vec!["https://site.test/".to_string()]);
}

#[tokio::test]
async fn test_page_cap_bounds_results_without_duplicates() {
    let store = Arc::new(MemoryCrawlStore::new());
    let site = Arc::new(three_page_site());
    let id = start(&store, "https://site.test/", 2, 5, None);

    worker(store.clone(), site.clone(), quota()).run(id).await;

    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.pages.len(), 2);
    let unique: HashSet<_> = job.pages.iter().map(|p| p.url.clone()).collect();
    assert_eq!(unique.len(), job.pages.len());
    assert_eq!(site.fetched().len(), 2);
}

#[tokio::test]
async fn test_failed_pages_are_recorded_and_crawl_continues() {
    let store = Arc::new(MemoryCrawlStore::new());
    let site = Arc::new(
        FakeSite::default()
            .page(
                "https://site.test/",
                200,
                &page_html("Home", &["/missing", "/offline", "/ok"]),
            )
            .page("https://site.test/missing", 404, "not found")
            .page("https://site.test/ok", 200, &page_html("Ok", &[])),
    );
    let id = start(&store, "https://site.test/", 10, 1, None);

    worker(store.clone(), site, quota()).run(id).await;

    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.pages.len(), 4);

    let missing = &job.pages[1];
    assert_eq!(missing.status, Some(404));
    assert_eq!(missing.error.as_deref(), Some("HTTP 404"));
    assert!(missing.title.is_none());

    let offline = &job.pages[2];
    assert_eq!(offline.status, None);
    assert!(offline.error.as_deref().is_some_and(|e| !e.is_empty()));

    assert!(job.pages[3].is_audited());
    assert_eq!(job.summary.unwrap().error_pages, 2);
}

#[tokio::test]
async fn test_cancel_freezes_pages() {
    let store = Arc::new(MemoryCrawlStore::new());
    let id = start(&store, "https://site.test/", 10, 2, None);

    let cancel_store = store.clone();
    let mut site = three_page_site();
    site.on_fetch = Some(Box::new(move |url: &str| {
        if url == "https://site.test/a" {
            cancel_store.cancel(id);
        }
    }));
    let site = Arc::new(site);

    worker(store.clone(), site.clone(), quota()).run(id).await;

    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some(CANCELLED_REASON));
    assert!(job.cancelled);
    assert_eq!(job.pages.len(), 1);
    assert_eq!(site.fetched().len(), 2);
}

#[tokio::test]
async fn test_completed_crawl_counts_against_owner_quota() {
    let store = Arc::new(MemoryCrawlStore::new());
    let site = Arc::new(three_page_site());
    let quota = quota();
    let id = start(&store, "https://site.test/", 10, 0, Some("user-1"));

    worker(store.clone(), site, quota.clone()).run(id).await;

    let report = quota.usage_report("user-1").await.unwrap();
    assert_eq!(report.site_crawls.used, 1);
    assert_eq!(report.audits.used, 0);
}

#[tokio::test]
async fn test_unknown_job_is_a_no_op() {
    let store = Arc::new(MemoryCrawlStore::new());
    let site = Arc::new(three_page_site());

    worker(store.clone(), site.clone(), quota()).run(Uuid::new_v4()).await;

    assert!(store.is_empty());
    assert!(site.fetched().is_empty());
}

#[tokio::test]
async fn test_root_redirect_moves_crawl_to_final_origin() {
    let store = Arc::new(MemoryCrawlStore::new());
    let site = Arc::new(
        FakeSite::default()
            .redirect("https://site.test/", "https://www.site.test/")
            .page("https://www.site.test/", 200, &page_html("Home", &["/a", "https://site.test/b"]))
            .page("https://www.site.test/a", 200, &page_html("Page A", &["/"]))
            .page("https://site.test/b", 200, &page_html("Page B", &[])),
    );
    let id = start(&store, "https://site.test/", 10, 2, None);

    worker(store.clone(), site.clone(), quota()).run(id).await;

    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    let urls: Vec<_> = job.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, vec!["https://site.test/", "https://www.site.test/a"]);
    // The final root URL is never fetched a second time
    assert_eq!(
        site.fetched(),
        vec!["https://site.test/".to_string(), "https://www.site.test/a".to_string()]
    );
}

#[tokio::test]
async fn test_redirect_of_inner_page_does_not_change_origin() {
    let store = Arc::new(MemoryCrawlStore::new());
    let site = Arc::new(
        FakeSite::default()
            .page("https://site.test/", 200, &page_html("Home", &["/out"]))
            .redirect("https://site.test/out", "https://other.test/")
            .page("https://other.test/", 200, &page_html("Other", &["/x"])),
    );
    let id = start(&store, "https://site.test/", 10, 3, None);

    worker(store.clone(), site.clone(), quota()).run(id).await;

    // Links on the redirected page still resolve against the requested URL
    let job = store.get(id).unwrap();
    let urls: Vec<_> = job.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://site.test/", "https://site.test/out", "https://site.test/x"]
    );
    assert!(site.fetched().iter().all(|u| u.starts_with("https://site.test/")));
}

#[tokio::test]
async fn test_stalled_crawl_is_not_charged() {
    let store = Arc::new(MemoryCrawlStore::new());
    let quota = quota();
    let id = start(&store, "https://site.test/", 10, 2, Some("user-1"));

    let stall_store = store.clone();
    let mut site = three_page_site();
    site.on_fetch = Some(Box::new(move |url: &str| {
        if url == "https://site.test/a" {
            stall_store.fail(id, "Crawl stalled: no progress for 120 seconds");
        }
    }));

    worker(store.clone(), Arc::new(site), quota.clone()).run(id).await;

    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(!job.cancelled);
    assert_eq!(quota.usage_report("user-1").await.unwrap().site_crawls.used, 0);
}

#[tokio::test]
async fn test_cancelled_crawl_is_still_charged() {
    let store = Arc::new(MemoryCrawlStore::new());
    let quota = quota();
    let id = start(&store, "https://site.test/", 10, 2, Some("user-1"));

    let cancel_store = store.clone();
    let mut site = three_page_site();
    site.on_fetch = Some(Box::new(move |url: &str| {
        if url == "https://site.test/a" {
            cancel_store.cancel(id);
        }
    }));

    worker(store.clone(), Arc::new(site), quota.clone()).run(id).await;

    assert_eq!(quota.usage_report("user-1").await.unwrap().site_crawls.used, 1);
}
