use super::*;
use crate::config::settings::QuotaSettings;
use crate::domain::models::audit_report::MetricsSource;
use crate::domain::services::pagespeed::{PageSpeedError, PageSpeedProvider, PerformanceReport, Strategy};
use crate::engines::traits::{EngineError, FetchResponse};
use crate::infrastructure::repositories::memory_usage_repo::MemoryUsageRepository;
use crate::infrastructure::stores::memory_audit_store::MemoryAuditStore;
use async_trait::async_trait;
use parking_lot::Mutex;

const PAGE: &str = r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8">
<title>Example Domain Home</title><meta name="description" content="An example page">
</head><body><h1>Example</h1><p>Some body text for the audit.</p></body></html>"#;

/// 固定响应的抓取引擎，可记录抓取时任务所处的阶段
struct StubEngine {
    status: u16,
    delay: Option<Duration>,
    store: Arc<MemoryAuditStore>,
    job_id: Uuid,
    seen_stage: Mutex<Option<(AuditStage, u8)>>,
}

impl StubEngine {
    fn new(status: u16, store: Arc<MemoryAuditStore>, job_id: Uuid) -> Self {
        Self {
            status,
            delay: None,
            store,
            job_id,
            seen_stage: Mutex::new(None),
        }
    }
}

#[async_trait]
impl FetchEngine for StubEngine {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        if let Some(job) = self.store.get(self.job_id) {
            *self.seen_stage.lock() = Some((job.stage, job.progress));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(FetchResponse {
            status_code: self.status,
            content: PAGE.to_string(),
            content_type: "text/html".to_string(),
            final_url: request.url.clone(),
            response_time_ms: 3,
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
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

fn worker(
    store: Arc<MemoryAuditStore>,
    engine: Arc<StubEngine>,
    quota: Arc<QuotaService>,
    timeout: Duration,
) -> AuditWorker {
    AuditWorker::new(
        store,
        engine,
        Arc::new(ComprehensiveAuditor::without_pagespeed()),
        quota,
        None,
        Duration::from_secs(5),
        timeout,
    )
}

/// 长时间无响应后报超时的性能服务
struct SlowPageSpeed;

#[async_trait]
impl PageSpeedProvider for SlowPageSpeed {
    async fn analyze(
        &self,
        _url: &str,
        _strategy: Strategy,
    ) -> Result<PerformanceReport, PageSpeedError> {
        tokio::time::sleep(Duration::from_millis(61_500)).await;
        Err(PageSpeedError::Timeout)
    }
}

fn request(owner: Option<&str>) -> AuditRequest {
    AuditRequest {
        url: "https://example.com/".to_string(),
        keyword: Some("example".to_string()),
        email: None,
        owner_id: owner.map(str::to_string),
    }
}

#[tokio::test]
async fn test_successful_audit_completes_and_counts_quota() {
    let store = Arc::new(MemoryAuditStore::new());
    let id = Uuid::new_v4();
    let engine = Arc::new(StubEngine::new(200, store.clone(), id));
    let quota = quota();
    store.init(id, "https://example.com/".to_string(), Some("user-1".to_string()));

    worker(store.clone(), engine.clone(), quota.clone(), Duration::from_secs(30))
        .run(id, request(Some("user-1")))
        .await;

    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.stage, AuditStage::Completed);
    assert_eq!(job.progress, 100);
    let result = job.result.unwrap();
    assert_eq!(result.url, "https://example.com/");
    assert_eq!(result.keyword.as_deref(), Some("example"));
    assert_eq!(result.overall_score, result.comprehensive.scores.overall);

    assert_eq!(*engine.seen_stage.lock(), Some((AuditStage::Fetching, 10)));
    assert_eq!(quota.usage_report("user-1").await.unwrap().audits.used, 1);
}

#[tokio::test]
async fn test_non_success_fetch_fails_without_quota() {
    let store = Arc::new(MemoryAuditStore::new());
    let id = Uuid::new_v4();
    let engine = Arc::new(StubEngine::new(503, store.clone(), id));
    let quota = quota();
    store.init(id, "https://example.com/".to_string(), Some("user-1".to_string()));

    worker(store.clone(), engine, quota.clone(), Duration::from_secs(30))
        .run(id, request(Some("user-1")))
        .await;

    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.stage, AuditStage::Failed);
    assert_eq!(job.error.as_deref(), Some("Failed to fetch page: HTTP 503"));
    assert_eq!(quota.usage_report("user-1").await.unwrap().audits.used, 0);
}

#[tokio::test(start_paused = true)]
async fn test_wall_clock_budget_fails_slow_audit() {
    let store = Arc::new(MemoryAuditStore::new());
    let id = Uuid::new_v4();
    let mut engine = StubEngine::new(200, store.clone(), id);
    engine.delay = Some(Duration::from_secs(120));
    store.init(id, "https://example.com/".to_string(), None);

    worker(store.clone(), Arc::new(engine), quota(), Duration::from_secs(45))
        .run(id, request(None))
        .await;

    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some(AUDIT_TIMEOUT_MESSAGE));
    assert!(job.result.is_none());
}

#[tokio::test]
async fn test_invalid_url_fails_job() {
    let store = Arc::new(MemoryAuditStore::new());
    let id = Uuid::new_v4();
    let engine = Arc::new(StubEngine::new(200, store.clone(), id));
    store.init(id, "not a url".to_string(), None);

    let mut bad = request(None);
    bad.url = "not a url".to_string();
    worker(store.clone(), engine, quota(), Duration::from_secs(30))
        .run(id, bad)
        .await;

    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().starts_with("Invalid URL"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_pagespeed_falls_back_within_audit_budget() {
    let store = Arc::new(MemoryAuditStore::new());
    let id = Uuid::new_v4();
    let mut engine = StubEngine::new(200, store.clone(), id);
    engine.delay = Some(Duration::from_secs(10));
    let quota = quota();
    store.init(id, "https://example.com/".to_string(), Some("user-1".to_string()));

    let auditor = ComprehensiveAuditor::new(Some(Arc::new(SlowPageSpeed)), Strategy::Mobile);
    let worker = AuditWorker::new(
        store.clone(),
        Arc::new(engine),
        Arc::new(auditor),
        quota.clone(),
        None,
        Duration::from_secs(15),
        Duration::from_secs(45),
    );
    let started = tokio::time::Instant::now();
    worker.run(id, request(Some("user-1"))).await;

    assert!(started.elapsed() < Duration::from_secs(45));
    let job = store.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    let result = job.result.unwrap();
    assert_eq!(result.comprehensive.performance_source, MetricsSource::Fallback);
    assert_eq!(result.comprehensive.scores.performance, 70);
    assert_eq!(quota.usage_report("user-1").await.unwrap().audits.used, 1);
}
