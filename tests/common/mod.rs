// tests/common/mod.rs
//
// Shared fixtures: an in-memory research backend for page/router tests and a
// real HTTP mock backend (axum on an ephemeral port) for client tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};

use research_desk::models::{
    CollectionStats, Paper, PaperFilterParams, ProcessingStats, ResearchBrief, SchedulerAck,
    SearchQuery, SystemStatus,
};
use research_desk::{DynResearchApi, ResearchApi};

pub fn paper(id: &str, title: &str) -> Paper {
    serde_json::from_value(json!({
        "id": id,
        "title": title,
        "abstract": format!("Abstract of {title}"),
        "authors": ["Ada Lovelace", "Grace Hopper"],
        "url": format!("https://example.org/{id}"),
        "published_date": "2024-03-05",
        "source": "arxiv",
        "categories": ["q-fin.GN"],
    }))
    .expect("paper fixture")
}

pub fn status(running: bool) -> SystemStatus {
    serde_json::from_value(json!({
        "running": running,
        "last_collection": "2024-05-01T10:00:00",
        "last_processing": null,
        "collection_stats": { "arxiv": 4, "ssrn": 1, "total": 5 },
        "processing_stats": {}
    }))
    .expect("status fixture")
}

pub fn brief(query: &str) -> ResearchBrief {
    serde_json::from_value(json!({
        "query": query,
        "papers": [{ "title": "Carbon Pricing", "authors": ["A. Author"], "summary": "s", "key_findings": [], "url": "" }],
        "brief": "Summary: carbon pricing works.",
        "timestamp": "2024-05-01T10:00:00"
    }))
    .expect("brief fixture")
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

type Canned<T> = Mutex<std::result::Result<T, String>>;

fn canned<T: Clone>(slot: &Canned<T>) -> Result<T> {
    slot.lock().unwrap().clone().map_err(|e| anyhow!(e))
}

/// Canned responses per operation plus a call log.
pub struct FakeResearchApi {
    pub status: Canned<SystemStatus>,
    pub papers: Canned<Vec<Paper>>,
    pub paper: Canned<Paper>,
    pub search: Canned<Vec<Paper>>,
    pub brief: Canned<ResearchBrief>,
    pub scheduler: Canned<SchedulerAck>,
    pub collect: Canned<CollectionStats>,
    pub process: Canned<ProcessingStats>,
    /// Extra latency for collect/process, in milliseconds.
    pub control_delay_ms: AtomicU64,
    calls: Mutex<Vec<String>>,
    last_filter: Mutex<Option<PaperFilterParams>>,
    last_search: Mutex<Option<SearchQuery>>,
    last_process_limit: Mutex<Option<u32>>,
}

impl Default for FakeResearchApi {
    fn default() -> Self {
        Self {
            status: Mutex::new(Ok(status(false))),
            papers: Mutex::new(Ok(vec![
                paper("p1", "Green Bonds and Yield Spreads"),
                paper("p2", "Climate Risk in Bank Portfolios"),
            ])),
            paper: Mutex::new(Ok(paper("deep", "Deep Linked Paper"))),
            search: Mutex::new(Ok(vec![paper("s1", "Carbon Pricing Under Uncertainty")])),
            brief: Mutex::new(Ok(brief("carbon"))),
            scheduler: Mutex::new(Ok(SchedulerAck { success: true })),
            collect: Mutex::new(Ok(CollectionStats::default())),
            process: Mutex::new(Ok(ProcessingStats::default())),
            control_delay_ms: AtomicU64::new(0),
            calls: Mutex::new(Vec::new()),
            last_filter: Mutex::new(None),
            last_search: Mutex::new(None),
            last_process_limit: Mutex::new(None),
        }
    }
}

impl FakeResearchApi {
    pub fn shared(self) -> (Arc<Self>, DynResearchApi) {
        let fake = Arc::new(self);
        let dyn_api: DynResearchApi = fake.clone();
        (fake, dyn_api)
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == op).count()
    }

    pub fn last_filter(&self) -> Option<PaperFilterParams> {
        self.last_filter.lock().unwrap().clone()
    }

    pub fn last_search(&self) -> Option<SearchQuery> {
        self.last_search.lock().unwrap().clone()
    }

    pub fn last_process_limit(&self) -> Option<u32> {
        *self.last_process_limit.lock().unwrap()
    }

    fn hit(&self, op: &str) {
        self.calls.lock().unwrap().push(op.to_string());
    }

    async fn control_latency(&self) {
        let ms = self.control_delay_ms.load(Ordering::Relaxed);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl ResearchApi for FakeResearchApi {
    async fn status(&self) -> Result<SystemStatus> {
        self.hit("status");
        canned(&self.status)
    }

    async fn start_scheduler(&self) -> Result<SchedulerAck> {
        self.hit("start_scheduler");
        canned(&self.scheduler)
    }

    async fn stop_scheduler(&self) -> Result<SchedulerAck> {
        self.hit("stop_scheduler");
        canned(&self.scheduler)
    }

    async fn papers(&self, params: &PaperFilterParams) -> Result<Vec<Paper>> {
        self.hit("papers");
        *self.last_filter.lock().unwrap() = Some(params.clone());
        canned(&self.papers)
    }

    async fn paper(&self, _id: &str) -> Result<Paper> {
        self.hit("paper");
        canned(&self.paper)
    }

    async fn collect(&self) -> Result<CollectionStats> {
        self.hit("collect");
        self.control_latency().await;
        canned(&self.collect)
    }

    async fn process(&self, limit: u32) -> Result<ProcessingStats> {
        self.hit("process");
        *self.last_process_limit.lock().unwrap() = Some(limit);
        self.control_latency().await;
        canned(&self.process)
    }

    async fn brief(&self, _query: &str) -> Result<ResearchBrief> {
        self.hit("brief");
        canned(&self.brief)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>> {
        self.hit("search");
        *self.last_search.lock().unwrap() = Some(query.clone());
        canned(&self.search)
    }
}

// ---------------------------------------------------------------------------
// HTTP mock backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct MockState {
    log: Arc<Mutex<Vec<Recorded>>>,
    fail: bool,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub base_url: String,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("mock backend saw no request")
    }
}

/// Serves canned backend JSON under `/api`. With `fail` every call is a 500.
pub async fn spawn_mock_backend(fail: bool) -> MockBackend {
    let log = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        log: log.clone(),
        fail,
    };
    let app = Router::new().fallback(answer).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend");
    });

    MockBackend {
        addr,
        base_url: format!("http://{addr}/api"),
        log,
    }
}

async fn answer(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.log.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    if state.fail {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let path = uri.path().trim_start_matches("/api");
    let payload: Value = match path {
        "/status" => json!({
            "running": true,
            "last_collection": "2024-05-01T10:00:00",
            "last_processing": null,
            "collection_stats": {},
            "processing_stats": { "summarized": 3, "embedded": 3, "errors": 0 }
        }),
        "/scheduler/start" | "/scheduler/stop" => json!({ "success": true }),
        "/papers" => json!([{ "id": "p1", "title": "Green Bonds", "authors": "A. Author, B. Author" }]),
        "/collect" => json!({ "arxiv": 2, "ssrn": 1, "total": 3, "timestamp": "2024-05-01T10:00:00" }),
        "/process" => json!({ "summarized": 2, "embedded": 2, "errors": 0 }),
        "/brief" => json!({
            "query": "nothing matches",
            "timestamp": "2024-05-01T10:00:00",
            "message": "No relevant papers found for this query."
        }),
        "/search" => json!([{ "id": "s1", "title": "Carbon Pricing", "similarity": 0.873 }]),
        p if p.starts_with("/paper/") => json!({ "id": "x", "title": "By Id" }),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(payload).into_response()
}
