// src/client.rs
//! Research backend client: provider abstraction + the reqwest implementation.
//!
//! One call is one HTTP request. There are no retries, timeouts or caches here;
//! a non-2xx answer becomes `"Failed to <op>: <status text>"` and the body of
//! the failed response is not inspected.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::models::{
    CollectionStats, Paper, PaperFilterParams, ProcessingStats, ResearchBrief, SchedulerAck,
    SearchQuery, SystemStatus,
};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_PROCESS_LIMIT: u32 = 10;

/// Everything the desk needs from the research backend.
#[async_trait]
pub trait ResearchApi: Send + Sync {
    async fn status(&self) -> Result<SystemStatus>;
    async fn start_scheduler(&self) -> Result<SchedulerAck>;
    async fn stop_scheduler(&self) -> Result<SchedulerAck>;
    async fn papers(&self, params: &PaperFilterParams) -> Result<Vec<Paper>>;
    async fn paper(&self, id: &str) -> Result<Paper>;
    async fn collect(&self) -> Result<CollectionStats>;
    async fn process(&self, limit: u32) -> Result<ProcessingStats>;
    async fn brief(&self, query: &str) -> Result<ResearchBrief>;
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>>;
}

/// Convenient alias used by the page and the router.
pub type DynResearchApi = Arc<dyn ResearchApi>;

#[derive(Clone, Copy)]
struct Op {
    name: &'static str,
    what: &'static str,
}

const STATUS: Op = Op { name: "status", what: "get system status" };
const START: Op = Op { name: "scheduler_start", what: "start scheduler" };
const STOP: Op = Op { name: "scheduler_stop", what: "stop scheduler" };
const PAPERS: Op = Op { name: "papers", what: "get papers" };
const PAPER: Op = Op { name: "paper", what: "get paper" };
const COLLECT: Op = Op { name: "collect", what: "collect papers" };
const PROCESS: Op = Op { name: "process", what: "process papers" };
const BRIEF: Op = Op { name: "brief", what: "generate brief" };
const SEARCH: Op = Op { name: "search", what: "search papers" };

pub struct HttpResearchApi {
    http: reqwest::Client,
    base: Url,
}

impl HttpResearchApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("research-desk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building reqwest client")?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("invalid research API base URL: {base_url}"))?;
        if base.cannot_be_a_base() {
            bail!("research API base URL cannot carry a path: {base_url}");
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("research API base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, op: Op, req: RequestBuilder) -> Result<T> {
        let t0 = Instant::now();
        let res = dispatch(op, req).await;
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        crate::metrics::record_api_call(op.name, res.is_ok(), ms);
        match &res {
            Ok(_) => debug!(target: "desk::client", op = op.name, ms, "backend call ok"),
            Err(e) => warn!(target: "desk::client", op = op.name, ms, error = %format!("{e:#}"), "backend call failed"),
        }
        res
    }

    fn get(&self, segments: &[&str]) -> Result<RequestBuilder> {
        Ok(self.http.get(self.endpoint(segments)?))
    }

    fn post(&self, segments: &[&str]) -> Result<RequestBuilder> {
        Ok(self
            .http
            .post(self.endpoint(segments)?)
            .header(CONTENT_TYPE, "application/json"))
    }
}

async fn dispatch<T: DeserializeOwned>(op: Op, req: RequestBuilder) -> Result<T> {
    let resp = req
        .send()
        .await
        .with_context(|| format!("Failed to {}", op.what))?;
    let status = resp.status();
    if !status.is_success() {
        let text = status.canonical_reason().unwrap_or(status.as_str());
        bail!("Failed to {}: {}", op.what, text);
    }
    resp.json::<T>()
        .await
        .with_context(|| format!("Failed to {}: invalid response body", op.what))
}

#[async_trait]
impl ResearchApi for HttpResearchApi {
    async fn status(&self) -> Result<SystemStatus> {
        self.send(STATUS, self.get(&["status"])?).await
    }

    async fn start_scheduler(&self) -> Result<SchedulerAck> {
        self.send(START, self.post(&["scheduler", "start"])?).await
    }

    async fn stop_scheduler(&self) -> Result<SchedulerAck> {
        self.send(STOP, self.post(&["scheduler", "stop"])?).await
    }

    async fn papers(&self, params: &PaperFilterParams) -> Result<Vec<Paper>> {
        let req = self.get(&["papers"])?.query(&params.query_pairs());
        self.send(PAPERS, req).await
    }

    async fn paper(&self, id: &str) -> Result<Paper> {
        self.send(PAPER, self.get(&["paper", id])?).await
    }

    async fn collect(&self) -> Result<CollectionStats> {
        self.send(COLLECT, self.post(&["collect"])?).await
    }

    async fn process(&self, limit: u32) -> Result<ProcessingStats> {
        let req = self.post(&["process"])?.json(&json!({ "limit": limit }));
        self.send(PROCESS, req).await
    }

    async fn brief(&self, query: &str) -> Result<ResearchBrief> {
        let req = self.post(&["brief"])?.json(&json!({ "query": query }));
        self.send(BRIEF, req).await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>> {
        let req = self.post(&["search"])?.json(query);
        self.send(SEARCH, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_segments_to_base_path() {
        let api = HttpResearchApi::new("http://localhost:5000/api/").unwrap();
        let url = api.endpoint(&["scheduler", "start"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/scheduler/start");
    }

    #[test]
    fn endpoint_percent_encodes_paper_ids() {
        let api = HttpResearchApi::new(DEFAULT_API_BASE_URL).unwrap();
        let url = api.endpoint(&["paper", "ssrn/123 45"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/paper/ssrn%2F123%2045");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(HttpResearchApi::new("not a url").is_err());
        assert!(HttpResearchApi::new("mailto:desk@example.com").is_err());
    }
}
