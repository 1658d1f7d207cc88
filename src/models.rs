// src/models.rs
//! Records exchanged with the research backend. They are plain snapshots:
//! decoded verbatim, replaced on the next fetch, never mutated in place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A list of strings the backend sometimes sends as a single raw string
/// (it falls back to the stored text when its own JSON decoding fails).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextList {
    Many(Vec<String>),
    One(String),
}

impl Default for TextList {
    fn default() -> Self {
        TextList::Many(Vec::new())
    }
}

impl TextList {
    /// Sequence joined with ", "; a single string comes back unchanged.
    pub fn joined(&self) -> String {
        match self {
            TextList::Many(items) => items.join(", "),
            TextList::One(raw) => raw.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TextList::Many(items) => items.is_empty(),
            TextList::One(raw) => raw.is_empty(),
        }
    }
}

impl From<Vec<String>> for TextList {
    fn from(v: Vec<String>) -> Self {
        TextList::Many(v)
    }
}

impl From<&str> for TextList {
    fn from(s: &str) -> Self {
        TextList::One(s.to_string())
    }
}

impl fmt::Display for TextList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub r#abstract: String,
    #[serde(default)]
    pub authors: TextList,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pdf_url: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub categories: TextList,
    #[serde(default)]
    pub retrieved_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<PaperSummary>,
    /// Cosine similarity in 0..=1, only present on search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub id: i64,
    pub paper_id: String,
    #[serde(default)]
    pub summary: String,
    /// 0..=100 by contract; rendered as-is.
    #[serde(default)]
    pub esg_relevance_score: f64,
    #[serde(default)]
    pub finance_relevance_score: f64,
    #[serde(default)]
    pub key_findings: TextList,
    #[serde(default)]
    pub keywords: TextList,
    #[serde(default)]
    pub created_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperInfo {
    pub title: String,
    #[serde(default)]
    pub authors: TextList,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_findings: TextList,
    #[serde(default)]
    pub url: String,
}

/// A generated brief. When nothing matched the backend sends only
/// `{query, timestamp, message}`; on failure `{query, timestamp, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchBrief {
    pub query: String,
    #[serde(default)]
    pub papers: Vec<PaperInfo>,
    #[serde(default)]
    pub brief: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// Stats blocks arrive as `{}` until the first run, hence all the Options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    #[serde(default)]
    pub arxiv: Option<u64>,
    #[serde(default)]
    pub ssrn: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectionStats {
    pub fn has_counters(&self) -> bool {
        self.arxiv.is_some() || self.ssrn.is_some() || self.total.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    #[serde(default)]
    pub summarized: Option<u64>,
    #[serde(default)]
    pub embedded: Option<u64>,
    #[serde(default)]
    pub errors: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingStats {
    pub fn has_counters(&self) -> bool {
        self.summarized.is_some() || self.embedded.is_some() || self.errors.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub running: bool,
    #[serde(default)]
    pub last_collection: Option<String>,
    #[serde(default)]
    pub last_processing: Option<String>,
    #[serde(default)]
    pub collection_stats: CollectionStats,
    #[serde(default)]
    pub processing_stats: ProcessingStats,
}

/// Body of `/scheduler/start` and `/scheduler/stop` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerAck {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

fn default_limit() -> u32 {
    10
}

/// Filter/pagination parameters for the default paper list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperFilterParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

impl Default for PaperFilterParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
            category: None,
            query: None,
        }
    }
}

impl PaperFilterParams {
    /// Query-string pairs, skipping zero and empty values.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::with_capacity(4);
        if self.limit > 0 {
            out.push(("limit", self.limit.to_string()));
        }
        if self.offset > 0 {
            out.push(("offset", self.offset.to_string()));
        }
        if let Some(c) = self.category.as_deref().filter(|c| !c.is_empty()) {
            out.push(("category", c.to_string()));
        }
        if let Some(q) = self.query.as_deref().filter(|q| !q.is_empty()) {
            out.push(("query", q.to_string()));
        }
        out
    }

    pub fn next_page(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            ..self.clone()
        }
    }

    pub fn previous_page(&self) -> Self {
        Self {
            offset: self.offset.saturating_sub(self.limit),
            ..self.clone()
        }
    }
}
