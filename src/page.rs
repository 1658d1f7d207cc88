// src/page.rs
//! The home page: view state, the hooks that feed it, and the handlers the
//! router maps user interactions onto.
//!
//! One `HomePage` is one view session. Handlers never return errors; failed
//! backend calls land in the owning hook and surface through [`HomePage::error`].

use std::fmt::Write as _;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::client::DynResearchApi;
use crate::components::paper_card::{render_paper_card, CardOptions};
use crate::components::{render_brief, ControlAction, SearchBar, StatusControls};
use crate::config::DeskConfig;
use crate::fetch::{FetchFuture, Mutation, Query};
use crate::format::{attr, text};
use crate::models::{Paper, PaperFilterParams, ResearchBrief, SearchQuery, SystemStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSettings {
    pub page_size: u32,
    pub search_limit: u32,
    pub process_limit: u32,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self::from(&DeskConfig::default())
    }
}

impl From<&DeskConfig> for PageSettings {
    fn from(cfg: &DeskConfig) -> Self {
        Self {
            page_size: cfg.page_size,
            search_limit: cfg.search_limit,
            process_limit: cfg.process_limit,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PageView {
    search_query: String,
    filter: PaperFilterParams,
    selected: Option<Paper>,
    brief: Option<ResearchBrief>,
}

pub struct HomePage {
    view: RwLock<PageView>,
    status: Query<SystemStatus, ()>,
    papers: Query<Vec<Paper>, PaperFilterParams>,
    search: Mutation<String, Vec<Paper>>,
    brief: Mutation<String, ResearchBrief>,
    detail: Mutation<String, Paper>,
    controls: StatusControls,
}

impl HomePage {
    pub fn new(api: DynResearchApi, settings: PageSettings) -> Self {
        let status = {
            let api = api.clone();
            Query::new("status", None, move |_: ()| {
                let api = api.clone();
                Box::pin(async move { api.status().await }) as FetchFuture<SystemStatus>
            })
        };
        let papers = {
            let api = api.clone();
            Query::new("papers", Some(Vec::new()), move |params: PaperFilterParams| {
                let api = api.clone();
                Box::pin(async move { api.papers(&params).await }) as FetchFuture<Vec<Paper>>
            })
        };
        let search = {
            let api = api.clone();
            let limit = settings.search_limit;
            Mutation::new("search", move |query: String| {
                let api = api.clone();
                Box::pin(async move {
                    api.search(&SearchQuery {
                        query,
                        limit: Some(limit),
                    })
                    .await
                }) as FetchFuture<Vec<Paper>>
            })
        };
        let brief = {
            let api = api.clone();
            Mutation::new("brief", move |query: String| {
                let api = api.clone();
                Box::pin(async move { api.brief(&query).await }) as FetchFuture<ResearchBrief>
            })
        };
        let detail = {
            let api = api.clone();
            Mutation::new("paper", move |id: String| {
                let api = api.clone();
                Box::pin(async move { api.paper(&id).await }) as FetchFuture<Paper>
            })
        };
        let controls = StatusControls::new(api, settings.process_limit);

        let view = PageView {
            filter: PaperFilterParams {
                limit: settings.page_size,
                ..Default::default()
            },
            ..Default::default()
        };

        Self {
            view: RwLock::new(view),
            status,
            papers,
            search,
            brief,
            detail,
            controls,
        }
    }

    fn view(&self) -> RwLockReadGuard<'_, PageView> {
        self.view.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn view_mut(&self) -> RwLockWriteGuard<'_, PageView> {
        self.view.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------

    /// Status is fetched once; the list on first mount and whenever the
    /// filter params changed since the last sync.
    pub async fn mount(&self) {
        let filter = self.filter();
        let (status_fetched, papers_fetched) =
            tokio::join!(self.status.sync(()), self.papers.sync(filter));
        if status_fetched || papers_fetched {
            debug!(target: "desk::page", status_fetched, papers_fetched, "mount synced");
        }
    }

    /// A full page load. Status is pulled again every time; the list is
    /// refetched only when its last fetch failed. Interaction handlers use
    /// [`HomePage::mount`] instead so select/close never refetch.
    pub async fn reload(&self) {
        let filter = self.filter();
        let status = async {
            if !self.status.sync(()).await {
                self.status.refetch().await;
            }
        };
        let papers = async {
            if !self.papers.sync(filter).await && self.papers.snapshot().error.is_some() {
                debug!(target: "desk::page", "last list fetch failed, retrying");
                self.papers.refetch().await;
            }
        };
        tokio::join!(status, papers);
    }

    /// Returns whether the search succeeded. A successful search closes the brief.
    pub async fn search(&self, query: String) -> bool {
        self.view_mut().search_query = query.clone();
        info!(target: "desk::page", query_len = query.len(), "search");
        if self.search.mutate(query).await.is_some() {
            self.view_mut().brief = None;
            true
        } else {
            false
        }
    }

    /// Returns whether a brief arrived; the caller then scrolls to the top.
    pub async fn generate_brief(&self, query: String) -> bool {
        self.view_mut().search_query = query.clone();
        info!(target: "desk::page", query_len = query.len(), "generate brief");
        match self.brief.mutate(query).await {
            Some(brief) => {
                self.view_mut().brief = Some(brief);
                true
            }
            None => false,
        }
    }

    /// Opens the detail view. Papers in the displayed list are taken as-is;
    /// anything else (a deep link) is fetched by id.
    pub async fn select_paper(&self, id: &str) -> bool {
        if let Some(paper) = self.displayed_papers().into_iter().find(|p| p.id == id) {
            self.detail.reset();
            self.view_mut().selected = Some(paper);
            return true;
        }
        debug!(target: "desk::page", id, "paper not in list, fetching");
        match self.detail.mutate(id.to_string()).await {
            Some(paper) => {
                self.view_mut().selected = Some(paper);
                true
            }
            None => false,
        }
    }

    /// Also drops a failed deep-link fetch so its error stops showing.
    pub fn close_detail(&self) {
        self.detail.reset();
        self.view_mut().selected = None;
    }

    pub fn close_brief(&self) {
        self.view_mut().brief = None;
    }

    /// Drops search results so the default list shows again.
    pub fn clear_search(&self) {
        self.search.reset();
        self.view_mut().search_query.clear();
    }

    pub async fn set_filter(&self, params: PaperFilterParams) {
        self.view_mut().filter = params.clone();
        self.papers.sync(params).await;
    }

    /// Status panel trigger; the status is re-pulled afterwards either way.
    pub async fn run_control(&self, action: ControlAction) -> bool {
        let Some(running) = self.status.snapshot().data.map(|s| s.running) else {
            debug!(target: "desk::page", action = action.name(), "status not loaded, ignoring control");
            return false;
        };
        self.controls
            .run(action, running, move || async move {
                self.status.refetch().await;
            })
            .await
    }

    // ------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------

    pub fn filter(&self) -> PaperFilterParams {
        self.view().filter.clone()
    }

    pub fn search_query(&self) -> String {
        self.view().search_query.clone()
    }

    pub fn selected(&self) -> Option<Paper> {
        self.view().selected.clone()
    }

    pub fn active_brief(&self) -> Option<ResearchBrief> {
        self.view().brief.clone()
    }

    pub fn status(&self) -> Option<SystemStatus> {
        self.status.snapshot().data
    }

    pub fn controls(&self) -> &StatusControls {
        &self.controls
    }

    pub fn showing_search_results(&self) -> bool {
        self.search.data().is_some()
    }

    /// Search results win over the default list.
    pub fn displayed_papers(&self) -> Vec<Paper> {
        self.search
            .data()
            .or_else(|| self.papers.snapshot().data)
            .unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.papers.snapshot().loading || self.search.is_loading() || self.brief.is_loading()
    }

    /// First non-empty error among list, search, brief and detail.
    pub fn error(&self) -> Option<String> {
        [
            self.papers.snapshot().error,
            self.search.error(),
            self.brief.error(),
            self.detail.error(),
        ]
        .into_iter()
        .flatten()
        .find(|e| !e.is_empty())
    }

    pub fn search_bar(&self) -> SearchBar {
        SearchBar::new(self.search_query(), self.is_loading())
    }

    // ------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------

    pub fn render(&self) -> String {
        let mut body = String::with_capacity(16 * 1024);

        body.push_str(
            r#"<header id="top"><h1>ESG &amp; Finance AI Research Assistant</h1><p>Automated research paper collection, analysis, and insight generation</p></header>"#,
        );

        if let Some(status) = self.status() {
            body.push_str(&self.controls.render(&status));
        }

        body.push_str(&self.search_bar().render());

        if let Some(err) = self.error() {
            let _ = write!(
                body,
                r#"<div class="notice error banner"><strong>Error: </strong>{}</div>"#,
                text(&err)
            );
        }

        if let Some(brief) = self.active_brief() {
            body.push_str(&render_brief(&brief));
        }

        match self.selected() {
            Some(paper) => {
                body.push_str(
                    r#"<div class="detail"><form method="post" action="/detail/close"><button type="submit" class="link">&larr; Back to results</button></form>"#,
                );
                body.push_str(&render_paper_card(
                    &paper,
                    CardOptions {
                        selectable: false,
                        show_summary: true,
                    },
                ));
                body.push_str("</div>");
            }
            None => self.push_list(&mut body),
        }

        render_document(&body)
    }

    fn push_list(&self, body: &mut String) {
        let papers = self.displayed_papers();
        let searching = self.showing_search_results();
        let query = self.search_query();

        body.push_str(r#"<section class="paper-list">"#);
        if !query.is_empty() {
            if searching {
                let _ = write!(body, r#"<h2>Search Results for "{}"</h2>"#, text(&query));
            } else {
                body.push_str("<h2>Recent Papers</h2>");
            }
        }
        if searching {
            body.push_str(
                r#"<form method="post" action="/search/clear"><button type="submit" class="link">Show recent papers</button></form>"#,
            );
        } else {
            self.push_category_filter(body);
        }

        if self.is_loading() && papers.is_empty() {
            body.push_str(r#"<div class="loading"><span class="spinner"></span></div>"#);
        } else if papers.is_empty() {
            body.push_str(
                r#"<div class="empty"><h3>No papers found</h3><p>Try a different search query or collect new papers</p></div>"#,
            );
        } else {
            for paper in &papers {
                body.push_str(&render_paper_card(
                    paper,
                    CardOptions {
                        selectable: true,
                        show_summary: false,
                    },
                ));
            }
            if !searching {
                self.push_pagination(body, papers.len());
            }
        }
        body.push_str("</section>");
    }

    fn push_category_filter(&self, body: &mut String) {
        let filter = self.filter();
        let _ = write!(
            body,
            r#"<form class="filter" method="post" action="/filter"><input type="hidden" name="limit" value="{limit}"><input type="hidden" name="offset" value="0"><input type="text" name="category" value="{category}" placeholder="Category, e.g. q-fin"><input type="text" name="query" value="{query}" placeholder="Title or abstract contains..."><button type="submit" class="secondary">Filter</button></form>"#,
            limit = filter.limit,
            category = attr(filter.category.as_deref().unwrap_or_default()),
            query = attr(filter.query.as_deref().unwrap_or_default()),
        );
    }

    fn push_pagination(&self, body: &mut String, shown: usize) {
        let filter = self.filter();
        let prev_disabled = filter.offset == 0;
        let next_disabled = shown < filter.limit as usize;

        body.push_str(r#"<nav class="pagination">"#);
        push_page_form(body, "Previous", &filter.previous_page(), prev_disabled);
        let _ = write!(
            body,
            r#"<span>Papers {}–{}</span>"#,
            filter.offset + 1,
            filter.offset as usize + shown
        );
        push_page_form(body, "Next", &filter.next_page(), next_disabled);
        body.push_str("</nav>");
    }
}

fn push_page_form(body: &mut String, label: &str, target: &PaperFilterParams, disabled: bool) {
    let _ = write!(
        body,
        r#"<form method="post" action="/filter"><input type="hidden" name="limit" value="{limit}"><input type="hidden" name="offset" value="{offset}"><input type="hidden" name="category" value="{category}"><input type="hidden" name="query" value="{query}"><button type="submit" class="secondary"{disabled}>{label}</button></form>"#,
        limit = target.limit,
        offset = target.offset,
        category = attr(target.category.as_deref().unwrap_or_default()),
        query = attr(target.query.as_deref().unwrap_or_default()),
        disabled = if disabled { " disabled" } else { "" },
    );
}

fn render_document(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>ESG &amp; Finance AI Research Assistant</title><link rel="stylesheet" href="/static/desk.css"></head><body><main class="esg-finance-ai-app">{body}</main></body></html>"#
    )
}
