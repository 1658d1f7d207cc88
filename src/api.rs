// src/api.rs
//! Browser-facing routes. Every interaction maps onto a `HomePage` handler;
//! POSTs answer with a 303 back to the page so a reload never resubmits.
//! Handlers that depend on loaded state mount the page first; a form posted
//! to a freshly started desk still sees its list and status.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Path as UrlPath, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::components::{ControlAction, SearchAction, SearchBar};
use crate::models::PaperFilterParams;
use crate::page::{HomePage, PageSettings};

#[derive(Clone)]
pub struct AppState {
    pub page: Arc<HomePage>,
    pub settings: PageSettings,
}

impl AppState {
    pub fn new(page: HomePage, settings: PageSettings) -> Self {
        Self {
            page: Arc::new(page),
            settings,
        }
    }
}

/// Page routes only (no static files), handy for tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/search", post(submit_search))
        .route("/search/clear", post(clear_search))
        .route("/brief/close", post(close_brief))
        .route("/papers/{id}", get(select_paper))
        .route("/detail/close", post(close_detail))
        .route("/filter", post(apply_filter))
        .route("/scheduler/start", post(start_scheduler))
        .route("/scheduler/stop", post(stop_scheduler))
        .route("/collect", post(collect_now))
        .route("/process", post(process_now))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Page routes plus the stylesheet directory under `/static`.
pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    router(state).nest_service("/static", ServeDir::new(static_dir))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    state.page.reload().await;
    Html(state.page.render())
}

#[derive(Debug, Deserialize)]
struct SearchForm {
    #[serde(default)]
    query: String,
    #[serde(default)]
    action: SearchAction,
}

async fn submit_search(State(state): State<AppState>, Form(form): Form<SearchForm>) -> Redirect {
    state.page.mount().await;
    let bar = SearchBar::new(form.query, state.page.is_loading());
    match bar.dispatch(form.action) {
        Some((SearchAction::Search, q)) => {
            state.page.search(q).await;
            Redirect::to("/")
        }
        Some((SearchAction::Brief, q)) => {
            if state.page.generate_brief(q).await {
                Redirect::to("/#top")
            } else {
                Redirect::to("/")
            }
        }
        None => {
            debug!(target: "desk::api", action = ?form.action, "search bar action disabled, ignoring");
            Redirect::to("/")
        }
    }
}

async fn clear_search(State(state): State<AppState>) -> Redirect {
    state.page.clear_search();
    Redirect::to("/")
}

async fn close_brief(State(state): State<AppState>) -> Redirect {
    state.page.close_brief();
    Redirect::to("/")
}

async fn select_paper(State(state): State<AppState>, UrlPath(id): UrlPath<String>) -> Redirect {
    state.page.mount().await;
    if state.page.select_paper(&id).await {
        Redirect::to("/#top")
    } else {
        Redirect::to("/")
    }
}

async fn close_detail(State(state): State<AppState>) -> Redirect {
    state.page.close_detail();
    Redirect::to("/")
}

// Every field arrives as text from the hidden inputs; blanks mean "unset".
#[derive(Debug, Default, Deserialize)]
struct FilterForm {
    #[serde(default)]
    limit: String,
    #[serde(default)]
    offset: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    query: String,
}

impl FilterForm {
    fn into_params(self, default_limit: u32) -> PaperFilterParams {
        let non_empty = |s: String| {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        };
        PaperFilterParams {
            limit: self
                .limit
                .trim()
                .parse()
                .ok()
                .filter(|l: &u32| *l > 0)
                .unwrap_or(default_limit),
            offset: self.offset.trim().parse().unwrap_or(0),
            category: non_empty(self.category),
            query: non_empty(self.query),
        }
    }
}

async fn apply_filter(State(state): State<AppState>, Form(form): Form<FilterForm>) -> Redirect {
    let params = form.into_params(state.settings.page_size);
    state.page.set_filter(params).await;
    Redirect::to("/")
}

async fn run_control(state: &AppState, action: ControlAction) -> Redirect {
    state.page.mount().await;
    state.page.run_control(action).await;
    Redirect::to("/")
}

async fn start_scheduler(State(state): State<AppState>) -> Redirect {
    run_control(&state, ControlAction::StartScheduler).await
}

async fn stop_scheduler(State(state): State<AppState>) -> Redirect {
    run_control(&state, ControlAction::StopScheduler).await
}

async fn collect_now(State(state): State<AppState>) -> Redirect {
    run_control(&state, ControlAction::CollectNow).await
}

async fn process_now(State(state): State<AppState>) -> Redirect {
    run_control(&state, ControlAction::ProcessNow).await
}
