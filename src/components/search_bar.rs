// src/components/search_bar.rs
use std::fmt::Write as _;

use serde::Deserialize;

use crate::format::attr;

/// Which button submitted the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchAction {
    #[default]
    Search,
    Brief,
}

#[derive(Debug, Clone, Default)]
pub struct SearchBar {
    query: String,
    loading: bool,
}

impl SearchBar {
    pub fn new(query: impl Into<String>, loading: bool) -> Self {
        Self {
            query: query.into(),
            loading,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Both actions are disabled for a blank query or while loading.
    pub fn actions_enabled(&self) -> bool {
        !self.loading && !self.query.trim().is_empty()
    }

    /// Trimmed query for the search callback, `None` when the action is disabled.
    pub fn submit_search(&self) -> Option<String> {
        self.trimmed()
    }

    /// Trimmed query for the brief callback, `None` when the action is disabled.
    pub fn generate_brief(&self) -> Option<String> {
        self.trimmed()
    }

    pub fn dispatch(&self, action: SearchAction) -> Option<(SearchAction, String)> {
        let q = match action {
            SearchAction::Search => self.submit_search(),
            SearchAction::Brief => self.generate_brief(),
        }?;
        Some((action, q))
    }

    fn trimmed(&self) -> Option<String> {
        self.actions_enabled().then(|| self.query.trim().to_string())
    }

    pub fn render(&self) -> String {
        let disabled = if self.actions_enabled() { "" } else { " disabled" };
        let spinner = if self.loading {
            r#"<span class="spinner small"></span>"#
        } else {
            ""
        };
        let loading_flag = if self.loading { "1" } else { "0" };

        let mut html = String::with_capacity(1536);
        html.push_str(r#"<section class="search-bar"><h2>ESG &amp; Finance Research Search</h2>"#);
        let _ = write!(
            html,
            r#"<form id="search-form" method="post" action="/search" data-loading="{loading_flag}"><input type="text" name="query" value="{q}" placeholder="Search for ESG and finance research papers..." autocomplete="off"><div class="actions"><button type="submit" name="action" value="search" class="primary"{disabled}>{spinner}Search</button><button type="submit" name="action" value="brief" class="success"{disabled}>{spinner}Generate Brief</button></div></form>"#,
            q = attr(&self.query),
        );
        html.push_str(
            r#"<div class="hint"><p>Search for ESG and finance related research by topic, keyword or theme.</p><p><strong>Example queries:</strong> "climate finance impact", "ESG reporting standards", "sustainable investing performance"</p></div>"#,
        );
        html.push_str(SEARCH_BAR_SCRIPT);
        html.push_str("</section>");
        html
    }
}

// Keeps the buttons in step with the input without a round trip.
const SEARCH_BAR_SCRIPT: &str = r#"<script>(function(){var f=document.getElementById('search-form');if(!f)return;var i=f.querySelector('input[name=query]');function s(){var off=f.dataset.loading==='1'||!i.value.trim();f.querySelectorAll('button').forEach(function(b){b.disabled=off;});}i.addEventListener('input',s);s();})();</script>"#;
