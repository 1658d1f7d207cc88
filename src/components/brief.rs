// src/components/brief.rs
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::format::{attr, format_date_time, text};
use crate::models::{PaperInfo, ResearchBrief, TextList};

pub const SECTION_LABELS: [&str; 5] = [
    "Executive Summary",
    "Key Themes and Findings",
    "Research Gaps",
    "Practical Implications",
    "Recommended Next Steps",
];

static SECTION_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    SECTION_LABELS
        .iter()
        .map(|label| {
            Regex::new(&format!("(?i)({}:?)", regex::escape(label))).expect("section label regex")
        })
        .collect()
});

/// Turns the free-text brief into markup: every case-insensitive occurrence
/// of a section label (with an optional trailing colon) becomes an `<h3>`,
/// then each blank-line separated block without a heading becomes a `<p>`.
///
/// Labels are matched anywhere, including inside prose. The backend owns the
/// text, so the result is trusted markup and is not escaped.
pub fn format_brief_body(content: &str) -> String {
    let mut formatted = content.to_string();
    for re in SECTION_RES.iter() {
        formatted = re.replace_all(&formatted, "<h3>${1}</h3>").into_owned();
    }

    formatted
        .split("\n\n")
        .map(|block| {
            if block.contains("<h3>") {
                block.to_string()
            } else {
                format!("<p>{block}</p>")
            }
        })
        .collect()
}

pub const CLOSE_ROUTE: &str = "/brief/close";

pub fn render_brief(brief: &ResearchBrief) -> String {
    let mut html = String::with_capacity(brief.brief.len() + 2048);

    html.push_str(r#"<section class="research-brief" id="brief">"#);
    let _ = write!(
        html,
        r#"<div class="brief-head"><h2>Research Brief</h2><form method="post" action="{CLOSE_ROUTE}"><button type="submit" class="icon-close" aria-label="Close">&times;</button></form></div>"#
    );

    let _ = write!(
        html,
        r#"<div class="brief-meta"><div><strong>Query:</strong> {}</div><div><strong>Generated:</strong> {}</div></div>"#,
        text(&brief.query),
        text(&format_date_time(&brief.timestamp))
    );

    if let Some(err) = brief.error.as_deref().filter(|e| !e.is_empty()) {
        let _ = write!(html, r#"<div class="notice error">{}</div>"#, text(err));
    } else if brief.brief.is_empty() {
        if let Some(msg) = brief.message.as_deref().filter(|m| !m.is_empty()) {
            let _ = write!(html, r#"<div class="notice">{}</div>"#, text(msg));
        }
    }

    if !brief.brief.is_empty() {
        let _ = write!(
            html,
            r#"<div class="brief-body">{}</div>"#,
            format_brief_body(&brief.brief)
        );
    }

    if !brief.papers.is_empty() {
        html.push_str(r#"<div class="brief-papers"><h3>Papers Referenced</h3>"#);
        for info in &brief.papers {
            push_paper_info(&mut html, info);
        }
        html.push_str("</div>");
    }

    let _ = write!(
        html,
        r#"<div class="brief-foot"><form method="post" action="{CLOSE_ROUTE}"><button type="submit" class="secondary">Close</button></form></div></section>"#
    );
    html
}

fn push_paper_info(html: &mut String, info: &PaperInfo) {
    html.push_str(r#"<div class="brief-paper">"#);
    let _ = write!(html, "<h4>{}</h4>", text(&info.title));
    let _ = write!(
        html,
        r#"<div class="paper-meta"><strong>Authors:</strong> {}</div>"#,
        text(&info.authors.joined())
    );
    let _ = write!(html, "<p>{}</p>", text(&info.summary));

    let findings: Vec<&str> = match &info.key_findings {
        TextList::Many(v) => v.iter().map(String::as_str).collect(),
        TextList::One(raw) if !raw.is_empty() => vec![raw.as_str()],
        TextList::One(_) => Vec::new(),
    };
    if !findings.is_empty() {
        html.push_str("<div><strong>Key Findings:</strong><ul>");
        for f in findings {
            let _ = write!(html, "<li>{}</li>", text(f));
        }
        html.push_str("</ul></div>");
    }

    let _ = write!(
        html,
        r#"<div class="paper-links"><a href="{}" target="_blank" rel="noopener noreferrer">View Source</a></div></div>"#,
        attr(&info.url)
    );
}
