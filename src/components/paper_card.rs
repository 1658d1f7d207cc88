// src/components/paper_card.rs
use std::fmt::Write as _;

use crate::format::{attr, format_date, percent, score, text};
use crate::models::{Paper, PaperSummary, TextList};

#[derive(Debug, Clone, Copy, Default)]
pub struct CardOptions {
    /// Clicking the card opens the detail view.
    pub selectable: bool,
    pub show_summary: bool,
}

/// Route a selectable card navigates to.
pub fn select_href(paper: &Paper) -> String {
    let mut out = String::from("/papers/");
    for b in paper.id.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

/// Pure rendering of one paper. Links stop click propagation so they never
/// also select the card.
pub fn render_paper_card(paper: &Paper, opts: CardOptions) -> String {
    let mut html = String::with_capacity(2048);

    if opts.selectable {
        let href = select_href(paper);
        let _ = write!(
            html,
            r#"<article class="paper-card selectable" data-href="{h}" onclick="window.location.href=this.dataset.href">"#,
            h = attr(&href)
        );
    } else {
        html.push_str(r#"<article class="paper-card">"#);
    }

    let _ = write!(html, r#"<h3 class="paper-title">{}</h3>"#, text(&paper.title));

    html.push_str(r#"<div class="paper-meta">"#);
    let _ = write!(
        html,
        r#"<span><strong>Authors:</strong> {}</span>"#,
        text(&paper.authors.joined())
    );
    let _ = write!(
        html,
        r#"<span><strong>Published:</strong> {}</span>"#,
        text(&format_date(&paper.published_date))
    );
    if let Some(sim) = paper.similarity {
        let _ = write!(
            html,
            r#"<span class="relevance"><strong>Relevance:</strong> {}</span>"#,
            percent(sim)
        );
    }
    html.push_str("</div>");

    if !paper.categories.is_empty() {
        html.push_str(r#"<div class="chips">"#);
        push_chips(&mut html, &paper.categories);
        html.push_str("</div>");
    }

    let _ = write!(html, r#"<p class="abstract">{}</p>"#, text(&paper.r#abstract));

    if opts.show_summary {
        if let Some(summary) = &paper.summary {
            push_summary(&mut html, summary);
        }
    }

    html.push_str(r#"<div class="paper-links">"#);
    let _ = write!(
        html,
        r#"<a href="{}" target="_blank" rel="noopener noreferrer" onclick="event.stopPropagation()">View Source</a>"#,
        attr(&paper.url)
    );
    if !paper.pdf_url.is_empty() {
        let _ = write!(
            html,
            r#"<a class="pdf" href="{}" target="_blank" rel="noopener noreferrer" onclick="event.stopPropagation()">Download PDF</a>"#,
            attr(&paper.pdf_url)
        );
    }
    html.push_str("</div></article>");
    html
}

fn push_chips(html: &mut String, items: &TextList) {
    match items {
        TextList::Many(v) => {
            for item in v {
                let _ = write!(html, r#"<span class="chip">{}</span>"#, text(item));
            }
        }
        TextList::One(raw) => html.push_str(&text(raw)),
    }
}

fn push_summary(html: &mut String, summary: &PaperSummary) {
    html.push_str(r#"<section class="paper-summary"><h4>Summary</h4>"#);
    let _ = write!(html, "<p>{}</p>", text(&summary.summary));

    html.push_str(r#"<div class="relevance-bars">"#);
    push_bar(html, "esg", "ESG Relevance", summary.esg_relevance_score);
    push_bar(html, "finance", "Finance Relevance", summary.finance_relevance_score);
    html.push_str("</div>");

    html.push_str("<h4>Key Findings</h4><ul>");
    match &summary.key_findings {
        TextList::Many(v) => {
            for f in v {
                let _ = write!(html, "<li>{}</li>", text(f));
            }
        }
        TextList::One(raw) => {
            let _ = write!(html, "<li>{}</li>", text(raw));
        }
    }
    html.push_str("</ul>");

    html.push_str(r#"<h4>Keywords</h4><div class="chips">"#);
    push_chips(html, &summary.keywords);
    html.push_str("</div></section>");
}

// Width is the raw score; out-of-range values are not clamped here.
fn push_bar(html: &mut String, class: &str, label: &str, value: f64) {
    let v = score(value);
    let _ = write!(
        html,
        r#"<div class="bar {class}"><div class="track"><div class="fill" style="width: {v}%"></div></div><div class="bar-label">{label}: {v}%</div></div>"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper() -> Paper {
        Paper {
            id: "2401.00001v1".into(),
            title: "Climate risk & bank lending".into(),
            r#abstract: "We study <transition> risk.".into(),
            authors: vec!["A. Smith".to_string(), "B. Jones".to_string()].into(),
            url: "https://arxiv.org/abs/2401.00001v1".into(),
            pdf_url: String::new(),
            published_date: "2024-01-02".into(),
            source: "arxiv".into(),
            categories: vec!["q-fin.GN".to_string()].into(),
            retrieved_date: "2024-01-03T09:00:00".into(),
            embedding_id: None,
            summary: Some(PaperSummary {
                id: 7,
                paper_id: "2401.00001v1".into(),
                summary: "Banks reprice loans.".into(),
                esg_relevance_score: 130.0,
                finance_relevance_score: 64.0,
                key_findings: vec!["Spreads widen".to_string()].into(),
                keywords: TextList::One("climate, credit".into()),
                created_date: "2024-01-04".into(),
            }),
            similarity: Some(0.8765),
        }
    }

    #[test]
    fn renders_joined_authors_date_and_similarity() {
        let html = render_paper_card(&paper(), CardOptions::default());
        assert!(html.contains("A. Smith, B. Jones"));
        assert!(html.contains("1/2/2024"));
        assert!(html.contains("88%"));
        assert!(html.contains("Climate risk &amp; bank lending"));
        assert!(html.contains("&lt;transition&gt;"));
    }

    #[test]
    fn summary_only_when_requested() {
        let p = paper();
        let plain = render_paper_card(&p, CardOptions::default());
        assert!(!plain.contains("paper-summary"));

        let detail = render_paper_card(
            &p,
            CardOptions {
                selectable: false,
                show_summary: true,
            },
        );
        assert!(detail.contains("ESG Relevance: 130%"));
        assert!(detail.contains("width: 130%"));
        assert!(detail.contains("<li>Spreads widen</li>"));
        assert!(detail.contains("climate, credit"));
    }

    #[test]
    fn links_stop_propagation_and_pdf_is_optional() {
        let mut p = paper();
        let html = render_paper_card(&p, CardOptions { selectable: true, show_summary: false });
        assert!(html.contains(r#"data-href="/papers/2401.00001v1""#));
        assert!(html.contains("event.stopPropagation()"));
        assert!(!html.contains("Download PDF"));

        p.pdf_url = "https://arxiv.org/pdf/2401.00001v1".into();
        let html = render_paper_card(&p, CardOptions::default());
        assert!(html.contains("Download PDF"));
        assert!(!html.contains("data-href"));
    }

    #[test]
    fn raw_string_authors_render_unchanged() {
        let mut p = paper();
        p.authors = TextList::One("Doe, J.".into());
        let html = render_paper_card(&p, CardOptions::default());
        assert!(html.contains("<strong>Authors:</strong> Doe, J.</span>"));
    }

    #[test]
    fn select_href_escapes_unsafe_ids() {
        let mut p = paper();
        p.id = "ssrn/12 3".into();
        assert_eq!(select_href(&p), "/papers/ssrn%2F12%203");
    }

    #[test]
    fn rendering_is_idempotent() {
        let p = paper();
        let opts = CardOptions { selectable: true, show_summary: true };
        assert_eq!(render_paper_card(&p, opts), render_paper_card(&p, opts));
    }
}
