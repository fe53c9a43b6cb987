//! HTML rendering of publication lists.
//!
//! A paper renders as
//!
//! ```html
//! <p><span class="title">T</span> By <span class="authors"><span>A</span>, <span class="me">B</span></span> in <span class="where">V</span> <span class="year">Y</span></p>
//! ```
//!
//! Papers that cannot be rendered (a required element is missing) are skipped
//! and counted; they never abort the list.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use pubfolio_xml::node;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::dom::{Element, html_escape};
use crate::extract::Publication;
use crate::pipeline::FetchFailure;
use crate::{DEFAULT_SKIP_PUBLTYPE, HighlightMap};

/// DBLP appends ` 0001`-style numbers to disambiguate homonymous authors.
static DISAMBIGUATION_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r" [0-9]+$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("paper {key} has no `{field}` text")]
    MissingField { key: String, field: &'static str },
    #[error("paper {key} lists an author without a name")]
    UnnamedAuthor { key: String },
    #[error("paper {key}: `{class}` is not a usable class name")]
    InvalidClass { key: String, class: String },
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub highlight: HighlightMap,
    /// Papers whose `publtype` equals this are left out.
    pub skip_publtype: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            highlight: HighlightMap::new(),
            skip_publtype: DEFAULT_SKIP_PUBLTYPE.to_string(),
        }
    }
}

/// Outcome counts of one [`render_papers`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub rendered: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn strip_disambiguation(name: &str) -> Cow<'_, str> {
    DISAMBIGUATION_SUFFIX.replace(name, "")
}

/// `<span class="authors">` with one span per author, comma separated.
pub fn render_authors(
    key: &str,
    authors: &Value,
    highlight: &HighlightMap,
) -> Result<Element, RenderError> {
    let authors = node::as_sequence(authors);

    let mut container = Element::new("span");
    container.set_attribute("class", "authors");

    for (i, author) in authors.iter().enumerate() {
        let name = node::text(author).ok_or_else(|| RenderError::UnnamedAuthor {
            key: key.to_string(),
        })?;

        let mut span = Element::new("span");
        span.set_text(strip_disambiguation(name));
        if let Some(class) = node::attr(author, "pid").and_then(|pid| highlight.get(pid)) {
            if class.is_empty() || class.chars().any(char::is_whitespace) {
                return Err(RenderError::InvalidClass {
                    key: key.to_string(),
                    class: class.clone(),
                });
            }
            span.add_class(class);
        }
        container.append_child(span);

        if i + 1 != authors.len() {
            container.append_text(", ");
        }
    }

    Ok(container)
}

/// Text of a required element. An element without its own text renders
/// empty; only an absent element is an error.
fn required<'a>(paper: &'a Publication, field: &'static str) -> Result<&'a str, RenderError> {
    let element = paper.get(field).ok_or_else(|| RenderError::MissingField {
        key: paper.key().to_string(),
        field,
    })?;
    Ok(node::text(element).unwrap_or(""))
}

fn classed_span(class: &str, text: &str) -> Element {
    let mut span = Element::new("span");
    span.set_attribute("class", class);
    span.set_text(text);
    span
}

/// The `<p>` fragment for one paper.
pub fn render_paper(paper: &Publication, highlight: &HighlightMap) -> Result<Element, RenderError> {
    let authors = paper.get("author").ok_or_else(|| RenderError::MissingField {
        key: paper.key().to_string(),
        field: "author",
    })?;
    let authors = render_authors(paper.key(), authors, highlight)?;
    let title = required(paper, "title")?;
    let year = required(paper, "year")?;
    let venue = required(paper, paper.kind().venue_field())?;

    let mut para = Element::new("p");
    para.append_child(classed_span("title", title));
    para.append_text(" By ");
    para.append_child(authors);
    para.append_text(" in ");
    para.append_child(classed_span("where", venue));
    para.append_text(" ");
    para.append_child(classed_span("year", year));
    Ok(para)
}

/// Append a fragment per paper to `container`, in the given order.
pub fn render_papers(
    container: &mut Element,
    papers: &[Publication],
    options: &RenderOptions,
) -> RenderStats {
    let mut stats = RenderStats::default();

    for paper in papers {
        if paper.publtype() == Some(options.skip_publtype.as_str()) {
            tracing::trace!(key = paper.key(), "skipping {}", options.skip_publtype);
            stats.skipped += 1;
            continue;
        }
        match render_paper(paper, &options.highlight) {
            Ok(fragment) => {
                container.append_child(fragment);
                stats.rendered += 1;
            }
            Err(e) => {
                tracing::debug!(key = paper.key(), error = %e, "skipping unrenderable paper");
                stats.failed += 1;
            }
        }
    }

    stats
}

/// A standalone HTML page with the rendered list and a debug section
/// listing persons whose records could not be fetched.
pub fn render_page(
    title: Option<&str>,
    papers: &[Publication],
    failures: &[FetchFailure],
    options: &RenderOptions,
) -> (String, RenderStats) {
    let mut list = Element::new("div");
    list.set_attribute("id", "publications");
    let stats = render_papers(&mut list, papers, options);

    let mut debug = Element::new("div");
    debug.set_attribute("id", "debuginfo");
    for failure in failures {
        let mut p = Element::new("p");
        p.set_text(failure.message());
        debug.append_child(p);
    }

    let title = title.unwrap_or("Publications");
    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    out.push_str(
        r#"<style>
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; max-width: 60rem; margin: 2rem auto; }
.title { font-weight: bold; }
.where { font-style: italic; }
.me { text-decoration: underline; }
#debuginfo { color: #888; }
</style>
</head>
<body>
"#,
    );
    out.push_str(&format!("<h1>{}</h1>\n", html_escape(title)));
    out.push_str(&list.to_html());
    out.push('\n');
    out.push_str(&debug.to_html());
    out.push_str("\n</body>\n</html>\n");

    (out, stats)
}
