//! Publication extraction from a converted `dblpperson` document.
//!
//! Each `<r>` entry of a person record wraps exactly one publication element.
//! Only journal articles and conference papers are kept; every other entry
//! kind (proceedings, books, theses, ...) is dropped without error.

use std::collections::BTreeMap;

use pubfolio_xml::node;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Publications keyed by DBLP key.
pub type PaperMap = BTreeMap<String, Publication>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("converted document has no `{0}`")]
    MissingPath(&'static str),
}

/// Which publication element an entry carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperKind {
    Article,
    InProceedings,
}

impl PaperKind {
    /// Checked in this order; an entry carrying both shapes is an article.
    pub const ALL: [PaperKind; 2] = [PaperKind::Article, PaperKind::InProceedings];

    /// Element name in DBLP XML.
    pub fn tag(self) -> &'static str {
        match self {
            PaperKind::Article => "article",
            PaperKind::InProceedings => "inproceedings",
        }
    }

    /// Child element holding the venue name.
    pub fn venue_field(self) -> &'static str {
        match self {
            PaperKind::Article => "journal",
            PaperKind::InProceedings => "booktitle",
        }
    }
}

/// A journal article or conference paper from a person record.
///
/// Serializes as the converted element object with an extra `dblptype`
/// member naming the kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    #[serde(skip)]
    key: String,
    #[serde(rename = "dblptype")]
    kind: PaperKind,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Publication {
    /// Wrap a converted element. Returns `None` when it has no `key`
    /// attribute.
    pub fn new(kind: PaperKind, mut fields: Map<String, Value>) -> Option<Self> {
        let key = fields.get("key")?.as_str()?.to_string();
        fields.remove("dblptype");
        Some(Self { key, kind, fields })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> PaperKind {
        self.kind
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// `#text` of a child element such as `title` or `year`.
    pub fn text_of(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(node::text)
    }

    /// Attribute value such as `mdate` or `publtype`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.text_of("title")
    }

    pub fn venue(&self) -> Option<&str> {
        self.text_of(self.kind.venue_field())
    }

    /// Publication year, read like JavaScript's `parseInt`: leading
    /// whitespace, optional sign, then as many digits as follow.
    pub fn year(&self) -> Option<i64> {
        self.text_of("year").and_then(parse_leading_int)
    }

    pub fn mdate(&self) -> Option<&str> {
        self.attr("mdate")
    }

    pub fn publtype(&self) -> Option<&str> {
        self.attr("publtype")
    }

    /// One-line "title in venue (year)" description.
    pub fn summary(&self) -> String {
        let title = self.title().unwrap_or("(untitled)");
        let mut out = format!("{} in {}", title, self.venue().unwrap_or("?"));
        if let Some(year) = self.text_of("year") {
            out.push_str(&format!(" ({})", year));
        }
        out
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// The paper element of one `<r>` entry, if it has a supported shape.
fn select_paper(entry: &Value) -> Option<(PaperKind, &Map<String, Value>)> {
    PaperKind::ALL.into_iter().find_map(|kind| match entry.get(kind.tag()) {
        Some(Value::Object(obj)) => Some((kind, obj)),
        _ => None,
    })
}

/// Collect the articles and conference papers of a converted person record.
///
/// Fails only when the document has no `dblpperson` element or that element
/// has no `r` entries. Entries of other shapes, or without a key, are left
/// out.
pub fn papers_of(root: &Value) -> Result<PaperMap, ShapeError> {
    let person = root
        .get("dblpperson")
        .ok_or(ShapeError::MissingPath("dblpperson"))?;
    let entries = person
        .get("r")
        .ok_or(ShapeError::MissingPath("dblpperson.r"))?;

    let mut papers = PaperMap::new();
    for entry in node::as_sequence(entries) {
        let Some((kind, obj)) = select_paper(entry) else {
            continue;
        };
        match Publication::new(kind, obj.clone()) {
            Some(paper) => {
                papers.insert(paper.key.clone(), paper);
            }
            None => tracing::debug!(kind = kind.tag(), "skipping paper without key"),
        }
    }

    tracing::debug!(count = papers.len(), "extracted papers");
    Ok(papers)
}

/// Add `other` into `into`; a key present in both takes `other`'s paper.
pub fn merge(into: &mut PaperMap, other: PaperMap) {
    into.extend(other);
}
