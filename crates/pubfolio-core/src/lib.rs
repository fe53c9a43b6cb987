//! Publication list pipeline for DBLP person pages.
//!
//! Fetches a person's XML record, converts it with [`pubfolio_xml`], extracts
//! conference and journal papers keyed by their DBLP key, orders them by
//! recency and renders them as HTML fragments.

pub mod config_file;
pub mod dom;
pub mod extract;
pub mod pipeline;
pub mod render;
pub mod sort;
pub mod transport;

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

pub use extract::{PaperKind, PaperMap, Publication, ShapeError, merge, papers_of};
pub use pipeline::{Collection, FetchFailure, collect_papers, fetch_person, papers_of_person};
pub use pubfolio_xml::{XmlConverter, XmlError};
pub use render::{RenderError, RenderOptions, RenderStats, render_page, render_paper, render_papers};
pub use sort::{sort_by_recency, sort_papers};
pub use transport::{DblpClient, LocalDir, PersonSource, TransportError};

/// Author pid -> CSS class name.
pub type HighlightMap = BTreeMap<String, String>;

/// Default URL template for person records; `{pid}` is replaced verbatim.
pub const DEFAULT_URL_TEMPLATE: &str = "https://dblp.org/pid/{pid}.xml";

/// `publtype` value of entries that are left out of rendered lists.
pub const DEFAULT_SKIP_PUBLTYPE: &str = "informal";

/// Tags that are always arrays so single-paper and single-author records
/// read the same as longer ones.
pub const DEFAULT_ARRAY_TAGS: &[&str] = &["r", "author"];

/// Failure to obtain the papers of one person.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("malformed XML: {0}")]
    Xml(#[from] XmlError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub url_template: String,
    /// Per-request timeout. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
    pub array_tags: Vec<String>,
    pub skip_publtype: String,
    pub page_title: Option<String>,
    pub highlight: HighlightMap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            timeout: None,
            array_tags: DEFAULT_ARRAY_TAGS.iter().map(|t| t.to_string()).collect(),
            skip_publtype: DEFAULT_SKIP_PUBLTYPE.to_string(),
            page_title: None,
            highlight: HighlightMap::new(),
        }
    }
}

impl Config {
    /// Fill in defaults for everything the file leaves unset.
    pub fn from_file(file: &config_file::ConfigFile) -> Self {
        let defaults = Self::default();
        let dblp = file.dblp.clone().unwrap_or_default();
        let render = file.render.clone().unwrap_or_default();

        Self {
            url_template: dblp.url_template.unwrap_or(defaults.url_template),
            timeout: dblp.timeout_secs.map(Duration::from_secs),
            array_tags: dblp.array_tags.unwrap_or(defaults.array_tags),
            skip_publtype: render.skip_publtype.unwrap_or(defaults.skip_publtype),
            page_title: render.title,
            highlight: file.highlight.clone().unwrap_or_default(),
        }
    }

    pub fn converter(&self) -> XmlConverter {
        XmlConverter::with_array_tags(self.array_tags.iter().cloned())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            highlight: self.highlight.clone(),
            skip_publtype: self.skip_publtype.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_file::{ConfigFile, DblpConfig};

    #[test]
    fn defaults_when_file_empty() {
        let config = Config::from_file(&ConfigFile::default());
        assert_eq!(config.url_template, DEFAULT_URL_TEMPLATE);
        assert_eq!(config.timeout, None);
        assert_eq!(config.skip_publtype, "informal");
        assert!(config.converter().is_array_tag("r"));
        assert!(config.converter().is_array_tag("author"));
    }

    #[test]
    fn file_values_override_defaults() {
        let file = ConfigFile {
            dblp: Some(DblpConfig {
                timeout_secs: Some(15),
                array_tags: Some(vec!["ee".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = Config::from_file(&file);
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.converter().array_tags(), vec!["ee"]);
        assert_eq!(config.url_template, DEFAULT_URL_TEMPLATE);
    }
}
