//! Fetch, convert and extract the papers of one or more persons.
//!
//! Persons are processed one after another; a failure for one person is
//! recorded and the remaining persons are still fetched.

use pubfolio_xml::XmlConverter;
use serde_json::Value;

use crate::FetchError;
use crate::extract::{self, PaperMap};
use crate::transport::PersonSource;

/// A person whose papers could not be obtained.
#[derive(Debug)]
pub struct FetchFailure {
    pub pid: String,
    pub error: FetchError,
}

impl FetchFailure {
    pub fn new(pid: impl Into<String>, error: FetchError) -> Self {
        Self {
            pid: pid.into(),
            error,
        }
    }

    /// Human-readable line for the page's debug section.
    pub fn message(&self) -> String {
        match &self.error {
            FetchError::Transport(_) => format!("could not fetch dblp for {}", self.pid),
            other => format!("could not read publications of {}: {}", self.pid, other),
        }
    }
}

/// Papers gathered from several persons plus the persons that failed.
#[derive(Debug, Default)]
pub struct Collection {
    pub papers: PaperMap,
    pub failures: Vec<FetchFailure>,
}

/// Fetch and convert the XML record of `pid`.
pub async fn fetch_person(
    source: &dyn PersonSource,
    pid: &str,
    converter: &XmlConverter,
) -> Result<Value, FetchError> {
    let xml = source.fetch_xml(pid).await.inspect_err(|e| {
        tracing::warn!(source = source.name(), pid, error = %e, "could not fetch dblp for {pid}");
    })?;
    Ok(converter.convert(&xml)?)
}

/// Articles and conference papers of `pid`, keyed by DBLP key.
pub async fn papers_of_person(
    source: &dyn PersonSource,
    pid: &str,
    converter: &XmlConverter,
) -> Result<PaperMap, FetchError> {
    let root = fetch_person(source, pid, converter).await?;
    Ok(extract::papers_of(&root)?)
}

/// Papers of all `pids`, deduplicated by key.
pub async fn collect_papers<S: AsRef<str>>(
    source: &dyn PersonSource,
    pids: &[S],
    converter: &XmlConverter,
) -> Collection {
    let mut collection = Collection::default();

    for pid in pids {
        let pid = pid.as_ref();
        match papers_of_person(source, pid, converter).await {
            Ok(papers) => {
                tracing::info!(pid, count = papers.len(), "collected papers");
                extract::merge(&mut collection.papers, papers);
            }
            Err(e) => {
                tracing::debug!(pid, error = %e, "person skipped");
                collection.failures.push(FetchFailure::new(pid, e));
            }
        }
    }

    collection
}
