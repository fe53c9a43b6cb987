//! Recency ordering of publications.

use std::cmp::Ordering;

use crate::extract::{PaperMap, Publication};

/// Newest first: descending year, then descending `mdate`.
///
/// `mdate` is the record's last modification date on DBLP, not the
/// publication date, so within a year the order is only approximate.
/// Missing or unparseable years and missing dates sort last.
fn recency(a: &Publication, b: &Publication) -> Ordering {
    b.year()
        .cmp(&a.year())
        .then_with(|| b.mdate().cmp(&a.mdate()))
}

/// Stable in-place recency sort.
pub fn sort_by_recency(papers: &mut [Publication]) {
    papers.sort_by(recency);
}

/// Flatten a paper map into a recency-ordered list.
pub fn sort_papers(papers: PaperMap) -> Vec<Publication> {
    let mut list: Vec<Publication> = papers.into_values().collect();
    sort_by_recency(&mut list);
    list
}
