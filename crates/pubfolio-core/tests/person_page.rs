//! End-to-end rendering of a saved DBLP person record.
//!
//! Reads `tests/fixtures/84/5849.xml` through [`LocalDir`], so no network
//! access is needed.

use std::path::PathBuf;

use pubfolio_core::dom::Element;
use pubfolio_core::{
    Config, HighlightMap, LocalDir, PaperKind, RenderStats, collect_papers, render_page,
    render_papers, sort_papers,
};

fn fixtures() -> LocalDir {
    LocalDir::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

#[tokio::test]
async fn extracts_only_articles_and_conference_papers() {
    let config = Config::default();
    let collection = collect_papers(&fixtures(), &["84/5849"], &config.converter()).await;

    assert!(collection.failures.is_empty());
    let keys: Vec<&str> = collection.papers.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "conf/broken/NoVenue21",
            "conf/ipps/DoeS22",
            "conf/sc/SauleX20",
            "journals/corr/abs-2305-00001",
            "journals/tpds/Saule22",
        ]
    );
    assert_eq!(
        collection.papers["journals/tpds/Saule22"].kind(),
        PaperKind::Article
    );
    assert_eq!(
        collection.papers["journals/tpds/Saule22"].title(),
        Some("Graph Kernels & Friends.")
    );
}

#[tokio::test]
async fn renders_sorted_list_without_informal_entries() {
    let config = Config {
        highlight: HighlightMap::from([("84/5849".to_string(), "me".to_string())]),
        ..Config::default()
    };
    let collection = collect_papers(&fixtures(), &["84/5849"], &config.converter()).await;
    let papers = sort_papers(collection.papers);

    let order: Vec<&str> = papers.iter().map(|p| p.key()).collect();
    assert_eq!(
        order,
        vec![
            "journals/corr/abs-2305-00001",
            "journals/tpds/Saule22",
            "conf/ipps/DoeS22",
            "conf/broken/NoVenue21",
            "conf/sc/SauleX20",
        ]
    );

    let mut container = Element::new("div");
    let stats = render_papers(&mut container, &papers, &config.render_options());
    assert_eq!(
        stats,
        RenderStats {
            rendered: 3,
            skipped: 1,
            failed: 1
        }
    );

    let titles: Vec<String> = container
        .child_elements()
        .map(|p| p.child_elements().next().unwrap().text_content())
        .collect();
    assert_eq!(
        titles,
        vec![
            "Graph Kernels & Friends.",
            "Scheduling on Many Cores.",
            "Sparse Things."
        ]
    );

    let html = container.to_html();
    assert!(html.contains(r#"<span>Jane Doe</span>, <span class="me">Erik Saule</span>"#));
    assert!(html.contains("<span>Xiao Li</span>"));
    assert!(html.contains(r#"<span class="where">IEEE Trans. Parallel Distributed Syst.</span>"#));
    assert!(!html.contains("Preprint"));
    assert!(!html.contains("Missing Venue"));
}

#[tokio::test]
async fn page_reports_missing_person() {
    let config = Config::default();
    let collection =
        collect_papers(&fixtures(), &["84/5849", "00/0000"], &config.converter()).await;
    assert_eq!(collection.failures.len(), 1);

    let papers = sort_papers(collection.papers);
    let (html, stats) = render_page(
        Some("Erik Saule"),
        &papers,
        &collection.failures,
        &config.render_options(),
    );

    assert_eq!(stats.rendered, 3);
    assert!(html.contains("<h1>Erik Saule</h1>"));
    assert!(html.contains("<p>could not fetch dblp for 00/0000</p>"));
}
