// Tests for graph analysis and report generation

use urlgraph_core::metrics::try_betweenness;
use urlgraph_core::report::{
    ExportFormat, MetricKind, ReportFormat, analyze, analyze_pages, discovery_stats,
    generate_dedup_json_report, generate_dedup_text_report, generate_json_report,
    generate_text_report, generate_tree_report, save_report, top_scores,
};
use urlgraph_core::{
    AnalyzerConfig, CanonicalIndex, LinkGraph, LinkGraphBuilder, PageContent, PageNode, PageType,
    Scores, UrlRecord,
};

fn page(url: &str, links: &[&str]) -> PageContent {
    PageContent::new(url, url).with_internal_links(links.iter().copied())
}

fn site() -> Vec<PageContent> {
    vec![
        page("http://a.com/", &["http://a.com/x", "http://a.com/y"]),
        page("http://a.com/x", &["http://a.com/y"]),
        page("http://a.com/y", &["http://a.com/"]),
        page("http://a.com/z", &["http://a.com/x"]),
    ]
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json)));
    assert!(ReportFormat::from_str("csv").is_none());
}

#[test]
fn test_export_format_from_str() {
    assert!(matches!(ExportFormat::from_str("dot"), Some(ExportFormat::Dot)));
    assert!(matches!(ExportFormat::from_str("Json"), Some(ExportFormat::Json)));
    assert!(ExportFormat::from_str("graphml").is_none());
}

// ============================================================================
// Analysis Tests
// ============================================================================

#[test]
fn test_analyze_small_site() {
    let (graph, report) = analyze_pages(&site(), &AnalyzerConfig::default());

    assert_eq!(graph.node_count(), 4);
    assert_eq!(report.graph_stats.num_nodes, 4);
    assert_eq!(report.graph_stats.num_edges, 5);
    assert!(report.graph_stats.weakly_connected);
    assert!(report.unavailable.is_empty());
    assert_eq!(report.pagerank_top_n.len(), 4);
    assert_eq!(report.hits.top_hubs.len(), 4);
    assert_eq!(report.centrality.top_in_degree.len(), 4);
    assert_eq!(report.centrality.top_betweenness.len(), 4);

    let total: usize = report.page_type_distribution.values().sum();
    assert_eq!(total, 4);
    let tiers: usize = report.authority_tiers.values().sum();
    assert_eq!(tiers, 4);
}

#[test]
fn test_analyze_top_n_sorted_and_truncated() {
    let config = AnalyzerConfig {
        top_n: 2,
        ..Default::default()
    };
    let (_, report) = analyze_pages(&site(), &config);

    assert_eq!(report.pagerank_top_n.len(), 2);
    assert!(report.pagerank_top_n[0].score >= report.pagerank_top_n[1].score);
    assert_eq!(report.centrality.top_in_degree[0].url, "http://a.com/x");
    assert_eq!(report.centrality.top_in_degree[0].degree, 2);
}

#[test]
fn test_analyze_empty_graph_degrades() {
    let report = analyze(&LinkGraph::new(), &AnalyzerConfig::default());

    assert_eq!(report.graph_stats.num_nodes, 0);
    assert!(report.pagerank_top_n.is_empty());
    assert!(report.hits.top_hubs.is_empty());
    assert!(report.centrality.top_betweenness.is_empty());
    assert!(report.page_type_distribution.is_empty());
    assert_eq!(report.unavailable, vec![MetricKind::Pagerank, MetricKind::Hits]);
}

#[test]
fn test_analyze_edgeless_graph_keeps_pagerank() {
    let mut graph = LinkGraph::new();
    graph.add_node(PageNode::new("a"));
    graph.add_node(PageNode::new("b"));

    let report = analyze(&graph, &AnalyzerConfig::default());

    assert_eq!(report.unavailable, vec![MetricKind::Hits]);
    assert_eq!(report.pagerank_top_n.len(), 2);
    assert!((report.pagerank_top_n[0].score - 0.5).abs() < 1e-6);
    assert_eq!(report.page_type_distribution[&PageType::Leaf], 2);
}

/// Two nodes per layer, each linked to both nodes of the next layer. The
/// number of shortest paths doubles per layer and overflows `f64` long
/// before the last one.
fn doubling_ladder(layers: usize) -> LinkGraph {
    let mut graph = LinkGraph::new();
    for layer in 0..layers {
        for side in 0..2 {
            graph.add_node(PageNode::new(format!("l{}-{}", layer, side)));
        }
    }
    for layer in 1..layers {
        for from in 0..2 {
            for to in 0..2 {
                graph.add_edge(
                    &format!("l{}-{}", layer - 1, from),
                    &format!("l{}-{}", layer, to),
                );
            }
        }
    }
    graph
}

#[test]
fn test_analyze_lists_failed_betweenness() {
    let graph = doubling_ladder(1030);
    assert!(try_betweenness(&graph).is_err());

    let report = analyze(&graph, &AnalyzerConfig::default());

    assert!(report.unavailable.contains(&MetricKind::Betweenness));
    assert!(report.centrality.top_betweenness.is_empty());
    assert!(!report.centrality.top_in_degree.is_empty());
    assert!(generate_text_report(&report).contains("betweenness"));
}

#[test]
fn test_analyze_keeps_betweenness_on_small_graph() {
    let graph = doubling_ladder(3);

    let report = analyze(&graph, &AnalyzerConfig::default());

    assert!(!report.unavailable.contains(&MetricKind::Betweenness));
    assert!(!report.centrality.top_betweenness.is_empty());
}

#[test]
fn test_top_scores_breaks_ties_by_url() {
    let scores: Scores = [("b".to_string(), 0.5), ("a".to_string(), 0.5), ("c".to_string(), 0.9)]
        .into_iter()
        .collect();

    let top = top_scores(&scores, 3);
    let urls: Vec<&str> = top.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(urls, vec!["c", "a", "b"]);
}

// ============================================================================
// Text And JSON Report Tests
// ============================================================================

#[test]
fn test_text_report_sections() {
    let (_, report) = analyze_pages(&site(), &AnalyzerConfig::default());
    let text = generate_text_report(&report);

    assert!(text.contains("URLGRAPH LINK ANALYSIS REPORT"));
    assert!(text.contains("PAGERANK"));
    assert!(text.contains("HITS AUTHORITIES"));
    assert!(text.contains("PAGE TYPES"));
    assert!(text.contains("http://a.com/x"));
    assert!(!text.contains("Unavailable"));
}

#[test]
fn test_text_report_lists_unavailable_metrics() {
    let report = analyze(&LinkGraph::new(), &AnalyzerConfig::default());
    let text = generate_text_report(&report);

    assert!(text.contains("Unavailable:  pagerank, hits"));
    assert!(text.contains("(none)"));
}

#[test]
fn test_json_report_structure() {
    let (_, report) = analyze_pages(&site(), &AnalyzerConfig::default());
    let json = generate_json_report(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["metadata"]["generator"], "urlgraph");
    assert_eq!(value["report"]["graph_stats"]["num_nodes"], 4);
    assert!(value["report"]["pagerank_top_n"].is_array());
    assert!(value["report"]["hits"]["top_authorities"].is_array());
    assert!(value["report"]["page_type_distribution"].is_object());
    assert!(value["report"]["authority_tiers"]["very_high"].is_number());
}

// ============================================================================
// Dedup Report Tests
// ============================================================================

#[test]
fn test_dedup_reports() {
    let records: Vec<UrlRecord> = ["http://a.com/p", "http://a.com/p/", "http://a.com/q"]
        .iter()
        .map(|u| UrlRecord::new(*u, 0, None).unwrap())
        .collect();
    let report = CanonicalIndex::new(AnalyzerConfig::default().canonicalizer())
        .partition(records)
        .report();

    let text = generate_dedup_text_report(&report);
    assert!(text.contains("Duplicate groups: 1"));
    assert!(text.contains("http://a.com/p (2)"));
    assert!(text.contains("└── http://a.com/p/"));

    let json: serde_json::Value =
        serde_json::from_str(&generate_dedup_json_report(&report).unwrap()).unwrap();
    assert_eq!(json["unique_count"], 1);
}

// ============================================================================
// Tree Report Tests
// ============================================================================

#[test]
fn test_tree_report_nests_children() {
    let mut root = UrlRecord::new("http://a.com/", 0, None).unwrap();
    root.status_code = Some(200);
    let records = vec![
        root,
        UrlRecord::new("http://a.com/a", 1, Some("http://a.com/".into())).unwrap(),
        UrlRecord::new("http://a.com/b", 1, Some("http://a.com/".into())).unwrap(),
        UrlRecord::new("http://a.com/b/c", 2, Some("http://a.com/b".into())).unwrap(),
    ];
    let graph = LinkGraphBuilder::new(AnalyzerConfig::default().canonicalizer())
        .from_records(&records);

    let tree = generate_tree_report(&graph);

    assert_eq!(
        tree,
        "http://a.com/ [✓]\n\
         ├── http://a.com/a [?]\n\
         └── http://a.com/b [?]\n    \
         └── http://a.com/b/c [?]\n"
    );
}

#[test]
fn test_tree_report_handles_cycles() {
    let mut graph = LinkGraph::new();
    graph.add_node(PageNode::new("a"));
    graph.add_node(PageNode::new("b"));
    graph.add_edge("a", "b");
    graph.add_edge("b", "a");

    let tree = generate_tree_report(&graph);

    assert_eq!(tree.lines().count(), 2);
}

#[test]
fn test_tree_report_last_child_after_shared_descendant() {
    // "b" is both a child of the root and a child of "a".
    let mut graph = LinkGraph::new();
    for url in ["r", "a", "b"] {
        graph.add_node(PageNode::new(url));
    }
    graph.add_edge("r", "a");
    graph.add_edge("r", "b");
    graph.add_edge("a", "b");

    let tree = generate_tree_report(&graph);

    assert_eq!(tree, "r [?]\n├── a [?]\n└── b [?]\n");
}

#[test]
fn test_discovery_stats_counts_roots_and_missing_parents() {
    let mut crawled = UrlRecord::new("http://a.com/", 0, None).unwrap();
    crawled.crawled_at = Some(1_700_000_000);
    let records = vec![
        crawled,
        UrlRecord::new("http://a.com/a", 1, Some("http://a.com/".into())).unwrap(),
        UrlRecord::new("http://a.com/a/b", 2, Some("http://a.com/a".into())).unwrap(),
        UrlRecord::new("http://a.com/z", 1, Some("http://elsewhere.com/".into())).unwrap(),
        UrlRecord::new("http://a.com/p", 1, Some("http://a.com/q".into())).unwrap(),
        UrlRecord::new("http://a.com/q", 1, Some("http://a.com/p".into())).unwrap(),
    ];

    let stats = discovery_stats(&records);

    assert_eq!(stats.records, 6);
    assert_eq!(stats.roots, 1);
    assert_eq!(stats.crawled, 1);
    assert_eq!(stats.missing_parents, 1);
    assert_eq!(stats.deepest_chain, 2);
}

#[test]
fn test_tree_report_empty() {
    assert_eq!(generate_tree_report(&LinkGraph::new()), "  (empty)\n");
}

// ============================================================================
// Save Report Tests
// ============================================================================

#[test]
fn test_save_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");

    save_report("hello", &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
}
