// Tests for link graph construction

use urlgraph_core::{AnalyzerConfig, LinkGraph, LinkGraphBuilder, PageContent, PageNode, UrlRecord};

fn builder() -> LinkGraphBuilder {
    LinkGraphBuilder::new(AnalyzerConfig::default().canonicalizer())
}

fn page(url: &str, links: &[&str]) -> PageContent {
    PageContent::new(url, url).with_internal_links(links.iter().copied())
}

// ============================================================================
// Node And Edge Tests
// ============================================================================

#[test]
fn test_links_outside_dataset_are_dropped() {
    let pages = vec![
        page("http://a.com/", &["http://a.com/b", "http://a.com/missing"]),
        page("http://a.com/b", &[]),
    ];

    let graph = builder().build(&pages);

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.contains_edge("http://a.com/", "http://a.com/b"));
    assert!(!graph.contains("http://a.com/missing"));
}

#[test]
fn test_links_matched_by_canonical_form() {
    let pages = vec![
        page("http://a.com/", &["http://WWW.a.com/b/?utm_source=news#top"]),
        page("http://a.com/b", &[]),
    ];

    let graph = builder().build(&pages);

    assert!(graph.contains_edge("http://a.com/", "http://a.com/b"));
}

#[test]
fn test_node_identity_is_final_url() {
    let pages = vec![PageContent::new("http://a.com/old", "http://a.com/new").with_title("New")];

    let graph = builder().build(&pages);

    assert!(graph.contains("http://a.com/new"));
    assert!(!graph.contains("http://a.com/old"));
    assert_eq!(
        graph.node("http://a.com/new").and_then(|n| n.title.as_deref()),
        Some("New")
    );
}

#[test]
fn test_link_to_request_url_resolves_to_final_url() {
    let pages = vec![
        PageContent::new("http://a.com/old", "http://a.com/new"),
        page("http://a.com/", &["http://a.com/old"]),
    ];

    let graph = builder().build(&pages);

    assert!(graph.contains_edge("http://a.com/", "http://a.com/new"));
}

#[test]
fn test_link_to_redirect_hop_resolves() {
    let mut redirected = PageContent::new("http://a.com/start", "http://a.com/end");
    redirected.redirect_chain = vec!["http://a.com/middle".to_string()];
    let pages = vec![redirected, page("http://a.com/", &["http://a.com/middle"])];

    let graph = builder().build(&pages);

    assert!(graph.contains_edge("http://a.com/", "http://a.com/end"));
}

#[test]
fn test_final_url_wins_over_other_request_url() {
    let pages = vec![
        PageContent::new("http://a.com/x", "http://a.com/y"),
        page("http://a.com/x", &[]),
        page("http://a.com/", &["http://a.com/x"]),
    ];

    let graph = builder().build(&pages);

    assert!(graph.contains_edge("http://a.com/", "http://a.com/x"));
    assert!(!graph.contains_edge("http://a.com/", "http://a.com/y"));
}

#[test]
fn test_duplicate_links_collapse_to_one_edge() {
    let pages = vec![
        page("http://a.com/", &["http://a.com/b", "http://a.com/b/", "http://a.com/b#x"]),
        page("http://a.com/b", &[]),
    ];

    let graph = builder().build(&pages);

    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_duplicate_pages_merge_into_one_node() {
    let pages = vec![
        page("http://a.com/", &["http://a.com/b"]),
        page("http://a.com/#again", &["http://a.com/c"]),
        page("http://a.com/b", &[]),
        page("http://a.com/c", &[]),
    ];

    let graph = builder().build(&pages);

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.out_degree("http://a.com/"), Some(2));
}

#[test]
fn test_self_links_are_kept() {
    let pages = vec![page("http://a.com/", &["http://a.com/"])];

    let graph = builder().build(&pages);

    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.in_degree("http://a.com/"), Some(1));
    assert_eq!(graph.out_degree("http://a.com/"), Some(1));
}

#[test]
fn test_external_links_are_ignored() {
    let mut home = page("http://a.com/", &[]);
    home.external_links = vec!["http://b.com/".to_string()];
    let pages = vec![home, page("http://b.com/", &[])];

    let graph = builder().build(&pages);

    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_empty_input() {
    let graph = builder().build(&[]);
    assert!(graph.is_empty());
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_add_edge_requires_both_nodes() {
    let mut graph = LinkGraph::new();
    graph.add_node(PageNode::new("a"));

    assert!(!graph.add_edge("a", "b"));
    graph.add_node(PageNode::new("b"));
    assert!(graph.add_edge("a", "b"));
    assert!(graph.add_edge("a", "b"));
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.successors("a"), vec!["b"]);
    assert_eq!(graph.predecessors("b"), vec!["a"]);
}

// ============================================================================
// Stats Tests
// ============================================================================

#[test]
fn test_stats_empty_graph() {
    let stats = LinkGraph::new().stats();
    assert_eq!(stats.num_nodes, 0);
    assert_eq!(stats.num_edges, 0);
    assert_eq!(stats.density, 0.0);
    assert!(!stats.weakly_connected);
}

#[test]
fn test_stats_single_node() {
    let mut graph = LinkGraph::new();
    graph.add_node(PageNode::new("a"));

    let stats = graph.stats();
    assert_eq!(stats.density, 0.0);
    assert!(stats.weakly_connected);
}

#[test]
fn test_stats_disconnected_graph() {
    let pages = vec![
        page("http://a.com/", &["http://a.com/b"]),
        page("http://a.com/b", &[]),
        page("http://a.com/c", &[]),
    ];

    let stats = builder().build(&pages).stats();

    assert_eq!(stats.num_nodes, 3);
    assert_eq!(stats.num_edges, 1);
    assert!((stats.density - 1.0 / 6.0).abs() < 1e-12);
    assert!(!stats.weakly_connected);
}

#[test]
fn test_stats_weak_connectivity_ignores_direction() {
    let pages = vec![
        page("http://a.com/a", &["http://a.com/c"]),
        page("http://a.com/b", &["http://a.com/c"]),
        page("http://a.com/c", &[]),
    ];

    assert!(builder().build(&pages).stats().weakly_connected);
}

// ============================================================================
// Discovery Tree Tests
// ============================================================================

#[test]
fn test_from_records_links_parent_to_child() {
    let records = vec![
        UrlRecord::new("http://a.com/", 0, None).unwrap(),
        UrlRecord::new("http://a.com/x", 1, Some("http://a.com/".into())).unwrap(),
        UrlRecord::new("http://a.com/x/y", 2, Some("http://a.com/x/".into())).unwrap(),
        UrlRecord::new("http://a.com/z", 1, Some("http://gone.com/".into())).unwrap(),
    ];

    let graph = builder().from_records(&records);

    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.contains_edge("http://a.com/", "http://a.com/x"));
    assert!(graph.contains_edge("http://a.com/x", "http://a.com/x/y"));
    assert_eq!(graph.in_degree("http://a.com/z"), Some(0));
}

// ============================================================================
// Export Tests
// ============================================================================

#[test]
fn test_to_dot() {
    let pages = vec![
        page("http://a.com/", &["http://a.com/b"]),
        page("http://a.com/b", &[]),
    ];

    let dot = builder().build(&pages).to_dot();

    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("http://a.com/b"));
    assert!(dot.contains("->"));
}

#[test]
fn test_to_edge_list() {
    let pages = vec![
        page("http://a.com/", &["http://a.com/b"]),
        page("http://a.com/b", &[]),
    ];

    let list = builder().build(&pages).to_edge_list();

    assert_eq!(list.nodes.len(), 2);
    assert_eq!(
        list.edges,
        vec![("http://a.com/".to_string(), "http://a.com/b".to_string())]
    );
    let json = serde_json::to_value(&list).unwrap();
    assert_eq!(json["edges"][0][1], "http://a.com/b");
}
