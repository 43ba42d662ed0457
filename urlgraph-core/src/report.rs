use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use crate::classify::{PageType, page_type_distribution};
use crate::config::AnalyzerConfig;
use crate::dedup::PartitionReport;
use crate::graph::{GraphStats, LinkGraph, LinkGraphBuilder};
use crate::metrics::{
    AuthorityTier, HitsScores, Scores, authority_tiers, degree_centrality, try_betweenness,
    try_hits, try_pagerank,
};
use crate::model::{PageContent, RecordIndex, UrlRecord};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Dot,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dot" | "gv" => Some(ExportFormat::Dot),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Metrics that were requested but could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Pagerank,
    Hits,
    Betweenness,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Pagerank => "pagerank",
            MetricKind::Hits => "hits",
            MetricKind::Betweenness => "betweenness",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredUrl {
    pub url: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeEntry {
    pub url: String,
    pub degree: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HitsSummary {
    pub top_hubs: Vec<ScoredUrl>,
    pub top_authorities: Vec<ScoredUrl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CentralitySummary {
    pub top_in_degree: Vec<DegreeEntry>,
    pub top_betweenness: Vec<ScoredUrl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphReport {
    pub graph_stats: GraphStats,
    pub pagerank_top_n: Vec<ScoredUrl>,
    pub hits: HitsSummary,
    pub centrality: CentralitySummary,
    pub page_type_distribution: BTreeMap<PageType, usize>,
    pub authority_tiers: BTreeMap<AuthorityTier, usize>,
    pub unavailable: Vec<MetricKind>,
}

/// Computes every metric over `graph` and keeps the `top_n` entries of each.
///
/// A metric that fails is logged, listed in `unavailable` and reported
/// empty. Authority tiers are derived from PageRank.
pub fn analyze(graph: &LinkGraph, config: &AnalyzerConfig) -> GraphReport {
    let top_n = config.top_n;
    let mut unavailable = Vec::new();

    let pagerank = try_pagerank(graph, &config.pagerank).unwrap_or_else(|e| {
        warn!("PageRank unavailable: {}", e);
        unavailable.push(MetricKind::Pagerank);
        Scores::new()
    });

    let hits = try_hits(graph, &config.hits).unwrap_or_else(|e| {
        warn!("HITS unavailable: {}", e);
        unavailable.push(MetricKind::Hits);
        HitsScores::default()
    });

    let mut centrality = degree_centrality(graph);
    if graph.node_count() > 1 {
        match try_betweenness(graph) {
            Ok(scores) => centrality.betweenness = Some(scores),
            Err(e) => {
                warn!("Betweenness centrality unavailable: {}", e);
                unavailable.push(MetricKind::Betweenness);
            }
        }
    }
    let top_in_degree = top_entries(&centrality.in_degree, top_n)
        .into_iter()
        .map(|(url, degree)| DegreeEntry { url, degree })
        .collect();
    let top_betweenness = centrality
        .betweenness
        .as_ref()
        .map(|scores| top_scores(scores, top_n))
        .unwrap_or_default();

    let tiers = authority_tiers(&pagerank)
        .into_iter()
        .map(|(tier, urls)| (tier, urls.len()))
        .collect();

    info!(
        "Analyzed {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    GraphReport {
        graph_stats: graph.stats(),
        pagerank_top_n: top_scores(&pagerank, top_n),
        hits: HitsSummary {
            top_hubs: top_scores(&hits.hubs, top_n),
            top_authorities: top_scores(&hits.authorities, top_n),
        },
        centrality: CentralitySummary {
            top_in_degree,
            top_betweenness,
        },
        page_type_distribution: page_type_distribution(graph),
        authority_tiers: tiers,
        unavailable,
    }
}

/// Builds the link graph for `pages` and analyzes it.
pub fn analyze_pages(pages: &[PageContent], config: &AnalyzerConfig) -> (LinkGraph, GraphReport) {
    let graph = LinkGraphBuilder::new(config.canonicalizer()).build(pages);
    let report = analyze(&graph, config);
    (graph, report)
}

/// The `n` highest scores, ties broken by URL.
pub fn top_scores(scores: &Scores, n: usize) -> Vec<ScoredUrl> {
    let mut ranked: Vec<(&String, &f64)> = scores.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(n)
        .map(|(url, score)| ScoredUrl {
            url: url.clone(),
            score: *score,
        })
        .collect()
}

fn top_entries(counts: &BTreeMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(&String, &usize)> = counts.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(n)
        .map(|(url, count)| (url.clone(), *count))
        .collect()
}

fn push_section(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push_str(title);
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');
}

fn push_scores(report: &mut String, entries: &[ScoredUrl]) {
    if entries.is_empty() {
        report.push_str("  (none)\n");
    }
    for (idx, entry) in entries.iter().enumerate() {
        report.push_str(&format!("  {:>3}. {:.6}  {}\n", idx + 1, entry.score, entry.url));
    }
    report.push('\n');
}

pub fn generate_text_report(report: &GraphReport) -> String {
    let mut out = String::new();

    out.push_str(RULE);
    out.push_str("                          URLGRAPH LINK ANALYSIS REPORT\n");
    out.push_str(RULE);
    out.push('\n');

    let stats = &report.graph_stats;
    out.push_str(&format!("Pages:        {}\n", stats.num_nodes));
    out.push_str(&format!("Links:        {}\n", stats.num_edges));
    out.push_str(&format!("Density:      {:.6}\n", stats.density));
    out.push_str(&format!(
        "Connected:    {}\n",
        if stats.weakly_connected { "yes" } else { "no" }
    ));
    if !report.unavailable.is_empty() {
        let names: Vec<&str> = report.unavailable.iter().map(MetricKind::as_str).collect();
        out.push_str(&format!("Unavailable:  {}\n", names.join(", ")));
    }
    out.push('\n');

    push_section(&mut out, "PAGERANK");
    push_scores(&mut out, &report.pagerank_top_n);

    push_section(&mut out, "HITS HUBS");
    push_scores(&mut out, &report.hits.top_hubs);

    push_section(&mut out, "HITS AUTHORITIES");
    push_scores(&mut out, &report.hits.top_authorities);

    push_section(&mut out, "MOST LINKED PAGES");
    if report.centrality.top_in_degree.is_empty() {
        out.push_str("  (none)\n");
    }
    for (idx, entry) in report.centrality.top_in_degree.iter().enumerate() {
        out.push_str(&format!("  {:>3}. {:>6}  {}\n", idx + 1, entry.degree, entry.url));
    }
    out.push('\n');

    push_section(&mut out, "BETWEENNESS");
    push_scores(&mut out, &report.centrality.top_betweenness);

    push_section(&mut out, "PAGE TYPES");
    for (page_type, count) in &report.page_type_distribution {
        out.push_str(&format!("  {:<12} {}\n", page_type.as_str(), count));
    }
    out.push('\n');

    push_section(&mut out, "AUTHORITY TIERS");
    for (tier, count) in &report.authority_tiers {
        out.push_str(&format!("  {:<12} {}\n", tier.as_str(), count));
    }
    out.push('\n');

    out.push_str(RULE);
    out.push_str("                                 End of Report\n");
    out.push_str(RULE);

    out
}

pub fn generate_json_report(report: &GraphReport) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "metadata": {
            "generator": "urlgraph",
            "version": env!("CARGO_PKG_VERSION"),
            "generated_at": chrono::Utc::now().to_rfc3339(),
        },
        "report": report,
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_dedup_text_report(report: &PartitionReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    push_section(&mut out, "CANONICAL DEDUPLICATION");
    out.push_str(&format!("Records:          {}\n", summary.total_original_urls));
    out.push_str(&format!("Canonical URLs:   {}\n", summary.total_canonical_urls));
    out.push_str(&format!("Unique:           {}\n", summary.unique_urls));
    out.push_str(&format!("Duplicate groups: {}\n", summary.duplicate_groups));
    out.push_str(&format!("Savings:          {}\n", summary.deduplication_savings));
    out.push('\n');

    if !report.duplicate_groups.is_empty() {
        push_section(&mut out, "DUPLICATE GROUPS");
        for group in &report.duplicate_groups {
            out.push_str(&format!("{} ({})\n", group.canonical_url, group.count));
            let last = group.member_urls.len().saturating_sub(1);
            for (idx, member) in group.member_urls.iter().enumerate() {
                let prefix = if idx == last { "└── " } else { "├── " };
                out.push_str(&format!("  {}{}\n", prefix, member));
            }
            out.push('\n');
        }
    }

    out
}

pub fn generate_dedup_json_report(report: &PartitionReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Record-level facts about a discovery crawl. Parent links are resolved by
/// exact URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveryStats {
    pub records: usize,
    pub roots: usize,
    pub crawled: usize,
    /// Records whose `parent_url` names no record in the set.
    pub missing_parents: usize,
    /// Longest run of parent links from any record, stopping at cycles.
    pub deepest_chain: usize,
}

pub fn discovery_stats(records: &[UrlRecord]) -> DiscoveryStats {
    let index = RecordIndex::new(records);
    let mut stats = DiscoveryStats {
        records: records.len(),
        ..Default::default()
    };

    for record in records {
        if record.is_root() {
            stats.roots += 1;
        } else if index.parent(record).is_none() {
            stats.missing_parents += 1;
        }
        if record.is_crawled() {
            stats.crawled += 1;
        }
        stats.deepest_chain = stats.deepest_chain.max(index.ancestry(record).len());
    }

    stats
}

pub fn generate_tree_summary(graph: &GraphStats, discovery: &DiscoveryStats) -> String {
    let mut out = String::new();

    push_section(&mut out, "DISCOVERY TREE");
    out.push_str(&format!("Records:          {}\n", discovery.records));
    out.push_str(&format!("Roots:            {}\n", discovery.roots));
    out.push_str(&format!("Crawled:          {}\n", discovery.crawled));
    out.push_str(&format!("Missing parents:  {}\n", discovery.missing_parents));
    out.push_str(&format!("Deepest chain:    {}\n", discovery.deepest_chain));
    out.push_str(&format!("Nodes:            {}\n", graph.num_nodes));
    out.push_str(&format!("Edges:            {}\n", graph.num_edges));
    out.push_str(&format!(
        "Connected:        {}\n",
        if graph.weakly_connected { "yes" } else { "no" }
    ));

    out
}

/// Renders a discovery graph as an indented tree, starting from nodes that
/// have no parent. Every node is printed once, under the first parent that
/// reaches it.
pub fn generate_tree_report(graph: &LinkGraph) -> String {
    if graph.is_empty() {
        return "  (empty)\n".to_string();
    }

    let mut out = String::new();
    let mut visited: HashSet<&str> = HashSet::new();

    let mut roots: Vec<&str> = graph
        .urls()
        .filter(|url| graph.in_degree(url) == Some(0))
        .collect();
    // A link to itself does not give a page a parent.
    for url in graph.urls() {
        if !roots.contains(&url) && graph.predecessors(url).iter().all(|p| *p == url) {
            roots.push(url);
        }
    }

    for root in roots {
        if visited.insert(root) {
            push_tree_node(graph, root, "", true, true, &mut visited, &mut out);
        }
    }
    // Cycles have no parentless node.
    for url in graph.urls() {
        if visited.insert(url) {
            push_tree_node(graph, url, "", true, true, &mut visited, &mut out);
        }
    }

    out
}

fn push_tree_node<'a>(
    graph: &'a LinkGraph,
    url: &'a str,
    indent: &str,
    is_last: bool,
    is_root: bool,
    visited: &mut HashSet<&'a str>,
    out: &mut String,
) {
    let status = graph
        .node(url)
        .and_then(|node| node.status_code)
        .map(status_indicator)
        .unwrap_or("?");

    if is_root {
        out.push_str(&format!("{} [{}]\n", url, status));
    } else {
        let prefix = if is_last { "└── " } else { "├── " };
        out.push_str(&format!("{}{}{} [{}]\n", indent, prefix, url, status));
    }

    let mut children = graph.successors(url);
    children.retain(|child| *child != url && !visited.contains(child));
    children.sort_unstable();
    // Claimed before descending so a sibling's subtree cannot take them.
    visited.extend(children.iter().copied());

    let child_indent = if is_root {
        String::new()
    } else if is_last {
        format!("{}    ", indent)
    } else {
        format!("{}│   ", indent)
    };

    let count = children.len();
    for (idx, child) in children.into_iter().enumerate() {
        push_tree_node(graph, child, &child_indent, idx + 1 == count, false, visited, out);
    }
}

fn status_indicator(status: u16) -> &'static str {
    match status {
        200..=299 => "✓",
        300..=399 => "→",
        400..=499 => "⚠",
        500..=599 => "✗",
        _ => "?",
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
