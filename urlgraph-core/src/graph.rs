//! Directed link graph over canonical page identities.
//!
//! Nodes are keyed by canonical URL. Edges point from a page to the pages it
//! links to, at most one edge per ordered pair. Links to pages outside the
//! dataset are dropped rather than added as bare nodes.

use petgraph::Direction;
use petgraph::algo::connected_components;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};
use urlgraph_canon::Canonicalizer;

use crate::model::{PageContent, UrlRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageNode {
    pub url: String,
    pub title: Option<String>,
    pub status_code: Option<u16>,
}

impl PageNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            status_code: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub density: f64,
    pub weakly_connected: bool,
}

/// Serializable form of a graph: node attributes plus `[source, target]`
/// pairs.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeList {
    pub nodes: Vec<PageNode>,
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    graph: DiGraph<PageNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, or fills in missing attributes when the URL is already
    /// present.
    pub fn add_node(&mut self, node: PageNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.url) {
            let existing = &mut self.graph[idx];
            if existing.title.is_none() {
                existing.title = node.title;
            }
            if existing.status_code.is_none() {
                existing.status_code = node.status_code;
            }
            return idx;
        }

        let url = node.url.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(url, idx);
        idx
    }

    /// Adds `from -> to` if both endpoints exist. Returns false otherwise.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        match (self.node_index(from), self.node_index(to)) {
            (Some(a), Some(b)) => {
                self.graph.update_edge(a, b, ());
                true
            }
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        match (self.node_index(from), self.node_index(to)) {
            (Some(a), Some(b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    pub fn node_index(&self, url: &str) -> Option<NodeIndex> {
        self.index.get(url).copied()
    }

    pub fn node(&self, url: &str) -> Option<&PageNode> {
        self.node_index(url).map(|idx| &self.graph[idx])
    }

    pub fn url(&self, idx: NodeIndex) -> &str {
        &self.graph[idx].url
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|node| node.url.as_str())
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph
            .edge_references()
            .map(|edge| (self.url(edge.source()), self.url(edge.target())))
    }

    pub fn in_degree(&self, url: &str) -> Option<usize> {
        self.node_index(url)
            .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
    }

    pub fn out_degree(&self, url: &str) -> Option<usize> {
        self.node_index(url)
            .map(|idx| self.graph.neighbors_directed(idx, Direction::Outgoing).count())
    }

    pub fn successors(&self, url: &str) -> Vec<&str> {
        self.node_index(url)
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .map(|n| self.url(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn predecessors(&self, url: &str) -> Vec<&str> {
        self.node_index(url)
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .map(|n| self.url(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Out-neighbour lists by node index position.
    pub(crate) fn adjacency(&self) -> Vec<Vec<usize>> {
        self.graph
            .node_indices()
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .map(|n| n.index())
                    .collect()
            })
            .collect()
    }

    pub fn inner(&self) -> &DiGraph<PageNode, ()> {
        &self.graph
    }

    pub fn stats(&self) -> GraphStats {
        let n = self.node_count();
        let e = self.edge_count();
        let density = if n > 1 {
            e as f64 / (n as f64 * (n as f64 - 1.0))
        } else {
            0.0
        };

        GraphStats {
            num_nodes: n,
            num_edges: e,
            density,
            weakly_connected: n > 0 && connected_components(&self.graph) == 1,
        }
    }

    pub fn to_dot(&self) -> String {
        let labelled = self.graph.map(|_, node| node.url.as_str(), |_, _| "");
        format!("{}", Dot::with_config(&labelled, &[Config::EdgeNoLabel]))
    }

    pub fn to_edge_list(&self) -> EdgeList {
        EdgeList {
            nodes: self.graph.node_weights().cloned().collect(),
            edges: self
                .edges()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

/// Builds [`LinkGraph`]s from crawl output.
pub struct LinkGraphBuilder {
    canonicalizer: Canonicalizer,
}

impl LinkGraphBuilder {
    pub fn new(canonicalizer: Canonicalizer) -> Self {
        Self { canonicalizer }
    }

    /// Builds the page link graph in two passes.
    ///
    /// The first pass registers a node per page and records every address a
    /// page answers to. The second resolves `internal_links` against those
    /// addresses. A final URL always wins over another page's request URL or
    /// redirect hop when both canonicalize to the same string.
    pub fn build(&self, pages: &[PageContent]) -> LinkGraph {
        let canon = &self.canonicalizer;

        let resolved_pages: Vec<ResolvedPage> = pages
            .par_iter()
            .map(|page| ResolvedPage {
                identity: canon.canonicalize(page.identity_url()),
                aliases: std::iter::once(page.url.as_str())
                    .chain(page.redirect_chain.iter().map(String::as_str))
                    .filter(|url| !url.is_empty())
                    .map(|url| canon.canonicalize(url))
                    .collect(),
                links: page
                    .internal_links
                    .iter()
                    .map(|link| canon.canonicalize(link))
                    .collect(),
            })
            .collect();

        let mut graph = LinkGraph::new();
        let mut targets: HashMap<String, NodeIndex> = HashMap::new();

        for (page, resolved) in pages.iter().zip(&resolved_pages) {
            let idx = graph.add_node(PageNode {
                url: resolved.identity.clone(),
                title: page.title.clone(),
                status_code: Some(page.status_code),
            });
            targets.insert(resolved.identity.clone(), idx);
        }

        for resolved in &resolved_pages {
            if let Some(&idx) = targets.get(&resolved.identity) {
                for alias in &resolved.aliases {
                    targets.entry(alias.clone()).or_insert(idx);
                }
            }
        }

        let mut dropped = 0usize;
        for resolved in &resolved_pages {
            let Some(&source) = targets.get(&resolved.identity) else {
                continue;
            };
            for link in &resolved.links {
                match targets.get(link) {
                    Some(&target) => {
                        graph.graph.update_edge(source, target, ());
                    }
                    None => dropped += 1,
                }
            }
        }

        if dropped > 0 {
            debug!("Dropped {} links to pages outside the dataset", dropped);
        }
        info!(
            "Built link graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Builds the discovery tree: one node per canonical record URL and an
    /// edge from each record's parent to the record itself.
    pub fn from_records(&self, records: &[UrlRecord]) -> LinkGraph {
        let canon = &self.canonicalizer;

        let keyed: Vec<(String, Option<String>)> = records
            .par_iter()
            .map(|record| {
                (
                    canon.canonicalize(&record.url),
                    record.parent_url.as_deref().map(|p| canon.canonicalize(p)),
                )
            })
            .collect();

        let mut graph = LinkGraph::new();
        for (record, (url, _)) in records.iter().zip(&keyed) {
            graph.add_node(PageNode {
                url: url.clone(),
                title: record.title.clone(),
                status_code: record.status_code,
            });
        }

        for (url, parent) in &keyed {
            if let Some(parent) = parent {
                graph.add_edge(parent, url);
            }
        }

        debug!(
            "Built discovery tree with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }
}

struct ResolvedPage {
    identity: String,
    aliases: Vec<String>,
    links: Vec<String>,
}
