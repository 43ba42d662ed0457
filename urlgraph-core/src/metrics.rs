//! Link-analysis metrics over a [`LinkGraph`].
//!
//! The `try_*` functions report why a metric could not be computed. The
//! plain variants log the failure and return an empty map so that a report
//! can still be assembled from the metrics that did succeed.

use petgraph::Direction;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};

use crate::config::{HitsConfig, PageRankConfig};
use crate::error::MetricError;
use crate::graph::LinkGraph;

/// Per-URL scores, ordered by URL.
pub type Scores = BTreeMap<String, f64>;

pub type MetricResult<T> = std::result::Result<T, MetricError>;

/// PageRank by power iteration with uniform teleport.
///
/// Rank held by pages without outgoing links is spread evenly over all pages.
/// Iteration stops once the L1 change between steps drops below
/// `node_count * tolerance`.
pub fn try_pagerank(graph: &LinkGraph, params: &PageRankConfig) -> MetricResult<Scores> {
    let n = graph.node_count();
    if n == 0 {
        return Err(MetricError::EmptyGraph);
    }
    let damping = params.damping;
    if !(0.0..=1.0).contains(&damping) {
        return Err(MetricError::InvalidParameter(format!("damping {}", damping)));
    }

    let inner = graph.inner();
    let out_degree: Vec<usize> = inner
        .node_indices()
        .map(|idx| inner.neighbors_directed(idx, Direction::Outgoing).count())
        .collect();
    let uniform = 1.0 / n as f64;
    let mut rank = vec![uniform; n];

    for iteration in 1..=params.max_iter {
        let last = rank;
        let dangling: f64 = damping
            * last
                .iter()
                .zip(&out_degree)
                .filter(|(_, degree)| **degree == 0)
                .map(|(score, _)| score)
                .sum::<f64>();

        rank = vec![0.0; n];
        for edge in inner.edge_references() {
            let source = edge.source().index();
            rank[edge.target().index()] += damping * last[source] / out_degree[source] as f64;
        }
        for score in rank.iter_mut() {
            *score += dangling * uniform + (1.0 - damping) * uniform;
        }

        let err: f64 = rank.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if err < n as f64 * params.tolerance {
            debug!("PageRank converged after {} iterations", iteration);
            return into_scores(graph, rank);
        }
    }

    Err(MetricError::NotConverged {
        iterations: params.max_iter,
    })
}

pub fn pagerank(graph: &LinkGraph, damping: f64) -> Scores {
    let params = PageRankConfig {
        damping,
        ..PageRankConfig::default()
    };
    try_pagerank(graph, &params).unwrap_or_else(|e| {
        warn!("PageRank unavailable: {}", e);
        Scores::new()
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HitsScores {
    pub hubs: Scores,
    pub authorities: Scores,
}

/// HITS hub and authority scores.
///
/// Each step is scaled so the largest score is 1. On convergence both
/// vectors are rescaled to sum to 1.
pub fn try_hits(graph: &LinkGraph, params: &HitsConfig) -> MetricResult<HitsScores> {
    let n = graph.node_count();
    if n == 0 {
        return Err(MetricError::EmptyGraph);
    }
    if graph.edge_count() == 0 {
        return Err(MetricError::NoEdges);
    }

    let edges: Vec<(usize, usize)> = graph
        .inner()
        .edge_references()
        .map(|edge| (edge.source().index(), edge.target().index()))
        .collect();

    let mut hubs = vec![1.0 / n as f64; n];

    for iteration in 1..=params.max_iter {
        let last = hubs;

        let mut authorities = vec![0.0; n];
        for &(source, target) in &edges {
            authorities[target] += last[source];
        }
        hubs = vec![0.0; n];
        for &(source, target) in &edges {
            hubs[source] += authorities[target];
        }

        scale_to_max(&mut hubs)?;
        scale_to_max(&mut authorities)?;

        let err: f64 = hubs.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if err < params.tolerance {
            debug!("HITS converged after {} iterations", iteration);
            scale_to_sum(&mut hubs)?;
            scale_to_sum(&mut authorities)?;
            return Ok(HitsScores {
                hubs: into_scores(graph, hubs)?,
                authorities: into_scores(graph, authorities)?,
            });
        }
    }

    Err(MetricError::NotConverged {
        iterations: params.max_iter,
    })
}

pub fn hits(graph: &LinkGraph) -> HitsScores {
    try_hits(graph, &HitsConfig::default()).unwrap_or_else(|e| {
        warn!("HITS unavailable: {}", e);
        HitsScores::default()
    })
}

fn scale_to_max(values: &mut [f64]) -> MetricResult<()> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if !(max > 0.0) {
        return Err(MetricError::NonFinite);
    }
    values.iter_mut().for_each(|v| *v /= max);
    Ok(())
}

fn scale_to_sum(values: &mut [f64]) -> MetricResult<()> {
    let sum: f64 = values.iter().sum();
    if !(sum > 0.0) {
        return Err(MetricError::NonFinite);
    }
    values.iter_mut().for_each(|v| *v /= sum);
    Ok(())
}

fn into_scores(graph: &LinkGraph, values: Vec<f64>) -> MetricResult<Scores> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MetricError::NonFinite);
    }
    Ok(graph
        .inner()
        .node_indices()
        .zip(values)
        .map(|(idx, score)| (graph.url(idx).to_string(), score))
        .collect())
}

/// Betweenness centrality (Brandes), scaled by `1 / ((n-1)(n-2))` when the
/// graph has more than two nodes. Sources are processed in parallel.
pub fn try_betweenness(graph: &LinkGraph) -> MetricResult<Scores> {
    let n = graph.node_count();
    if n == 0 {
        return Err(MetricError::EmptyGraph);
    }

    let adjacency = graph.adjacency();
    let mut centrality = (0..n)
        .into_par_iter()
        .map(|source| single_source_dependencies(&adjacency, source))
        .reduce(
            || vec![0.0; n],
            |mut acc, deps| {
                acc.iter_mut().zip(deps).for_each(|(a, d)| *a += d);
                acc
            },
        );

    if n > 2 {
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        centrality.iter_mut().for_each(|c| *c *= scale);
    }

    into_scores(graph, centrality)
}

pub fn betweenness(graph: &LinkGraph) -> Scores {
    try_betweenness(graph).unwrap_or_else(|e| {
        warn!("Betweenness centrality unavailable: {}", e);
        Scores::new()
    })
}

/// Dependency of `source` on every other node, from one BFS.
fn single_source_dependencies(adjacency: &[Vec<usize>], source: usize) -> Vec<f64> {
    let n = adjacency.len();
    let mut order = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut paths = vec![0.0_f64; n];
    let mut distance: Vec<Option<usize>> = vec![None; n];
    let mut queue = VecDeque::new();

    paths[source] = 1.0;
    distance[source] = Some(0);
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        order.push(v);
        let Some(dv) = distance[v] else { continue };
        for &w in &adjacency[v] {
            if distance[w].is_none() {
                distance[w] = Some(dv + 1);
                queue.push_back(w);
            }
            if distance[w] == Some(dv + 1) {
                paths[w] += paths[v];
                predecessors[w].push(v);
            }
        }
    }

    let mut dependency = vec![0.0_f64; n];
    let mut result = vec![0.0_f64; n];
    while let Some(w) = order.pop() {
        for &v in &predecessors[w] {
            dependency[v] += paths[v] / paths[w] * (1.0 + dependency[w]);
        }
        if w != source {
            result[w] = dependency[w];
        }
    }
    result
}

/// Degree counts for every node, with betweenness when the graph has more
/// than one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Centrality {
    pub in_degree: BTreeMap<String, usize>,
    pub out_degree: BTreeMap<String, usize>,
    pub betweenness: Option<Scores>,
}

pub fn centrality(graph: &LinkGraph) -> Centrality {
    let mut centrality = degree_centrality(graph);
    if graph.node_count() > 1 {
        centrality.betweenness = Some(betweenness(graph));
    }
    centrality
}

/// In- and out-degree only. `betweenness` is left as `None`.
pub fn degree_centrality(graph: &LinkGraph) -> Centrality {
    let inner = graph.inner();
    let mut in_degree = BTreeMap::new();
    let mut out_degree = BTreeMap::new();

    for idx in inner.node_indices() {
        let url = graph.url(idx).to_string();
        in_degree.insert(
            url.clone(),
            inner.neighbors_directed(idx, Direction::Incoming).count(),
        );
        out_degree.insert(url, inner.neighbors_directed(idx, Direction::Outgoing).count());
    }

    Centrality {
        in_degree,
        out_degree,
        betweenness: None,
    }
}

/// Everything computed for one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMetrics {
    pub pagerank: Option<f64>,
    pub hub_score: Option<f64>,
    pub authority_score: Option<f64>,
    pub in_degree: usize,
    pub out_degree: usize,
    pub betweenness: Option<f64>,
}

pub fn node_metrics(
    graph: &LinkGraph,
    pagerank: &Scores,
    hits: &HitsScores,
    centrality: &Centrality,
) -> BTreeMap<String, NodeMetrics> {
    graph
        .urls()
        .map(|url| {
            let metrics = NodeMetrics {
                pagerank: pagerank.get(url).copied(),
                hub_score: hits.hubs.get(url).copied(),
                authority_score: hits.authorities.get(url).copied(),
                in_degree: centrality.in_degree.get(url).copied().unwrap_or(0),
                out_degree: centrality.out_degree.get(url).copied().unwrap_or(0),
                betweenness: centrality
                    .betweenness
                    .as_ref()
                    .and_then(|b| b.get(url).copied()),
            };
            (url.to_string(), metrics)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityTier {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl AuthorityTier {
    pub const ALL: [AuthorityTier; 4] = [
        AuthorityTier::VeryHigh,
        AuthorityTier::High,
        AuthorityTier::Medium,
        AuthorityTier::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorityTier::VeryHigh => "very_high",
            AuthorityTier::High => "high",
            AuthorityTier::Medium => "medium",
            AuthorityTier::Low => "low",
        }
    }
}

/// Buckets URLs by score rank: top 10% `VeryHigh`, top 25% `High`, top 50%
/// `Medium`, the rest `Low`.
///
/// A threshold falls back to 0 when there are too few scores to take that
/// percentile, so small inputs land entirely in the higher tiers. Every tier
/// is present in the result, possibly empty.
pub fn authority_tiers(scores: &Scores) -> BTreeMap<AuthorityTier, Vec<String>> {
    let mut sorted: Vec<f64> = scores.values().copied().collect();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let len = sorted.len();

    let threshold = |min_len: usize, position: usize| {
        if len > min_len { sorted[position] } else { 0.0 }
    };
    let very_high = threshold(10, len / 10);
    let high = threshold(4, len / 4);
    let medium = threshold(2, len / 2);

    let mut tiers: BTreeMap<AuthorityTier, Vec<String>> =
        AuthorityTier::ALL.iter().map(|t| (*t, Vec::new())).collect();

    for (url, &score) in scores {
        let tier = if score >= very_high {
            AuthorityTier::VeryHigh
        } else if score >= high {
            AuthorityTier::High
        } else if score >= medium {
            AuthorityTier::Medium
        } else {
            AuthorityTier::Low
        };
        tiers.entry(tier).or_default().push(url.clone());
    }

    tiers
}
