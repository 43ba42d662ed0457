use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::graph::LinkGraph;

/// Structural role of a page, derived from its in- and out-degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Cornerstone,
    Hub,
    Authority,
    Leaf,
    Orphan,
    Normal,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Cornerstone => "cornerstone",
            PageType::Hub => "hub",
            PageType::Authority => "authority",
            PageType::Leaf => "leaf",
            PageType::Orphan => "orphan",
            PageType::Normal => "normal",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ClassificationRule {
    pub label: PageType,
    pub matches: fn(usize, usize) -> bool,
}

fn is_cornerstone(in_degree: usize, out_degree: usize) -> bool {
    in_degree >= 5 && out_degree >= 3
}

fn is_hub(_in_degree: usize, out_degree: usize) -> bool {
    out_degree >= 10
}

fn is_authority(in_degree: usize, _out_degree: usize) -> bool {
    in_degree >= 5
}

fn is_leaf(_in_degree: usize, out_degree: usize) -> bool {
    out_degree == 0
}

fn is_orphan(in_degree: usize, _out_degree: usize) -> bool {
    in_degree == 0
}

fn always(_in_degree: usize, _out_degree: usize) -> bool {
    true
}

/// Checked in order; the first match wins. The last rule matches everything.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        label: PageType::Cornerstone,
        matches: is_cornerstone,
    },
    ClassificationRule {
        label: PageType::Hub,
        matches: is_hub,
    },
    ClassificationRule {
        label: PageType::Authority,
        matches: is_authority,
    },
    ClassificationRule {
        label: PageType::Leaf,
        matches: is_leaf,
    },
    ClassificationRule {
        label: PageType::Orphan,
        matches: is_orphan,
    },
    ClassificationRule {
        label: PageType::Normal,
        matches: always,
    },
];

pub fn classify(in_degree: usize, out_degree: usize) -> PageType {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| (rule.matches)(in_degree, out_degree))
        .map(|rule| rule.label)
        .unwrap_or(PageType::Normal)
}

pub fn classify_node(graph: &LinkGraph, url: &str) -> Option<PageType> {
    let in_degree = graph.in_degree(url)?;
    let out_degree = graph.out_degree(url)?;
    Some(classify(in_degree, out_degree))
}

pub fn classify_graph(graph: &LinkGraph) -> BTreeMap<String, PageType> {
    graph
        .urls()
        .filter_map(|url| classify_node(graph, url).map(|t| (url.to_string(), t)))
        .collect()
}

/// Node count per page type. Types with no pages are left out.
pub fn page_type_distribution(graph: &LinkGraph) -> BTreeMap<PageType, usize> {
    let mut distribution = BTreeMap::new();
    for page_type in classify_graph(graph).into_values() {
        *distribution.entry(page_type).or_insert(0) += 1;
    }
    distribution
}

pub fn pages_by_type(graph: &LinkGraph) -> BTreeMap<PageType, Vec<String>> {
    let mut grouped: BTreeMap<PageType, Vec<String>> = BTreeMap::new();
    for (url, page_type) in classify_graph(graph) {
        grouped.entry(page_type).or_default().push(url);
    }
    grouped
}
