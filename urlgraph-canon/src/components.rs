use serde::Serialize;

use crate::parser::{ParsedUrl, QueryMap, parse};

/// Flat breakdown of a URL for grouping and reporting.
#[derive(Debug, Clone, Serialize)]
pub struct UrlComponents {
    pub scheme: String,
    pub hostname: String,
    pub port: Option<u16>,
    pub path: String,
    pub query_params: QueryMap,
    pub fragment: String,
    pub full_domain: String,
    pub path_segments: Vec<String>,
    pub path_depth: usize,
    pub has_query: bool,
    pub has_fragment: bool,
    pub query_param_count: usize,
}

impl UrlComponents {
    pub fn from_parsed(parsed: &ParsedUrl) -> Self {
        let path_segments: Vec<String> = parsed
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self {
            scheme: parsed.scheme.clone(),
            hostname: parsed.hostname.clone(),
            port: parsed.port,
            path: parsed.path.clone(),
            query_params: parsed.query.clone(),
            fragment: parsed.fragment.clone(),
            full_domain: parsed.authority.clone(),
            path_depth: path_segments.len(),
            path_segments,
            has_query: !parsed.query.is_empty(),
            has_fragment: !parsed.fragment.is_empty(),
            query_param_count: parsed.query.len(),
        }
    }
}

pub fn extract_components(raw: &str) -> UrlComponents {
    UrlComponents::from_parsed(&parse(raw))
}
