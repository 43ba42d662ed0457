use std::collections::HashSet;

use crate::parser::ParsedUrl;

/// Analytics and click-tracking keys stripped when no list is configured.
pub const DEFAULT_TRACKER_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "msclkid",
];

/// A set of query keys that carry no meaning for resource identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerFilter {
    keys: HashSet<String>,
}

impl TrackerFilter {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn common() -> Self {
        Self::new(DEFAULT_TRACKER_PARAMS.iter().copied())
    }

    /// Exact, case-sensitive match on the decoded key.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns a copy of `parsed` without any tracked query key.
    pub fn remove_from(&self, parsed: &ParsedUrl) -> ParsedUrl {
        let mut url = parsed.clone();
        url.query.retain(|key| !self.contains(key));
        url
    }
}

pub fn remove_tracker_params(parsed: &ParsedUrl, trackers: &TrackerFilter) -> ParsedUrl {
    trackers.remove_from(parsed)
}
