//! The canonicalization pipeline: parse, drop trackers, normalize, serialize.

use serde::Serialize;
use tracing::trace;

use crate::normalize::{NormalizeOptions, normalize};
use crate::parser::{ParsedUrl, parse};
use crate::tracker::TrackerFilter;

/// Bundles a tracker set with normalization options so that every URL in a
/// batch is canonicalized under the same rules.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    trackers: TrackerFilter,
    options: NormalizeOptions,
}

impl Canonicalizer {
    pub fn new(trackers: TrackerFilter, options: NormalizeOptions) -> Self {
        Self { trackers, options }
    }

    pub fn with_trackers(trackers: TrackerFilter) -> Self {
        Self::new(trackers, NormalizeOptions::default())
    }

    pub fn trackers(&self) -> &TrackerFilter {
        &self.trackers
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    pub fn parse(&self, raw: &str) -> ParsedUrl {
        parse(raw)
    }

    /// Runs the pipeline with each stage switchable. Trackers are always
    /// removed before normalization.
    pub fn clean_parsed(&self, raw: &str, normalize_url: bool, remove_trackers: bool) -> ParsedUrl {
        let mut url = parse(raw);
        if remove_trackers {
            url = self.trackers.remove_from(&url);
        }
        if normalize_url {
            url = normalize(&url, &self.options);
        }
        url
    }

    pub fn clean(&self, raw: &str, normalize_url: bool, remove_trackers: bool) -> String {
        self.clean_parsed(raw, normalize_url, remove_trackers).to_string()
    }

    /// The canonical form of `raw`. Idempotent: feeding the result back in
    /// returns it unchanged.
    pub fn canonicalize(&self, raw: &str) -> String {
        let canonical = self.clean(raw, true, true);
        trace!("{} -> {}", raw, canonical);
        canonical
    }

    pub fn same_resource(&self, a: &str, b: &str) -> bool {
        self.canonicalize(a) == self.canonicalize(b)
    }
}

/// Canonicalizes with default normalization options.
pub fn canonicalize(raw: &str, trackers: &TrackerFilter) -> String {
    let url = normalize(&trackers.remove_from(&parse(raw)), &NormalizeOptions::default());
    url.to_string()
}

/// A hostname split into subdomain, registrable label and TLD.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainParts {
    pub subdomain: String,
    pub domain: String,
    pub tld: String,
}

impl DomainParts {
    pub fn as_tuple(&self) -> (&str, &str, &str) {
        (&self.subdomain, &self.domain, &self.tld)
    }
}

/// Splits the hostname of `raw` on dots: the last label is the TLD, the one
/// before it the domain, anything earlier the subdomain.
///
/// This is a plain string split with no public-suffix lookup, so multi-label
/// suffixes come apart (`example.co.uk` gives `("example", "co", "uk")`).
pub fn get_domain_parts(raw: &str) -> DomainParts {
    let hostname = parse(raw).hostname.to_lowercase();
    let labels: Vec<&str> = hostname.split('.').collect();

    match labels.len() {
        n if n >= 3 => DomainParts {
            subdomain: labels[..n - 2].join("."),
            domain: labels[n - 2].to_string(),
            tld: labels[n - 1].to_string(),
        },
        2 => DomainParts {
            subdomain: String::new(),
            domain: labels[0].to_string(),
            tld: labels[1].to_string(),
        },
        _ => DomainParts {
            subdomain: String::new(),
            domain: labels.first().map(|s| s.to_string()).unwrap_or_default(),
            tld: String::new(),
        },
    }
}
