use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{DataError, Result};

pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One discovered or crawled URL, as written by the crawler to `urls.jsonl`.
///
/// Timestamps are Unix seconds. Deserialization goes through [`RawUrlRecord`]
/// so that the same checks apply to parsed lines and to [`UrlRecord::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUrlRecord")]
pub struct UrlRecord {
    pub schema_version: u32,
    pub url: String,
    pub url_normalized: String,
    pub depth: u32,
    pub parent_url: Option<String>,
    pub fragments: Vec<String>,
    pub discovered_at: Option<i64>,
    pub queued_at: Option<i64>,
    pub crawled_at: Option<i64>,
    pub response_time_ms: Option<u64>,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub title: Option<String>,
    pub link_count: Option<u64>,
}

#[derive(Deserialize)]
struct RawUrlRecord {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    url: String,
    #[serde(default)]
    url_normalized: String,
    #[serde(default)]
    depth: u32,
    #[serde(default)]
    parent_url: Option<String>,
    #[serde(default)]
    fragments: Option<Vec<String>>,
    #[serde(default)]
    discovered_at: Option<i64>,
    #[serde(default)]
    queued_at: Option<i64>,
    #[serde(default)]
    crawled_at: Option<i64>,
    #[serde(default)]
    response_time_ms: Option<u64>,
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    content_length: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link_count: Option<u64>,
}

impl TryFrom<RawUrlRecord> for UrlRecord {
    type Error = DataError;

    fn try_from(raw: RawUrlRecord) -> Result<Self> {
        let mut record = UrlRecord::new(raw.url, raw.depth, raw.parent_url)?;
        record.schema_version = raw.schema_version;
        if !raw.url_normalized.is_empty() {
            record.url_normalized = raw.url_normalized;
        }
        record.fragments = raw.fragments.unwrap_or_default();
        record.discovered_at = raw.discovered_at;
        record.queued_at = raw.queued_at;
        record.crawled_at = raw.crawled_at;
        record.response_time_ms = raw.response_time_ms;
        record.status_code = raw.status_code;
        record.content_type = raw.content_type;
        record.content_length = raw.content_length;
        record.title = raw.title;
        record.link_count = raw.link_count;
        Ok(record)
    }
}

impl UrlRecord {
    /// Creates a freshly discovered record. An empty `url` is rejected and an
    /// empty `parent_url` is stored as `None`.
    pub fn new(url: impl Into<String>, depth: u32, parent_url: Option<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(DataError::InvalidRecord("url must not be empty".to_string()));
        }

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            url_normalized: url.clone(),
            url,
            depth,
            parent_url: parent_url.filter(|p| !p.is_empty()),
            fragments: Vec::new(),
            discovered_at: None,
            queued_at: None,
            crawled_at: None,
            response_time_ms: None,
            status_code: None,
            content_type: None,
            content_length: None,
            title: None,
            link_count: None,
        })
    }

    pub fn is_root(&self) -> bool {
        self.parent_url.is_none()
    }

    pub fn is_crawled(&self) -> bool {
        self.crawled_at.is_some()
    }

    pub fn discovered_time(&self) -> Option<DateTime<Utc>> {
        self.discovered_at.and_then(timestamp_to_datetime)
    }

    pub fn queued_time(&self) -> Option<DateTime<Utc>> {
        self.queued_at.and_then(timestamp_to_datetime)
    }

    pub fn crawled_time(&self) -> Option<DateTime<Utc>> {
        self.crawled_at.and_then(timestamp_to_datetime)
    }

    /// Copies fetch results from a crawled page onto this record.
    pub fn enrich(&mut self, page: &PageContent, crawled_at: i64) {
        self.crawled_at = Some(crawled_at);
        self.response_time_ms = Some(page.response_time_ms);
        self.status_code = Some(page.status_code);
        self.content_type = page.content_type.clone();
        self.content_length = Some(page.content_length);
        self.title = page.title.clone();
        self.link_count = Some(page.outbound_links.len() as u64);
    }
}

/// Enriches every record whose `url` equals a page's request `url`, stamping
/// it as crawled now. Returns the number of records updated.
pub fn enrich_records(records: &mut [UrlRecord], pages: &[PageContent]) -> usize {
    let mut by_url: HashMap<&str, &PageContent> = HashMap::with_capacity(pages.len());
    for page in pages {
        by_url.entry(page.url.as_str()).or_insert(page);
    }

    let crawled_at = Utc::now().timestamp();
    let mut enriched = 0;
    for record in records.iter_mut() {
        if let Some(page) = by_url.get(record.url.as_str()) {
            record.enrich(page, crawled_at);
            enriched += 1;
        }
    }
    enriched
}

fn timestamp_to_datetime(timestamp: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
}

/// A fetched page with its extracted content and links, as written to
/// `pages.jsonl`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageContent {
    pub url: String,
    pub final_url: String,
    pub status_code: u16,
    pub response_time_ms: u64,
    pub redirect_chain: Vec<String>,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub text_content: Option<String>,
    pub text_length: usize,
    pub json_ld: Vec<serde_json::Value>,
    pub schema_org_types: Vec<String>,
    pub outbound_links: Vec<String>,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub content_type: Option<String>,
    pub content_length: u64,
    pub language: Option<String>,
}

impl PageContent {
    pub fn new(url: impl Into<String>, final_url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            final_url: final_url.into(),
            status_code: 200,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_internal_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.internal_links = links.into_iter().map(Into::into).collect();
        self
    }

    /// The address the page was served from: `final_url`, or `url` when the
    /// final URL was not recorded.
    pub fn identity_url(&self) -> &str {
        if self.final_url.is_empty() {
            &self.url
        } else {
            &self.final_url
        }
    }

    pub fn was_redirected(&self) -> bool {
        !self.final_url.is_empty() && self.final_url != self.url
    }
}

/// Lookup of records by their exact `url` string. The first record wins
/// when a URL appears more than once.
pub struct RecordIndex<'a> {
    by_url: HashMap<&'a str, &'a UrlRecord>,
}

impl<'a> RecordIndex<'a> {
    pub fn new(records: &'a [UrlRecord]) -> Self {
        let mut by_url = HashMap::with_capacity(records.len());
        for record in records {
            by_url.entry(record.url.as_str()).or_insert(record);
        }
        Self { by_url }
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&'a UrlRecord> {
        self.by_url.get(url).copied()
    }

    pub fn parent(&self, record: &UrlRecord) -> Option<&'a UrlRecord> {
        record.parent_url.as_deref().and_then(|url| self.get(url))
    }

    /// Walks parent links from `record` up to the root, nearest first. Stops
    /// at a missing parent or when a URL repeats.
    pub fn ancestry(&self, record: &UrlRecord) -> Vec<&'a UrlRecord> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(record.url.as_str());

        let mut current = self.parent(record);
        while let Some(parent) = current {
            if !seen.insert(parent.url.as_str()) {
                break;
            }
            chain.push(parent);
            current = self.parent(parent);
        }
        chain
    }
}
