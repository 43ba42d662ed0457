//! Lenient URL splitting.
//!
//! `url::Url::parse` rejects relative and malformed input and rewrites what it
//! accepts (lowercased hosts, dropped default ports, re-encoded paths). Grouping
//! code needs the opposite: a split that always succeeds and keeps every
//! component exactly as written, so that each rewrite is an explicit,
//! toggleable step in [`crate::normalize`].

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::fmt;
use tracing::debug;
use url::form_urlencoded;

use crate::error::{Result, UrlError};

/// Schemes that always serialize with a `//` authority marker, even when the
/// authority itself is empty.
const NETLOC_SCHEMES: &[&str] = &[
    "http", "https", "ftp", "ftps", "ws", "wss", "file", "sftp", "git", "svn", "svn+ssh",
    "telnet", "nntp", "rtsp", "imap",
];

/// Query parameters as an ordered multimap.
///
/// Keys keep the order of their first appearance; repeated keys collect their
/// values in the order they were seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryMap {
    /// Decodes an `application/x-www-form-urlencoded` query string. Blank
    /// values are kept (`a=` and a bare `a` both give `a -> [""]`).
    pub fn parse(query: &str) -> Self {
        let mut map = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            map.append(key.into_owned(), value.into_owned());
        }
        map
    }

    pub fn append(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.entries.retain(|(k, _)| keep(k));
    }

    /// Sorts keys lexicographically. The sort is stable and values inside a key
    /// are not reordered.
    pub fn sort_keys(&mut self) {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
    }

    /// Re-encodes the map, one `key=value` pair per value.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.entries {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl Serialize for QueryMap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

/// A URL split into its components.
///
/// Values are produced by [`parse`] and by the normalization functions, which
/// always return a fresh `ParsedUrl` rather than editing their input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedUrl {
    /// Lowercased scheme, empty when the input has none.
    pub scheme: String,
    /// Network location as written (`user@host:port`), or as rebuilt by
    /// normalization (`host:port`).
    pub authority: String,
    pub hostname: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: QueryMap,
    pub fragment: String,
    /// The string this value was parsed from.
    pub original: String,
}

impl ParsedUrl {
    /// Converts to a WHATWG [`url::Url`]. That parser is stricter than
    /// [`parse`], so this can fail for degraded values.
    pub fn to_url(&self) -> Result<url::Url> {
        let serialized = self.to_string();
        if self.scheme.is_empty() {
            return Err(UrlError::MissingScheme(serialized));
        }
        if self.hostname.is_empty()
            && self.scheme != "file"
            && NETLOC_SCHEMES.contains(&self.scheme.as_str())
        {
            return Err(UrlError::MissingHost(serialized));
        }
        url::Url::parse(&serialized).map_err(|source| UrlError::InvalidUrl {
            url: serialized,
            source,
        })
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }

        // A path starting with `//` must keep an explicit (possibly empty)
        // authority in front of it or it would be re-read as one.
        let with_authority = !self.authority.is_empty()
            || self.path.starts_with("//")
            || NETLOC_SCHEMES.contains(&self.scheme.as_str());

        if with_authority {
            write!(f, "//{}", self.authority)?;
            if !self.path.is_empty() && !self.path.starts_with('/') {
                f.write_str("/")?;
            }
        }
        f.write_str(&self.path)?;

        if !self.query.is_empty() {
            write!(f, "?{}", self.query.encode())?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

/// Splits `raw` into components. Never fails: anything that cannot be
/// recognised is left empty or absent.
pub fn parse(raw: &str) -> ParsedUrl {
    let (scheme, rest) = split_scheme(raw);

    let (authority, rest) = match rest.strip_prefix("//") {
        Some(after) => {
            let end = after
                .find(|c: char| matches!(c, '/' | '?' | '#'))
                .unwrap_or(after.len());
            (&after[..end], &after[end..])
        }
        None => ("", rest),
    };

    let (rest, fragment) = rest.split_once('#').unwrap_or((rest, ""));
    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
    let (hostname, port) = split_host_port(authority);

    ParsedUrl {
        scheme,
        authority: authority.to_string(),
        hostname,
        port,
        path: path.to_string(),
        query: QueryMap::parse(query),
        fragment: fragment.to_string(),
        original: raw.to_string(),
    }
}

fn split_scheme(raw: &str) -> (String, &str) {
    if let Some(idx) = raw.find(':') {
        let candidate = &raw[..idx];
        if is_scheme(candidate) {
            return (candidate.to_ascii_lowercase(), &raw[idx + 1..]);
        }
    }
    (String::new(), raw)
}

/// True when `candidate` is a letter followed by letters, digits, `+`, `-`
/// or `.`, which is what `parse` accepts in front of the first `:`.
pub(crate) fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn split_host_port(authority: &str) -> (String, Option<u16>) {
    let hostinfo = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);

    let (host, port) = match hostinfo.strip_prefix('[') {
        Some(bracketed) => match bracketed.split_once(']') {
            Some((host, after)) => (host, after.strip_prefix(':').unwrap_or("")),
            None => (bracketed, ""),
        },
        None => hostinfo.split_once(':').unwrap_or((hostinfo, "")),
    };

    (host.to_string(), parse_port(authority, port))
}

fn parse_port(authority: &str, port: &str) -> Option<u16> {
    if port.is_empty() {
        return None;
    }
    let parsed = if port.bytes().all(|b| b.is_ascii_digit()) {
        port.parse::<u16>().ok()
    } else {
        None
    };
    if parsed.is_none() {
        debug!("Ignoring unparseable port in authority {:?}", authority);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_url() {
        let parsed = parse("HTTP://user@WWW.Example.COM:8080/a/b?x=1&y=2&x=3#top");
        assert_eq!(parsed.scheme, "http");
        assert_eq!(parsed.authority, "user@WWW.Example.COM:8080");
        assert_eq!(parsed.hostname, "WWW.Example.COM");
        assert_eq!(parsed.port, Some(8080));
        assert_eq!(parsed.path, "/a/b");
        assert_eq!(parsed.query.get("x"), Some(&["1".to_string(), "3".to_string()][..]));
        assert_eq!(parsed.query.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(parsed.fragment, "top");
    }

    #[test]
    fn test_parse_empty_string() {
        let parsed = parse("");
        assert_eq!(parsed, ParsedUrl::default());
    }

    #[test]
    fn test_parse_without_scheme() {
        let parsed = parse("example.com/path");
        assert_eq!(parsed.scheme, "");
        assert_eq!(parsed.hostname, "");
        assert_eq!(parsed.path, "example.com/path");
    }

    #[test]
    fn test_parse_without_path() {
        let parsed = parse("https://example.com");
        assert_eq!(parsed.hostname, "example.com");
        assert_eq!(parsed.path, "");
    }

    #[test]
    fn test_parse_invalid_port_degrades() {
        let parsed = parse("http://example.com:99999/x");
        assert_eq!(parsed.hostname, "example.com");
        assert_eq!(parsed.port, None);

        let parsed = parse("http://example.com:abc/x");
        assert_eq!(parsed.port, None);
    }

    #[test]
    fn test_parse_ipv6_host() {
        let parsed = parse("http://[::1]:3000/");
        assert_eq!(parsed.hostname, "::1");
        assert_eq!(parsed.port, Some(3000));
    }

    #[test]
    fn test_parse_garbage_does_not_panic() {
        for raw in ["::::", "%%%", "http://[", "?#", "//", "a:b:c", "#?/", "\u{0}\u{7f}"] {
            let parsed = parse(raw);
            assert_eq!(parsed.original, raw);
        }
    }

    #[test]
    fn test_display_round_trips_components() {
        let raw = "https://example.com:8443/a?b=1#frag";
        assert_eq!(parse(raw).to_string(), raw);
    }

    #[test]
    fn test_display_keeps_empty_authority_marker() {
        assert_eq!(parse("http:///x").to_string(), "http:///x");
        assert_eq!(parse("////a").to_string(), "////a");
    }

    #[test]
    fn test_query_blank_values_kept() {
        let query = QueryMap::parse("a=&b&c=1");
        assert_eq!(query.get("a"), Some(&[String::new()][..]));
        assert_eq!(query.get("b"), Some(&[String::new()][..]));
        assert_eq!(query.encode(), "a=&b=&c=1");
    }

    #[test]
    fn test_to_url_rejects_missing_host() {
        assert!(matches!(
            parse("http:///x").to_url(),
            Err(UrlError::MissingHost(_))
        ));
        assert!(matches!(
            parse("example.com").to_url(),
            Err(UrlError::MissingScheme(_))
        ));
        assert!(parse("https://example.com/a").to_url().is_ok());
    }
}
