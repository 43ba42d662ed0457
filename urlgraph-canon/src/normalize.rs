use serde::{Deserialize, Serialize};

use crate::parser::{ParsedUrl, is_scheme};

/// Independent switches for each normalization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub lowercase_hostname: bool,
    pub remove_www: bool,
    pub remove_default_ports: bool,
    pub remove_trailing_slash: bool,
    pub decode_percent_encoding: bool,
    pub sort_query_params: bool,
    pub remove_fragments: bool,
}

impl NormalizeOptions {
    /// Every step disabled. The authority is still rebuilt from host and port.
    pub fn none() -> Self {
        Self {
            lowercase_hostname: false,
            remove_www: false,
            remove_default_ports: false,
            remove_trailing_slash: false,
            decode_percent_encoding: false,
            sort_query_params: false,
            remove_fragments: false,
        }
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            lowercase_hostname: true,
            remove_www: true,
            remove_default_ports: true,
            remove_trailing_slash: true,
            decode_percent_encoding: true,
            sort_query_params: true,
            remove_fragments: true,
        }
    }
}

/// Applies the enabled steps in a fixed order and returns a new value:
///
/// 1. lowercase hostname
/// 2. strip the `www.` prefix
/// 3. drop `:80` on http and `:443` on https
/// 4. rebuild the authority from hostname and port
/// 5. strip trailing slashes (the root `/` is kept)
/// 6. percent-decode the path
/// 7. sort query keys
/// 8. clear the fragment
pub fn normalize(parsed: &ParsedUrl, options: &NormalizeOptions) -> ParsedUrl {
    let mut url = parsed.clone();

    if options.lowercase_hostname {
        url.hostname = url.hostname.to_lowercase();
    }

    if options.remove_www {
        // Repeated so that `www.www.` hosts settle in one pass.
        while let Some(stripped) = url.hostname.strip_prefix("www.") {
            url.hostname = stripped.to_string();
        }
    }

    if options.remove_default_ports
        && matches!(
            (url.scheme.as_str(), url.port),
            ("http", Some(80)) | ("https", Some(443))
        )
    {
        url.port = None;
    }

    url.authority = build_authority(&url.hostname, url.port);

    if options.remove_trailing_slash && url.path.len() > 1 && url.path.ends_with('/') {
        let trimmed = url.path.trim_end_matches('/');
        url.path = if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
    }

    if options.decode_percent_encoding {
        url.path = decode_path(&url.path, url.scheme.is_empty());
    }

    if options.sort_query_params {
        url.query.sort_keys();
    }

    if options.remove_fragments {
        url.fragment.clear();
    }

    url
}

fn build_authority(hostname: &str, port: Option<u16>) -> String {
    let host = if hostname.contains(':') {
        format!("[{}]", hostname)
    } else {
        hostname.to_string()
    };
    match port {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}

/// Percent-decodes a path.
///
/// Escapes that decode to `/`, `?`, `#` or `%` (and `:` for scheme-less URLs)
/// stay encoded, with uppercase hex, since decoding them would change how the
/// serialized URL splits on the next parse. Byte sequences that are not valid
/// UTF-8 once decoded become U+FFFD.
///
/// For scheme-less URLs, a raw `:` whose decoded prefix now reads as a scheme
/// (`%41:x` decodes to `A:x`) is written back as `%3A`.
fn decode_path(path: &str, scheme_less: bool) -> String {
    let decoded = decode_escapes(path, scheme_less);
    if !scheme_less {
        return decoded;
    }
    match decoded.find(':') {
        Some(idx) if is_scheme(&decoded[..idx]) => {
            format!("{}%3A{}", &decoded[..idx], &decoded[idx + 1..])
        }
        _ => decoded,
    }
}

fn decode_escapes(path: &str, scheme_less: bool) -> String {
    let bytes = path.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let high = bytes.get(i + 1).copied().and_then(hex_value);
            let low = bytes.get(i + 2).copied().and_then(hex_value);
            if let (Some(high), Some(low)) = (high, low) {
                let byte = (high << 4) | low;
                if keeps_escape(byte, scheme_less) {
                    decoded.extend_from_slice(format!("%{:02X}", byte).as_bytes());
                } else {
                    decoded.push(byte);
                }
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    match String::from_utf8(decoded) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

fn keeps_escape(byte: u8, scheme_less: bool) -> bool {
    matches!(byte, b'/' | b'?' | b'#' | b'%') || (scheme_less && byte == b':')
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
