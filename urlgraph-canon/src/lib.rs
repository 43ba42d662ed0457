pub mod canonical;
pub mod components;
pub mod error;
pub mod normalize;
pub mod parser;
pub mod tracker;

pub use canonical::{Canonicalizer, DomainParts, canonicalize, get_domain_parts};
pub use components::{UrlComponents, extract_components};
pub use error::UrlError;
pub use normalize::{NormalizeOptions, normalize};
pub use parser::{ParsedUrl, QueryMap, parse};
pub use tracker::{DEFAULT_TRACKER_PARAMS, TrackerFilter, remove_tracker_params};
