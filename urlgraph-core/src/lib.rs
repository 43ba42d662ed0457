pub mod classify;
pub mod config;
pub mod data;
pub mod dedup;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod model;
pub mod report;

pub use classify::{PageType, classify, classify_graph, page_type_distribution, pages_by_type};
pub use config::AnalyzerConfig;
pub use dedup::{CanonicalIndex, CanonicalPartition, DedupSummary, DuplicateGroup};
pub use error::{ConfigError, DataError, MetricError};
pub use graph::{GraphStats, LinkGraph, LinkGraphBuilder, PageNode};
pub use metrics::{AuthorityTier, Centrality, HitsScores, Scores};
pub use model::{PageContent, RecordIndex, UrlRecord};
pub use urlgraph_canon as canon;
