use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use urlgraph_canon::{Canonicalizer, DEFAULT_TRACKER_PARAMS, NormalizeOptions, TrackerFilter};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/urlgraph/config.json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    pub damping: f64,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iter: 100,
            tolerance: 1.0e-6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitsConfig {
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for HitsConfig {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tolerance: 1.0e-8,
        }
    }
}

/// Analyzer settings. Every field has a default, so a partial file (or none
/// at all) is always usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub tracker_params: Vec<String>,
    pub normalize: NormalizeOptions,
    pub top_n: usize,
    pub pagerank: PageRankConfig,
    pub hits: HitsConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            tracker_params: DEFAULT_TRACKER_PARAMS.iter().map(|s| s.to_string()).collect(),
            normalize: NormalizeOptions::default(),
            top_n: 10,
            pagerank: PageRankConfig::default(),
            hits: HitsConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).to_string())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AnalyzerConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `path` when given. Without one, falls back to the default
    /// location and then to built-in defaults if that file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    info!("No config at {}, using defaults", default_path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let damping = self.pagerank.damping;
        if !(0.0..=1.0).contains(&damping) {
            return Err(ConfigError::Invalid(format!(
                "pagerank.damping must be within [0, 1], got {}",
                damping
            )));
        }
        if self.pagerank.max_iter == 0 || self.hits.max_iter == 0 {
            return Err(ConfigError::Invalid("max_iter must be at least 1".to_string()));
        }
        if !(self.pagerank.tolerance > 0.0) || !(self.hits.tolerance > 0.0) {
            return Err(ConfigError::Invalid("tolerance must be positive".to_string()));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn tracker_filter(&self) -> TrackerFilter {
        TrackerFilter::new(self.tracker_params.iter().cloned())
    }

    pub fn canonicalizer(&self) -> Canonicalizer {
        Canonicalizer::new(self.tracker_filter(), self.normalize)
    }
}
