// ============================================================
// Layer 6: Application Configuration
// ============================================================
// Every tunable of a run in one serialisable struct.
//
// Resolution order (later wins):
//   1. AppConfig::default()   the fixed Cranfield paths
//   2. --config <file.json>   optional JSON file, partial is fine
//   3. CLI flags              applied by Layer 1
//
// Example config.json:
//   {
//     "top_k": 100,
//     "analyzer": { "stopwords": ["the", "of"], "min_len": 2, "max_len": 20 },
//     "expansion": { "strategy": "none" }
//   }
//
// The struct is built once at startup and only read afterwards.
//
// Reference: serde documentation (container attribute `default`)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::analyzer::AnalyzerConfig;
use crate::data::builder::FieldOptions;
use crate::domain::error::{Error, Result};
use crate::ranking::{ExpansionConfig, RankingConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub corpus_path:  PathBuf,
    pub queries_path: PathBuf,
    pub index_dir:    PathBuf,
    pub output_dir:   PathBuf,
    /// Hits kept per query per strategy
    pub top_k:        usize,
    pub analyzer:     AnalyzerConfig,
    pub fields:       FieldOptions,
    pub ranking:      RankingConfig,
    pub expansion:    ExpansionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            corpus_path:  PathBuf::from("cran/cran.all.1400"),
            queries_path: PathBuf::from("cran/cran.qry"),
            index_dir:    PathBuf::from("index"),
            output_dir:   PathBuf::from("results"),
            top_k:        50,
            analyzer:     AnalyzerConfig::default(),
            fields:       FieldOptions::default(),
            ranking:      RankingConfig::default(),
            expansion:    ExpansionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load a (possibly partial) JSON config; missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: AppConfig = serde_json::from_str(&json).map_err(|e| Error::Config {
            path:    path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate(path)?;
        tracing::debug!("Loaded configuration from '{}'", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None    => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Config {
            path:    path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| Error::io(path, e))
    }

    /// Reject settings that would make a run meaningless.
    pub fn validate(&self, origin: &Path) -> Result<()> {
        let problem = if self.analyzer.min_len == 0 || self.analyzer.min_len > self.analyzer.max_len {
            Some("analyzer.min_len must be between 1 and analyzer.max_len")
        } else if self.top_k == 0 {
            Some("top_k must be at least 1")
        } else if self.ranking.strategies.is_empty() {
            Some("ranking.strategies must name at least one strategy")
        } else if self.ranking.search_fields.is_empty() {
            Some("ranking.search_fields must name at least one field")
        } else {
            None
        };
        match problem {
            Some(message) => Err(Error::Config {
                path:    origin.to_path_buf(),
                message: message.to_string(),
            }),
            None => Ok(()),
        }
    }
}
