use crate::index::DfMode;
use crate::persist::DEFAULT_INDEX_FILE;
use crate::selection::SelectionStrategy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for an [`IndexService`](crate::service::IndexService).
///
/// Every field has a default, so a JSON config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// File name of the index blob inside the workspace.
    pub index_file_name: String,
    /// Seed corpus the vocabulary is fitted on when the workspace has none yet.
    pub corpus: Vec<String>,
    /// `top_k` used by searches that do not ask for one.
    pub default_top_k: usize,
    pub selection: SelectionStrategy,
    pub df_mode: DfMode,
    pub stemming: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            index_file_name: DEFAULT_INDEX_FILE.to_string(),
            corpus: ["hello", "he", "she", "ball", "ski", "sport", "football"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_top_k: 2,
            selection: SelectionStrategy::default(),
            df_mode: DfMode::default(),
            stemming: true,
        }
    }
}

impl ServiceConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Ok(Self::default()),
        }
    }
}
