use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::IntentLabel;

pub const DEFAULT_KEY: &str = "default";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed reading response catalog at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("response catalog at {path} is not a JSON object of strings")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("response catalog at {path} has no \"default\" entry")]
    MissingDefault { path: PathBuf },
}

/// Intent → template replies, immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct ResponseCatalog {
    templates: HashMap<String, String>,
}

impl ResponseCatalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let templates: HashMap<String, String> =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if !templates.contains_key(DEFAULT_KEY) {
            return Err(CatalogError::MissingDefault {
                path: path.to_path_buf(),
            });
        }

        Ok(Self { templates })
    }

    pub fn from_map(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    /// Template for `intent`, falling back to `default`, then to "".
    pub fn lookup(&self, intent: &IntentLabel) -> &str {
        self.templates
            .get(intent.as_str())
            .or_else(|| self.templates.get(DEFAULT_KEY))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn contains(&self, intent: &IntentLabel) -> bool {
        self.templates.contains_key(intent.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn intents(&self) -> Vec<&str> {
        let mut keys = self.templates.keys().map(String::as_str).collect::<Vec<_>>();
        keys.sort_unstable();
        keys
    }
}
