// FILE: src/config.rs
//! Runtime configuration.
//!
//! Loaded from TOML (`--config PATH`, or `<config_dir>/seekfs/config.toml`
//! when present). Every field has a default, so an empty or missing file is valid.

use crate::error::{Result, SeekError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "SEEKFS_DATA_DIR";

const CATALOG_FILE: &str = "catalog.json";
const DEFAULT_PATHS_FILE: &str = "default_paths.json";
const VECTOR_DIR: &str = "vectors";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the catalog, default paths and vector index live.
    pub data_dir: PathBuf,
    /// Volume roots crawled by fetch/update, in crawl order.
    pub roots: Vec<PathBuf>,
    pub embedding: EmbeddingConfig,
    pub expander: ExpanderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderConfig {
    /// OpenAI-compatible chat completions URL. Expansion is off when unset.
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            roots: default_roots(),
            embedding: EmbeddingConfig::default(),
            expander: ExpanderConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "bge-small-en-v1.5".to_string(),
            batch_size: crate::storage::vec_index::DEFAULT_BATCH_SIZE,
        }
    }
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration. An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if config.embedding.batch_size == 0 {
            return Err(SeekError::Config("embedding.batch_size must be at least 1".into()));
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)
            .map_err(|e| SeekError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::info!("[Config] Loaded {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE)
    }

    pub fn default_paths_path(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_PATHS_FILE)
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.data_dir.join(VECTOR_DIR)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("seekfs").join("config.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("seekfs"))
        .unwrap_or_else(|| PathBuf::from(".seekfs"))
}

/// The host's fixed local drives on Windows; the home directory elsewhere.
pub fn default_roots() -> Vec<PathBuf> {
    #[cfg(windows)]
    {
        (b'A'..=b'Z')
            .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
            .filter(|root| root.is_dir())
            .collect()
    }
    #[cfg(not(windows))]
    {
        dirs::home_dir().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.embedding.batch_size, 1000);
        assert_eq!(config.embedding.model, "bge-small-en-v1.5");
        assert!(config.expander.endpoint.is_none());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = Config::from_toml(
            r#"
            data_dir = "/srv/seekfs"
            roots = ["/mnt/a", "/mnt/b"]

            [embedding]
            batch_size = 250

            [expander]
            endpoint = "http://localhost:8080/v1/chat/completions"
            "#,
        )
        .unwrap();

        assert_eq!(config.roots, vec![PathBuf::from("/mnt/a"), PathBuf::from("/mnt/b")]);
        assert_eq!(config.embedding.batch_size, 250);
        assert_eq!(config.embedding.model, "bge-small-en-v1.5");
        assert_eq!(config.catalog_path(), PathBuf::from("/srv/seekfs/catalog.json"));
        assert_eq!(config.vector_dir(), PathBuf::from("/srv/seekfs/vectors"));
        assert_eq!(config.expander.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(SeekError::Io(_))));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "roots = 5").unwrap();
        assert!(matches!(Config::from_file(&path), Err(SeekError::Config(_))));
    }
}
