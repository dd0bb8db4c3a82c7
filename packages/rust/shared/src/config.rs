//! Application configuration for Notebase.
//!
//! User config lives at `~/.notebase/notebase.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NotebaseError, Result};
use crate::types::DEFAULT_LANGUAGE;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "notebase.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".notebase";

// ---------------------------------------------------------------------------
// Config structs (matching notebase.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Markdown ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Duplicate detection settings.
    #[serde(default)]
    pub dedup: DedupConfig,
}

/// `[ingest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Reject headings that skip a nesting level.
    #[serde(default = "default_true")]
    pub strict_headings: bool,

    /// Language recorded for fences without an info string.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// File extensions picked up when walking directories.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            strict_headings: true,
            default_language: default_language(),
            extensions: default_extensions(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_language() -> String {
    DEFAULT_LANGUAGE.into()
}
fn default_extensions() -> Vec<String> {
    vec!["md".into(), "markdown".into()]
}

/// `[dedup]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Fraction of shared tokens above which two bodies are duplicates.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.6
}

impl AppConfig {
    /// Check value ranges that TOML typing cannot express.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.dedup.similarity_threshold)?;

        if self.ingest.default_language.trim().is_empty() {
            return Err(NotebaseError::config("ingest.default_language must not be empty"));
        }
        if self.ingest.extensions.is_empty() {
            return Err(NotebaseError::config("ingest.extensions must list at least one extension"));
        }
        Ok(())
    }
}

/// Ensure a similarity threshold lies within `[0, 1]`.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(NotebaseError::config(format!(
            "similarity_threshold must be within [0, 1], got {threshold}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.notebase/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NotebaseError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.notebase/notebase.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NotebaseError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        NotebaseError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;

    tracing::debug!(?path, "loaded config");
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NotebaseError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| NotebaseError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NotebaseError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
