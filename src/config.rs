//! TOML configuration for `qcode`.
//!
//! Every section and key has a default, so a missing default config file
//! falls back to [`Config::minimal`]. See `config/qcode.example.toml`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// CSV column holding the document text. When unset the column is
    /// guessed from the header.
    #[serde(default)]
    pub text_column: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_skip_blank")]
    pub skip_blank: bool,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            text_column: None,
            delimiter: default_delimiter(),
            skip_blank: default_skip_blank(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_delimiter() -> char {
    ','
}
fn default_skip_blank() -> bool {
    true
}
fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string(), "**/*.csv".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_theme_count")]
    pub theme_count: usize,
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_word_len: default_min_word_len(),
            top_n: default_top_n(),
            theme_count: default_theme_count(),
            extra_stopwords: Vec::new(),
        }
    }
}

fn default_min_word_len() -> usize {
    3
}
fn default_top_n() -> usize {
    20
}
fn default_theme_count() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file is present.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if given; otherwise fall back to `default_path` when it exists
/// and to [`Config::minimal`] when it does not.
pub fn resolve_config(path: Option<&Path>, default_path: &Path) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None if default_path.exists() => load_config(default_path),
        None => Ok(Config::minimal()),
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.analysis.min_word_len == 0 {
        anyhow::bail!("analysis.min_word_len must be > 0");
    }
    if config.analysis.top_n == 0 {
        anyhow::bail!("analysis.top_n must be >= 1");
    }
    if config.analysis.theme_count == 0 {
        anyhow::bail!("analysis.theme_count must be >= 1");
    }
    if !config.ingest.delimiter.is_ascii() {
        anyhow::bail!("ingest.delimiter must be a single ASCII character");
    }
    if let Some(col) = &config.ingest.text_column {
        if col.trim().is_empty() {
            anyhow::bail!("ingest.text_column must not be empty when set");
        }
    }
    Ok(())
}
