//! Configuration management for rapports
//!
//! Chunking and retrieval settings, custom heading rules, and persistence
//! of user preferences.

use crate::error::{RapportsError, Result as CoreResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default nominal window size, in characters.
pub const CHUNK_SIZE: usize = 2_000;

/// Default overlap between consecutive windows, in characters.
pub const CHUNK_OVERLAP: usize = 400;

/// Chunks whose trimmed length is at or below this are dropped.
pub const MIN_CHUNK_LENGTH: usize = 150;

/// Default number of chunks returned by a similarity search.
pub const TOP_K: usize = 10;

/// Controlled vocabulary for report themes. Not enforced by the chunker.
pub const KNOWN_THEMES: &[&str] = &[
    "finances publiques",
    "environnement",
    "santé",
    "éducation",
    "emploi et travail",
    "logement",
    "sécurité sociale",
    "collectivités territoriales",
    "IA et numérique",
    "intérieur et défense",
    "justice",
];

/// Top-level chunking algorithm
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Split along detected headings (default)
    #[default]
    Sections,
    /// Fixed-size overlapping windows, no heading detection
    Recursive,
}

impl Strategy {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sections => "sections",
            Self::Recursive => "recursive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "sections" => Some(Self::Sections),
            "recursive" => Some(Self::Recursive),
            _ => None,
        }
    }
}

/// What to do with an oversized section whose title is protected
/// (recommendations, conclusions, summaries, recaps).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProtectionPolicy {
    /// Emit protected sections as a single chunk whatever their length
    #[default]
    KeepWhole,
    /// Split on length only; protecting sections is left to the caller
    Split,
}

impl ProtectionPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::KeepWhole => "keep-whole",
            Self::Split => "split",
        }
    }
}

/// Chunking settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Nominal window size in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive windows
    pub chunk_overlap: usize,
    pub strategy: Strategy,
    /// Chunks at or below this trimmed length are dropped
    pub min_chunk_length: usize,
    pub protection: ProtectionPolicy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            chunk_overlap: CHUNK_OVERLAP,
            strategy: Strategy::default(),
            min_chunk_length: MIN_CHUNK_LENGTH,
            protection: ProtectionPolicy::default(),
        }
    }
}

impl ChunkingConfig {
    /// Reject window sizes the splitter cannot honour.
    pub fn validate(&self) -> CoreResult<()> {
        if self.chunk_size == 0 {
            return Err(RapportsError::InvalidConfig(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RapportsError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks fetched per question
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: TOP_K }
    }
}

/// Heading patterns replacing the built-in rule set of one institution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomRuleSet {
    /// Institution name, matched like any other institution name
    pub institution: String,
    /// Line-anchored regular expressions, highest priority first
    pub patterns: Vec<String>,
}

/// rapports configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub custom_rules: Vec<CustomRuleSet>,
    /// Version of config schema (for future migrations)
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            custom_rules: Vec::new(),
            version: 1,
        }
    }
}

impl Config {
    /// Get the config file path (~/.rapports/config.toml)
    pub fn path() -> Result<PathBuf> {
        Ok(rapports_dir()?.join("config.toml"))
    }

    /// Check if config exists (i.e., not first run)
    pub fn exists() -> bool {
        Self::path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Load config from disk, or return None if it doesn't exist
    pub fn load() -> Result<Option<Self>> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    /// Load config from an explicit file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
        config.chunking.validate()?;
        Ok(config)
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}

/// Get the base rapports directory path (~/.rapports)
pub fn rapports_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".rapports"))
}
