//! Boss definitions
//!
//! A boss is static data: identity, tier, and the imagery shown with
//! announcements. Definitions can be loaded from TOML files in a directory
//! (one file can hold several bosses) or built directly by the host.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Static definition of a raid boss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossDefinition {
    /// Stable identifier (e.g. "ancient_leviathan")
    pub id: String,

    /// Display name used in announcements
    pub name: String,

    /// Difficulty/rarity tier; drives base HP and reward scaling
    #[serde(default = "default_tier")]
    pub tier: u8,

    /// Imagery attached to announcements
    #[serde(default)]
    pub imagery: BossImagery,
}

fn default_tier() -> u8 {
    2
}

/// Attachment names per announcement kind; absent entries mean no attachment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BossImagery {
    #[serde(default)]
    pub start: Option<String>,

    #[serde(default)]
    pub defense: Option<String>,

    #[serde(default)]
    pub attack: Option<String>,
}

impl BossDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tier: u8) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tier,
            imagery: BossImagery::default(),
        }
    }
}

/// Root structure for boss definition files (TOML)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BossFile {
    #[serde(default, rename = "boss")]
    bosses: Vec<BossDefinition>,
}

/// Errors during boss definition loading
#[derive(Debug, Error)]
pub enum BossFileError {
    #[error("failed to read boss file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse boss TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read boss directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load boss definitions from a single TOML file
pub fn load_bosses_from_file(path: &Path) -> Result<Vec<BossDefinition>, BossFileError> {
    let content = fs::read_to_string(path).map_err(|source| BossFileError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let file: BossFile = toml::from_str(&content).map_err(|source| BossFileError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(file.bosses)
}

/// Load all boss definitions from a directory (non-recursive)
pub fn load_bosses_from_dir(dir: &Path) -> Result<Vec<BossDefinition>, BossFileError> {
    let mut bosses = Vec::new();

    if !dir.exists() {
        return Ok(bosses);
    }

    let entries = fs::read_dir(dir).map_err(|source| BossFileError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            bosses.extend(load_bosses_from_file(&path)?);
        }
    }

    Ok(bosses)
}
