// src/config.rs
//! Board credentials and settings, layered project > global > defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "sprint-points.json";
pub const DEFAULT_BASE_URL: &str = "https://api.trello.com/1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30000;
pub const DEFAULT_LABEL_LOOKUP: LabelLookup = LabelLookup::Board;

/// How label ids are turned into display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LabelLookup {
    /// Fetch the board's label set once and look ids up locally
    Board,
    /// Ask the service for each label id separately
    PerLabel,
}

/// On-disk shape of a config file. Every field may be left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_lookup: Option<LabelLookup>,
}

impl BoardConfigFile {
    /// Reads a config file. A missing file is `Ok(None)`.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: BoardConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(file))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Project,
    Global,
    Default,
}

impl ConfigSource {
    pub fn describe(&self) -> &'static str {
        match self {
            ConfigSource::Project => "Project (./sprint-points.json)",
            ConfigSource::Global => "Global (~/.config/sprint-points/config.json)",
            ConfigSource::Default => "Default",
        }
    }
}

/// Fully resolved configuration handed to the board client.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalBoardConfig {
    pub api_key: String,
    pub api_token: String,
    pub board_id: String,
    pub base_url: String,
    pub timeout_ms: u64,
    pub label_lookup: LabelLookup,
}

impl FinalBoardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("API key cannot be empty");
        }
        if self.api_token.trim().is_empty() {
            anyhow::bail!("API token cannot be empty");
        }
        if self.board_id.trim().is_empty() {
            anyhow::bail!("Board id cannot be empty");
        }
        if self.base_url.trim().is_empty() {
            anyhow::bail!("Base URL cannot be empty");
        }
        if self.timeout_ms == 0 {
            anyhow::bail!("Timeout must be greater than 0");
        }
        Ok(())
    }
}

/// Both config layers as found on disk.
#[derive(Debug, Clone, Default)]
pub struct BoardConfig {
    pub project: Option<BoardConfigFile>,
    pub global: Option<BoardConfigFile>,
}

impl BoardConfig {
    pub fn project_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sprint-points").join("config.json"))
    }

    pub fn load() -> Result<Self> {
        let global_path = Self::global_path();
        Self::load_from(&Self::project_path(), global_path.as_deref())
    }

    pub fn load_from(project_path: &Path, global_path: Option<&Path>) -> Result<Self> {
        let project = BoardConfigFile::read(project_path)?;
        let global = match global_path {
            Some(path) => BoardConfigFile::read(path)?,
            None => None,
        };
        log::debug!(
            "Config layers loaded: project={}, global={}",
            project.is_some(),
            global.is_some()
        );
        Ok(Self { project, global })
    }

    pub fn any_exists(&self) -> bool {
        self.project.is_some() || self.global.is_some()
    }

    fn pick<T>(&self, field: impl Fn(&BoardConfigFile) -> Option<T>) -> Option<(T, ConfigSource)> {
        if let Some(value) = self.project.as_ref().and_then(&field) {
            return Some((value, ConfigSource::Project));
        }
        self.global
            .as_ref()
            .and_then(&field)
            .map(|value| (value, ConfigSource::Global))
    }

    /// Source of a field, for status reporting.
    pub fn source_of<T>(&self, field: impl Fn(&BoardConfigFile) -> Option<T>) -> ConfigSource {
        self.pick(field)
            .map(|(_, source)| source)
            .unwrap_or(ConfigSource::Default)
    }

    pub fn resolve(&self) -> Result<FinalBoardConfig> {
        let required = |name: &str, value: Option<(String, ConfigSource)>| -> Result<String> {
            value.map(|(v, _)| v).with_context(|| {
                format!(
                    "Missing '{}' in configuration. Set it in ./{} or the global config file",
                    name, CONFIG_FILE_NAME
                )
            })
        };

        let resolved = FinalBoardConfig {
            api_key: required("api_key", self.pick(|f| f.api_key.clone()))?,
            api_token: required("api_token", self.pick(|f| f.api_token.clone()))?,
            board_id: required("board_id", self.pick(|f| f.board_id.clone()))?,
            base_url: self
                .pick(|f| f.base_url.clone())
                .map(|(v, _)| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_ms: self
                .pick(|f| f.timeout_ms)
                .map(|(v, _)| v)
                .unwrap_or(DEFAULT_TIMEOUT_MS),
            label_lookup: self
                .pick(|f| f.label_lookup)
                .map(|(v, _)| v)
                .unwrap_or(DEFAULT_LABEL_LOOKUP),
        };

        resolved.validate().context("Invalid board configuration")?;
        Ok(resolved)
    }
}

/// Hides all but the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}
