//! Engine configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::FillBlankKey;

/// Settings that shape how sessions are run and scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `next()` requires the current question to be answered.
    #[serde(default = "default_true")]
    pub require_answer_to_advance: bool,
    /// Answer key used for fill-blank questions.
    #[serde(default)]
    pub fill_blank_key: FillBlankKey,
    /// Decimal places kept in the percentage.
    #[serde(default = "default_precision")]
    pub score_precision: u32,
}

fn default_true() -> bool {
    true
}

fn default_precision() -> u32 {
    2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            require_answer_to_advance: true,
            fill_blank_key: FillBlankKey::default(),
            score_precision: default_precision(),
        }
    }
}

/// Load config from an explicit path, or search the well-known paths.
///
/// Search order without a path:
/// 1. `lingoquiz.toml` in the current directory
/// 2. `~/.config/lingoquiz/config.toml`
///
/// Environment variable override: `LINGOQUIZ_FILL_BLANK_KEY`.
pub fn load_config_from(path: Option<&Path>) -> Result<EngineConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("lingoquiz.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if let Ok(key) = std::env::var("LINGOQUIZ_FILL_BLANK_KEY") {
        config.fill_blank_key = key
            .parse()
            .map_err(|e: String| anyhow::anyhow!("LINGOQUIZ_FILL_BLANK_KEY: {e}"))?;
    }

    Ok(config)
}

/// Parse a TOML config string.
pub fn parse_config_str(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content)?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("lingoquiz"))
}
