//! Configuration loading and config file resolution

use crate::{Error, Result, SynthRound};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SYNTH_CONFIG";

/// Config file name looked up in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Logging section of the config file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default tracing level (overridden by RUST_LOG)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_resources() -> PathBuf {
    PathBuf::from("data")
}

/// Migration configuration
///
/// ```toml
/// sources = [
///     "sqlite://synth1.db",
///     "sqlite://synth2.db",
///     "sqlite://synth3.db",
///     "sqlite://synth4.db",
/// ]
/// target = "sqlite://analysis.db"
/// resources = "data"
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SynthConfig {
    /// Legacy database URLs, one per synth round, in chronological order
    pub sources: Vec<String>,
    /// Unified analysis database URL
    pub target: String,
    /// Directory holding the curated resource files
    #[serde(default = "default_resources")]
    pub resources: PathBuf,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SynthConfig {
    /// Build a config directly (tests, embedding)
    pub fn new(sources: Vec<String>, target: impl Into<String>, resources: impl Into<PathBuf>) -> Self {
        Self {
            sources,
            target: target.into(),
            resources: resources.into(),
            logging: LoggingConfig::default(),
        }
    }

    /// Parse and validate TOML config content
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SynthConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file
    ///
    /// A relative `resources` directory is resolved against the config file's folder.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if config.resources.is_relative() {
            if let Some(parent) = path.parent() {
                config.resources = parent.join(&config.resources);
            }
        }

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check the source list has exactly one URL per synth round
    pub fn validate(&self) -> Result<()> {
        if self.sources.len() != SynthRound::ALL.len() {
            return Err(Error::Config(format!(
                "Expected {} source databases (one per synth round), got {}",
                SynthRound::ALL.len(),
                self.sources.len()
            )));
        }
        if let Some(ix) = self.sources.iter().position(|s| s.trim().is_empty()) {
            return Err(Error::Config(format!("Source database {} has an empty URL", ix + 1)));
        }
        if self.target.trim().is_empty() {
            return Err(Error::Config("Target database URL is empty".to_string()));
        }
        Ok(())
    }

    /// Source URL for the given round
    pub fn source(&self, round: SynthRound) -> &str {
        &self.sources[round.index()]
    }
}

/// Config file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. config.toml in the working directory
/// 4. config.toml in the user config directory
/// 5. config.toml in the working directory (reported missing on load)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        debug!("Config path from command line: {}", path.display());
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            debug!("Config path from {}: {}", CONFIG_ENV_VAR, path);
            return PathBuf::from(path);
        }
    }

    // Priority 3: Working directory
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }

    // Priority 4: User config directory
    if let Some(user_config) = dirs::config_dir().map(|d| d.join("synth").join(CONFIG_FILE_NAME)) {
        if user_config.exists() {
            return user_config;
        }
    }

    local
}
