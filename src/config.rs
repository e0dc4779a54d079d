use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::report::notice::DEFAULT_DOCS_URL;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const CONFIG_FILE: &str = ".asyncaction-notice.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .asyncaction-notice.toml.
/// All fields are optional; the hook runs with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// GitHub-specific settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Settings for the posted comment
    #[serde(default)]
    pub notice: NoticeConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// REST API root. If None, falls back to GITHUB_API_URL, then api.github.com.
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoticeConfig {
    /// Link to the AsyncAction indexing guide shown at the end of the comment.
    pub docs_url: Option<String>,
}

impl Config {
    /// Load configuration from .asyncaction-notice.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.is_empty())
    }

    /// Resolve the API root without a trailing slash.
    pub fn api_url(&self) -> String {
        self.github
            .api_url
            .clone()
            .or_else(|| std::env::var("GITHUB_API_URL").ok())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// Link to the index naming convention shown in the comment.
    pub fn docs_url(&self) -> String {
        self.notice
            .docs_url
            .clone()
            .unwrap_or_else(|| DEFAULT_DOCS_URL.to_string())
    }
}
