//! Runtime settings for the scaffolding engine

use crate::error::{Result, ScaffoldError};
use crate::product::ProductConfig;
use std::path::PathBuf;
use url::Url;

/// Resolved settings shared by the fetcher and the workflow.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the template registry
    pub registry_url: Url,
    /// Local template cache; the only place registry names resolve offline
    pub template_dir: PathBuf,
    /// Parent directory for generated workspaces
    pub temp_root: PathBuf,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Version of the running tool, compared against `min_cli_version`
    pub cli_version: String,
    /// Shown alongside version warnings
    pub upgrade_command: String,
}

impl Settings {
    pub fn new(registry_url: Url, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry_url,
            template_dir: template_dir.into(),
            temp_root: std::env::temp_dir(),
            user_agent: concat!("packsmith/", env!("CARGO_PKG_VERSION")).to_string(),
            cli_version: env!("CARGO_PKG_VERSION").to_string(),
            upgrade_command: String::new(),
        }
    }

    /// Resolve settings from a product config and the process environment.
    pub fn from_config<C: ProductConfig>(config: &C, cli_version: &str) -> Result<Self> {
        Self::from_config_with_env(config, cli_version, |key| std::env::var(key).ok())
    }

    /// Like [`Settings::from_config`] with an explicit environment lookup.
    pub fn from_config_with_env<C, F>(config: &C, cli_version: &str, env: F) -> Result<Self>
    where
        C: ProductConfig,
        F: Fn(&str) -> Option<String>,
    {
        let url_str = env(config.registry_url_env())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| config.default_registry_url().to_string());
        let registry_url = Url::parse(&url_str).map_err(|e| ScaffoldError::InvalidOptions {
            message: format!("Invalid template registry URL '{}': {}", url_str, e),
        })?;

        let template_dir = env(config.template_dir_env())
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_template_dir(config.name()));

        Ok(Self {
            registry_url,
            template_dir,
            temp_root: std::env::temp_dir(),
            user_agent: config.user_agent().to_string(),
            cli_version: cli_version.to_string(),
            upgrade_command: config.upgrade_command().to_string(),
        })
    }

    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    pub fn with_template_dir(mut self, template_dir: impl Into<PathBuf>) -> Self {
        self.template_dir = template_dir.into();
        self
    }

    pub fn with_cli_version(mut self, cli_version: impl Into<String>) -> Self {
        self.cli_version = cli_version.into();
        self
    }
}

/// `~/.<product>/templates`, or a temp-dir fallback when there is no home.
fn default_template_dir(product: &str) -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(format!(".{}", product)).join("templates"),
        None => std::env::temp_dir().join(format!("{}-templates", product)),
    }
}
