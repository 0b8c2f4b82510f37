//! CLI configuration handling.
//!
//! Settings come from `<config dir>/okto/config.toml` when present. Command
//! line flags override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use okto_core::{ClientConfig, Environment, PollSettings, StoreBackend};
use serde::{Deserialize, Serialize};

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub environment: Option<Environment>,
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub poll: PollSettings,
    pub store: StoreBackend,

    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: Option<String>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub environment: Option<String>,
}

/// Configuration after merging file and flags.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub file: FileConfig,

    /// Path to the configuration file that was consulted.
    pub config_path: PathBuf,
}

impl LoadedConfig {
    pub fn log_level(&self) -> &str {
        self.file.log_level.as_deref().unwrap_or("info")
    }

    pub fn environment(&self, overrides: &Overrides) -> Environment {
        match &overrides.environment {
            Some(label) => Environment::from(label.clone()),
            None => self.file.environment.unwrap_or_default(),
        }
    }

    /// API root the client would talk to. Needs no API key.
    pub fn endpoint(&self, overrides: &Overrides) -> String {
        match &self.file.base_url {
            Some(base_url) => base_url.clone(),
            None => self.environment(overrides).base_url().to_string(),
        }
    }

    /// Build the client configuration, applying command line overrides.
    pub fn client_config(&self, overrides: &Overrides) -> Result<ClientConfig> {
        let api_key = overrides
            .api_key
            .clone()
            .or_else(|| self.file.api_key.clone())
            .filter(|key| !key.is_empty());

        let Some(api_key) = api_key else {
            bail!(
                "No API key configured. Pass --api-key or set api_key in {:?}",
                self.config_path
            );
        };

        let environment = self.environment(overrides);

        let mut config = ClientConfig::new(api_key, environment)
            .with_poll(self.file.poll.clone())
            .with_store(self.file.store.clone());

        if let Some(base_url) = &self.file.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(timeout) = self.file.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {:?}", self.config_path))?;

        Ok(config)
    }
}

/// Load configuration from `path`, or the default location when `None`.
///
/// A missing file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path(),
    };

    let file = if config_path.exists() {
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))?
    } else {
        FileConfig::default()
    };

    Ok(LoadedConfig { file, config_path })
}

pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("okto.toml"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("tech", "okto", "okto")
}
