//! User-level configuration shared by every project.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::package::{DEFAULT_INSTALLER_NAME, Environment};
use crate::runtime::Runtime;

/// Keys accepted by [`GlobalConfig::get`] and [`GlobalConfig::set`].
pub const CONFIG_KEYS: &[&str] = &["default-installer", "default-environment"];

/// Defaults applied when installing packages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_installer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_environment: Option<Environment>,
}

impl GlobalConfig {
    /// Installer recorded when an install names none.
    pub fn installer_name(&self) -> &str {
        self.default_installer
            .as_deref()
            .unwrap_or(DEFAULT_INSTALLER_NAME)
    }

    /// Environment recorded when an install names none.
    pub fn environment(&self) -> Environment {
        self.default_environment.unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match key {
            "default-installer" => Ok(self.default_installer.clone()),
            "default-environment" => Ok(self.default_environment.map(|e| e.to_string())),
            _ => anyhow::bail!(
                "Unknown config key '{}'. Expected one of: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "default-installer" => {
                if value.trim().is_empty() {
                    anyhow::bail!("The installer name must not be empty");
                }
                self.default_installer = Some(value.to_string());
            }
            "default-environment" => {
                self.default_environment = Some(value.parse()?);
            }
            _ => anyhow::bail!(
                "Unknown config key '{}'. Expected one of: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

/// Default location of the user config: `<config dir>/pkgreg/config.json`.
pub fn default_config_path<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let config_dir = runtime
        .config_dir()
        .context("Could not determine the user configuration directory")?;
    Ok(config_dir.join("pkgreg").join("config.json"))
}

/// Reads and writes the user config file.
pub struct GlobalConfigStorage<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> GlobalConfigStorage<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Load the config at `path`, or the defaults if there is no file yet.
    pub fn load(&self, path: &Path) -> Result<GlobalConfig> {
        if !self.runtime.exists(path) {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(GlobalConfig::default());
        }

        let content = self.runtime.read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn save(&self, config: &GlobalConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        self.runtime
            .write(path, content.as_bytes())
            .with_context(|| format!("Failed to save config to {:?}", path))
    }
}
