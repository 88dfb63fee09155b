//! Application configuration.
//!
//! Values are layered: built-in defaults, then the TOML file under the user's
//! config directory, then `FACTORY_LEDGER_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "factory-ledger";
/// File name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "FACTORY_LEDGER";

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the store document.
    pub data_dir: PathBuf,
    /// File name of the store document inside `data_dir`.
    pub store_file: String,
    /// Directory receiving log files.
    pub log_dir: PathBuf,
    /// Tab created when the store holds none.
    pub default_tab: String,
    /// Show fully exploded shopping lists by default.
    pub exploded_totals: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            log_dir: data_dir.join("logs"),
            data_dir,
            store_file: "games.json".to_string(),
            default_tab: "default".to_string(),
            exploded_totals: false,
        }
    }
}

impl AppConfig {
    /// Load from the default config file location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load using `path` as the config file. A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = AppConfig::default();
        let settings = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("store_file", defaults.store_file)?
            .set_default("log_dir", defaults.log_dir.to_string_lossy().to_string())?
            .set_default("default_tab", defaults.default_tab)?
            .set_default("exploded_totals", defaults.exploded_totals)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .context("invalid configuration values")?;
        Ok(config)
    }

    /// Full path of the store document.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }

    /// Same configuration with the data directory replaced.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    fn to_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self).context("failed to serialize configuration")?;
        Ok(format!("# Factory Ledger configuration\n{body}"))
    }
}

/// Location of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Write a configuration file with default values unless one exists.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, AppConfig::default().to_toml()?)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        let defaults = AppConfig::default();
        assert_eq!(config.store_file, defaults.store_file);
        assert_eq!(config.default_tab, "default");
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "data_dir = '/tmp/ledger'\nstore_file = 'mars.json'\nexploded_totals = true\n",
        )?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ledger"));
        assert_eq!(config.store_path(), PathBuf::from("/tmp/ledger/mars.json"));
        assert!(config.exploded_totals);
        Ok(())
    }

    #[test]
    fn quotes_in_values_survive_a_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        let config = AppConfig {
            default_tab: "Ada's \"base\"".to_string(),
            ..AppConfig::default()
        }
        .with_data_dir(dir.path().join("it's here"));
        fs::write(&path, config.to_toml()?)?;

        let loaded = AppConfig::load_from(&path)?;
        assert_eq!(loaded.default_tab, "Ada's \"base\"");
        assert_eq!(loaded.data_dir, dir.path().join("it's here"));
        Ok(())
    }

    #[test]
    fn environment_overrides_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "exploded_totals = false\n")?;
        std::env::set_var("FACTORY_LEDGER_EXPLODED_TOTALS", "true");
        let config = AppConfig::load_from(&path);
        std::env::remove_var("FACTORY_LEDGER_EXPLODED_TOTALS");
        assert!(config?.exploded_totals);
        Ok(())
    }

    #[test]
    fn default_file_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        let written = fs::read_to_string(&path)?;
        assert!(written.contains("store_file = \"games.json\""));

        fs::write(&path, "default_tab = 'Mine'\n")?;
        write_default_config(&path)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.default_tab, "Mine");
        Ok(())
    }
}
