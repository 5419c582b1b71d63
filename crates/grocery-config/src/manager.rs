use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{Config, ConfigError, PathResolver};

const STAGING_EXTENSION: &str = "json.tmp";

/// Handles persistence of [`Config`] and resolution of the files it names.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(base_dir: PathBuf, config_path: PathBuf) -> Self {
        Self {
            base_dir,
            config_path,
        }
    }

    /// Manager rooted at `base`, reading `base/config/config.json`.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        let config_path = base.join("config").join("config.json");
        Ok(Self::new(base, config_path))
    }

    /// Manager rooted at [`PathResolver::base_dir`].
    pub fn default_manager() -> Result<Self, ConfigError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Loads the stored config, or the defaults when none was written.
    ///
    /// Keys missing from the file take their default values.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.config_path)?;
        serde_json::from_str(&data).map_err(|err| {
            ConfigError::Serde(format!("{}: {err}", self.config_path.display()))
        })
    }

    /// Writes `config` as pretty JSON, replacing the previous file in one rename.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| ConfigError::Serde(err.to_string()))?;
        replace_file(&self.config_path, json.as_bytes())
    }

    /// Resolves a file named in the config against the base directory.
    pub fn resolve(&self, name: &Path) -> PathBuf {
        PathResolver::resolve_in(&self.base_dir, name)
    }
}

fn replace_file(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let staging = path.with_extension(STAGING_EXTENSION);
    let mut file = File::create(&staging)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&staging, path)?;
    Ok(())
}
