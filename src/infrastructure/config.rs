//! Runtime configuration: an optional TOML file, overridden by CLI flags.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not determine a home directory")]
    NoHomeDirectory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where the store's records live.
    pub data_dir: Option<PathBuf>,
    /// Where CSV exports are written.
    pub export_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("org", "checkin", "checkin").ok_or(ConfigError::NoHomeDirectory)
}

impl Config {
    /// Default config file location, e.g. `~/.config/checkin/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Loads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Fills unset values from `overrides`' set values.
    pub fn merge(self, overrides: Config) -> Self {
        Self {
            data_dir: overrides.data_dir.or(self.data_dir),
            export_dir: overrides.export_dir.or(self.export_dir),
            log_file: overrides.log_file.or(self.log_file),
        }
    }

    pub fn resolved_data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }

    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn resolved_log_file(&self) -> Result<PathBuf, ConfigError> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(self.resolved_data_dir()?.join("checkin.log")),
        }
    }
}
