use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::PppError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub obs_folder: Option<String>,
    #[serde(default)]
    pub long_folder: Option<String>,
    #[serde(default)]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub obs_folder: Option<Utf8PathBuf>,
    pub long_folder: Option<Utf8PathBuf>,
    pub max_retries: u32,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `ppp-pm.json` (or an explicit path). The default file is
    /// optional; an explicit path must exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, PppError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("ppp-pm.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| PppError::ConfigRead(config_path.clone()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|err| PppError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, PppError> {
        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            obs_folder: config.obs_folder.map(Utf8PathBuf::from),
            long_folder: config.long_folder.map(Utf8PathBuf::from),
            max_retries: config.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        })
    }
}
