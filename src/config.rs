use std::{fs::read_to_string, path::Path, path::PathBuf};

use anyhow::anyhow;
use serde::Deserialize;

use crate::error::SoilQueryError;
use crate::soil::client::SDA_ENDPOINT_VAR;

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory the export artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Soil database endpoint, used when the environment variable is unset.
    #[serde(default)]
    pub sda_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            sda_endpoint: None,
        }
    }
}

impl Config {
    pub fn from_yaml_file(config_filepath: &Path) -> anyhow::Result<Self> {
        if !config_filepath.exists() {
            return Err(anyhow!("Config file {:?} not found", config_filepath));
        }
        let config_contents = read_to_string(config_filepath)?;
        // An empty file is a valid config with every default.
        if config_contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&config_contents)?)
    }

    pub fn sda_endpoint(&self) -> Result<String, SoilQueryError> {
        resolve_sda_endpoint(
            std::env::var(SDA_ENDPOINT_VAR).ok(),
            self.sda_endpoint.as_deref(),
        )
    }
}

/// The environment wins over the config file. Blank values count as unset.
pub fn resolve_sda_endpoint(
    from_env: Option<String>,
    configured: Option<&str>,
) -> Result<String, SoilQueryError> {
    from_env
        .map(|endpoint| endpoint.trim().to_string())
        .filter(|endpoint| !endpoint.is_empty())
        .or_else(|| {
            configured
                .map(str::trim)
                .filter(|endpoint| !endpoint.is_empty())
                .map(str::to_string)
        })
        .ok_or(SoilQueryError::MissingEndpoint(SDA_ENDPOINT_VAR))
}
