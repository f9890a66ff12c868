//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::resolved::Configuration;
use crate::config::schema::RosettaConfig;
use crate::config::validation::ValidationError;

/// Environment variables that override the file.
pub const MODE_ENV: &str = "MODE";
pub const NETWORK_ENV: &str = "NETWORK";
pub const PORT_ENV: &str = "PORT";
pub const RPC_URL_ENV: &str = "RPCURL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unable to parse {name} {value}")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load the optional file, apply the process environment, validate and
/// resolve.
pub fn load_config(path: Option<&Path>) -> Result<Configuration, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => RosettaConfig::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Configuration::from_config(&config)
}

/// Parse a TOML file without validating it.
pub fn read_config_file(path: &Path) -> Result<RosettaConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides read through `lookup`. Empty values are
/// treated as unset.
pub fn apply_env_overrides<F>(config: &mut RosettaConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(mode) = get(MODE_ENV) {
        config.mode = mode;
    }
    if let Some(network) = get(NETWORK_ENV) {
        config.network = network;
    }
    if let Some(port) = get(PORT_ENV) {
        let parsed = port.parse::<u16>().map_err(|_| ConfigError::Env {
            name: PORT_ENV,
            value: port.clone(),
        })?;
        config.listener.port = Some(parsed);
    }
    if let Some(url) = get(RPC_URL_ENV) {
        config.node.rpc_url = Some(url);
    }
    Ok(())
}
