//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::canonical::{self, ConvertError};
use crate::config::capabilities::ValidatedConfig;
use crate::config::de::DecodeError;
use crate::config::decode::decode_options;
use crate::config::flags::ConfigFlags;
use crate::config::schema::Options;
use crate::config::validation::{validate, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Convert(#[from] ConvertError),

    #[error("failed to decode configuration: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read, convert and decode a JSON configuration file, with `flags` on top.
pub fn load_options(path: &Path, flags: &ConfigFlags) -> Result<Options, ConfigError> {
    let content = fs::read(path).map_err(|source| ConfigError::io(path, source))?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Read configuration file");
    load_options_from_slice(&content, flags)
}

/// Convert and decode an in-memory JSON document, with `flags` on top.
pub fn load_options_from_slice(content: &[u8], flags: &ConfigFlags) -> Result<Options, ConfigError> {
    let mut mapping = canonical::from_json_slice(content)?;
    canonical::overlay(&mut mapping, flags.to_overlay());
    Ok(decode_options(mapping)?)
}

/// Load and validate configuration from a JSON file.
pub fn load_config(path: &Path, flags: &ConfigFlags) -> Result<ValidatedConfig, ConfigError> {
    let options = load_options(path, flags)?;
    Ok(validate(options)?)
}
