//! Typed access to individual configuration settings by `section.key` name.

use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ConfigFile};
use crate::release::{ReleaseParams, TileSize};

/// One configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    DataCatalogDir,
    DataIndexFile,
    DataLookupFile,
    TilesPath,
    TilesSize,
    TilesRelease,
    TilesGzip,
    SamplerParallel,
    LoggingLevel,
    LoggingFile,
}

const ALL_KEYS: &[ConfigKey] = &[
    ConfigKey::DataCatalogDir,
    ConfigKey::DataIndexFile,
    ConfigKey::DataLookupFile,
    ConfigKey::TilesPath,
    ConfigKey::TilesSize,
    ConfigKey::TilesRelease,
    ConfigKey::TilesGzip,
    ConfigKey::SamplerParallel,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingFile,
];

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        ALL_KEYS
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::DataCatalogDir => "data.catalog_dir",
            ConfigKey::DataIndexFile => "data.index_file",
            ConfigKey::DataLookupFile => "data.lookup_file",
            ConfigKey::TilesPath => "tiles.path",
            ConfigKey::TilesSize => "tiles.size",
            ConfigKey::TilesRelease => "tiles.release",
            ConfigKey::TilesGzip => "tiles.gzip",
            ConfigKey::SamplerParallel => "sampler.parallel",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    pub fn section(&self) -> &'static str {
        self.split().0
    }

    pub fn key_name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        let name = self.name();
        name.split_once('.').unwrap_or((name, ""))
    }

    /// Current value as written to the file; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::DataCatalogDir => config.data.catalog_dir.display().to_string(),
            ConfigKey::DataIndexFile => config.data.index_file.clone(),
            ConfigKey::DataLookupFile => config.data.lookup_file.clone(),
            ConfigKey::TilesPath => config.tiles.path.display().to_string(),
            ConfigKey::TilesSize => config.tiles.size.to_string(),
            ConfigKey::TilesRelease => config.tiles.release.clone(),
            ConfigKey::TilesGzip => config.tiles.gzip.to_string(),
            ConfigKey::SamplerParallel => config.sampler.parallel.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate and store `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: self.name().to_string(),
            value: value.to_string(),
            reason,
        };

        match self {
            ConfigKey::DataCatalogDir => config.data.catalog_dir = non_empty_path(value, invalid)?,
            ConfigKey::DataIndexFile => config.data.index_file = non_empty(value, invalid)?,
            ConfigKey::DataLookupFile => config.data.lookup_file = non_empty(value, invalid)?,
            ConfigKey::TilesPath => config.tiles.path = non_empty_path(value, invalid)?,
            ConfigKey::TilesSize => {
                config.tiles.size = value
                    .parse::<TileSize>()
                    .map_err(|e| invalid(e.to_string()))?
            }
            ConfigKey::TilesRelease => {
                let release = ReleaseParams::for_release(value).map_err(|e| invalid(e.to_string()))?;
                config.tiles.release = release.id;
            }
            ConfigKey::TilesGzip => config.tiles.gzip = parse_bool(value, invalid)?,
            ConfigKey::SamplerParallel => config.sampler.parallel = parse_bool(value, invalid)?,
            ConfigKey::LoggingLevel => {
                value
                    .parse::<tracing::Level>()
                    .map_err(|e| invalid(e.to_string()))?;
                config.logging.level = value.to_ascii_lowercase();
            }
            ConfigKey::LoggingFile => {
                config.logging.file = (!value.is_empty()).then(|| PathBuf::from(value))
            }
        }

        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn non_empty(
    value: &str,
    invalid: impl Fn(String) -> ConfigError,
) -> Result<String, ConfigError> {
    if value.is_empty() {
        return Err(invalid("value must not be empty".to_string()));
    }
    Ok(value.to_string())
}

fn non_empty_path(
    value: &str,
    invalid: impl Fn(String) -> ConfigError,
) -> Result<PathBuf, ConfigError> {
    non_empty(value, invalid).map(PathBuf::from)
}

fn parse_bool(value: &str, invalid: impl Fn(String) -> ConfigError) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid("expected true or false".to_string())),
    }
}
