//! User configuration file.
//!
//! Settings live in an INI file at `~/.config/wssa/config.ini` (platform
//! config directory). Every setting is optional:
//!
//! ```ini
//! [data]
//! catalog_dir = /data/wssa
//! index_file = wisetile-index-allsky.fits
//! lookup_file = pixel_lookup.fits
//!
//! [tiles]
//! path = /data/wssa/tiles
//! size = large
//! release = 1.0
//! gzip = false
//!
//! [sampler]
//! parallel = true
//!
//! [logging]
//! level = info
//! file = /var/log/wssa.log
//! ```
//!
//! `WISE_DATA` and `WISE_TILE` override the catalog directory and tile path
//! when set; see [`ConfigFile::apply_env`].

mod keys;

pub use keys::ConfigKey;

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{DEFAULT_INDEX_FILE, DEFAULT_LOOKUP_FILE};
use crate::logging::{LoggingConfig, DEFAULT_LOG_LEVEL};
use crate::release::{ReleaseError, ReleaseParams, TileGeometry, TileSize, DEFAULT_RELEASE};
use crate::sampler::SamplerConfig;

/// Environment variable naming the catalog directory.
pub const DATA_DIR_ENV_VAR: &str = "WISE_DATA";

/// Environment variable naming the tile raster directory.
pub const TILE_PATH_ENV_VAR: &str = "WISE_TILE";

/// Errors from reading, writing, or editing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Location of the catalog tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSettings {
    pub catalog_dir: PathBuf,
    pub index_file: String,
    pub lookup_file: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            catalog_dir: PathBuf::from("."),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            lookup_file: DEFAULT_LOOKUP_FILE.to_string(),
        }
    }
}

/// Location and variant of the tile rasters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSettings {
    pub path: PathBuf,
    pub size: TileSize,
    pub release: String,
    pub gzip: bool,
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            size: TileSize::default(),
            release: DEFAULT_RELEASE.to_string(),
            gzip: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerSettings {
    pub parallel: bool,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self { parallel: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub data: DataSettings,
    pub tiles: TileSettings,
    pub sampler: SamplerSettings,
    pub logging: LoggingSettings,
    /// File this configuration was loaded from, and is saved to.
    path: Option<PathBuf>,
}

/// Default configuration file location.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wssa")
        .join("config.ini")
}

impl ConfigFile {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(config_file_path())
    }

    /// Load from `path`; a missing file yields defaults bound to `path`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default().with_path(path));
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_ini(&ini)?;
        config.path = Some(path.to_path_buf());

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (section, properties) in ini.iter() {
            let Some(section) = section else { continue };
            for (key, value) in properties.iter() {
                match format!("{section}.{key}").parse::<ConfigKey>() {
                    Ok(config_key) => config_key.set(&mut config, value)?,
                    Err(_) => warn!(section, key, "Ignoring unknown config key"),
                }
            }
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini
    }

    /// Write to the file this configuration was loaded from, or the
    /// default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = self.path.clone().unwrap_or_else(config_file_path);
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        self.to_ini().write_to_file(path).map_err(write_error)?;

        debug!(path = %path.display(), "Saved config file");
        Ok(())
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Apply `WISE_DATA` / `WISE_TILE` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply directory overrides from `lookup` (environment variable name
    /// to value). Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(DATA_DIR_ENV_VAR).filter(|v| !v.is_empty()) {
            self.data.catalog_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(TILE_PATH_ENV_VAR).filter(|v| !v.is_empty()) {
            self.tiles.path = PathBuf::from(dir);
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.data.catalog_dir.join(&self.data.index_file)
    }

    pub fn lookup_path(&self) -> PathBuf {
        self.data.catalog_dir.join(&self.data.lookup_file)
    }

    pub fn release_params(&self) -> Result<ReleaseParams, ReleaseError> {
        ReleaseParams::for_release(&self.tiles.release)
    }

    pub fn geometry(&self) -> TileGeometry {
        self.tiles.size.geometry()
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig::default().with_parallel(self.sampler.parallel)
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::default()
            .with_level(self.logging.level.clone())
            .with_file(self.logging.file.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.data.catalog_dir, PathBuf::from("."));
        assert_eq!(config.index_path(), PathBuf::from("./wisetile-index-allsky.fits"));
        assert_eq!(config.lookup_path(), PathBuf::from("./pixel_lookup.fits"));
        assert_eq!(config.tiles.size, TileSize::Large);
        assert_eq!(config.tiles.release, "1.0");
        assert!(!config.tiles.gzip);
        assert!(config.sampler.parallel);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_sections() {
        let config = ConfigFile::parse(
            "[data]\ncatalog_dir = /data/wssa\n\n\
             [tiles]\npath = /data/tiles\nsize = small\ngzip = yes\n\n\
             [sampler]\nparallel = false\n\n\
             [logging]\nlevel = debug\n",
        )
        .unwrap();

        assert_eq!(config.data.catalog_dir, PathBuf::from("/data/wssa"));
        assert_eq!(config.tiles.path, PathBuf::from("/data/tiles"));
        assert_eq!(config.tiles.size, TileSize::Small);
        assert!(config.tiles.gzip);
        assert!(!config.sampler.parallel);
        assert!(!config.sampler_config().parallel);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.geometry().side_pixels(), 3000);
    }

    #[test]
    fn test_parse_rejects_bad_value() {
        let err = ConfigFile::parse("[tiles]\nsize = medium\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let config = ConfigFile::parse("[tiles]\ncolour = blue\n").unwrap();
        assert_eq!(config.tiles, TileSettings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default().with_path(&path);
        config.tiles.path = PathBuf::from("/srv/tiles");
        config.tiles.gzip = true;
        config.logging.file = Some(PathBuf::from("/tmp/wssa.log"));
        config.save().unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.path(), Some(path.as_path()));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ini");
        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.tiles, TileSettings::default());
        assert_eq!(config.path(), Some(path.as_path()));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConfigFile::default();
        config.apply_overrides(|name| match name {
            DATA_DIR_ENV_VAR => Some("/env/data".to_string()),
            TILE_PATH_ENV_VAR => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.data.catalog_dir, PathBuf::from("/env/data"));
        // empty value leaves the setting alone
        assert_eq!(config.tiles.path, PathBuf::from("."));
    }

    #[test]
    fn test_unknown_release_surfaces() {
        let mut config = ConfigFile::default();
        config.tiles.release = "9.9".to_string();
        assert!(matches!(
            config.release_params(),
            Err(ReleaseError::UnknownRelease(_))
        ));
    }
}
