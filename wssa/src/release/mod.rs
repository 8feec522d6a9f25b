//! Release parameters for the WSSA tile set.
//!
//! Everything that differs between data releases or tile variants lives
//! here, in one parameterized structure rather than per-release copies:
//!
//! - [`TileGeometry`] - raster side length, projection scale, reference pixel
//! - [`ExtensionSpec`] - the named data layers in each tile and how to sample them
//! - [`ReleaseParams`] - tile count, lookup nside, calibration factor
//!
//! # Example
//!
//! ```
//! use wssa::release::{ExtensionKind, ExtensionSelector, ReleaseParams, TileSize};
//!
//! let release = ReleaseParams::for_release("1.0").unwrap();
//! let mask = release.extension(&"amsk".parse::<ExtensionSelector>().unwrap()).unwrap();
//! assert_eq!(mask.kind, ExtensionKind::Categorical);
//!
//! let geometry = TileSize::Large.geometry();
//! assert_eq!(geometry.crpix(), 3999.5);
//! ```

mod extension;
mod geometry;

pub use extension::{ExtensionKind, ExtensionSelector, ExtensionSpec};
pub use geometry::{TileGeometry, TileSize, TILE_SIDE_DEGREES};

use thiserror::Error;

/// Default data release identifier.
pub const DEFAULT_RELEASE: &str = "1.0";

/// Errors from release parameter lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseError {
    /// No parameter table exists for this release identifier.
    #[error("Unknown data release '{0}' (supported: 1.0)")]
    UnknownRelease(String),

    /// The extension selector matches no extension in the release.
    #[error("Unknown extension '{selector}' for release {release}")]
    UnknownExtension { release: String, selector: String },

    /// Tile size name is neither "large" nor "small".
    #[error("Invalid tile size '{0}': expected large or small")]
    InvalidTileSize(String),
}

/// Release 1.0 extension table.
const EXTENSIONS_1_0: &[ExtensionSpec] = &[
    ExtensionSpec::continuous(0, "clean", "W3 DN, compact sources and artifacts removed"),
    ExtensionSpec::continuous(1, "dirt", "W3 DN, before compact source removal"),
    ExtensionSpec::continuous(2, "cov", "Integer coverage count"),
    ExtensionSpec::continuous(3, "min", "W3 DN, minimum over exposures"),
    ExtensionSpec::continuous(4, "max", "W3 DN, maximum over exposures"),
    ExtensionSpec::categorical(5, "amsk", "AND bit-mask"),
    ExtensionSpec::categorical(6, "omsk", "OR bit-mask"),
    ExtensionSpec::continuous(7, "art", "W3 DN, artifact model"),
];

/// Parameters of one data release.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseParams {
    /// Release identifier, e.g. "1.0".
    pub id: String,
    /// Number of tiles; tile ids run from 1 to this value.
    pub tile_count: u16,
    /// nside of the pixel-to-tile lookup table.
    pub lookup_nside: u32,
    /// Multiplier from native W3 DN to MJy/sr.
    pub calibration_factor: f64,
    extensions: &'static [ExtensionSpec],
}

impl ReleaseParams {
    /// Look up the parameter table for a release identifier.
    pub fn for_release(id: &str) -> Result<Self, ReleaseError> {
        match id.trim() {
            "1.0" | "1" => Ok(Self::release_1_0()),
            other => Err(ReleaseError::UnknownRelease(other.to_string())),
        }
    }

    fn release_1_0() -> Self {
        Self {
            id: DEFAULT_RELEASE.to_string(),
            tile_count: 430,
            lookup_nside: 64,
            calibration_factor: 0.0135172,
            extensions: EXTENSIONS_1_0,
        }
    }

    /// All extensions in ordinal order.
    pub fn extensions(&self) -> &'static [ExtensionSpec] {
        self.extensions
    }

    /// The extension sampled when none is requested.
    pub fn default_extension(&self) -> &'static ExtensionSpec {
        &self.extensions[0]
    }

    /// Resolve an extension selector against this release.
    pub fn extension(
        &self,
        selector: &ExtensionSelector,
    ) -> Result<&'static ExtensionSpec, ReleaseError> {
        let found = match selector {
            ExtensionSelector::Index(index) => self.extensions.iter().find(|e| e.index == *index),
            ExtensionSelector::Name(name) => self
                .extensions
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(name)),
        };

        found.ok_or_else(|| ReleaseError::UnknownExtension {
            release: self.id.clone(),
            selector: selector.to_string(),
        })
    }
}

impl Default for ReleaseParams {
    fn default() -> Self {
        Self::release_1_0()
    }
}
