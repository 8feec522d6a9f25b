//! Tile raster access.
//!
//! The sampler never reads whole tiles. It asks a [`RasterSource`] for the
//! bounding [`PixelRegion`] of the samples that fall on one tile, and gets
//! back a [`RasterRegion`] holding just those pixels:
//!
//! ```text
//!   tile raster (side × side)
//!   ┌─────────────────────────┐
//!   │        x0        x1     │
//!   │     y1 ┌─────────┐      │
//!   │        │ · ·   · │      │   samples on this tile
//!   │        │   ·  ·  │      │
//!   │     y0 └─────────┘      │
//!   └─────────────────────────┘
//!  (0, 0)
//! ```
//!
//! [`FitsRasterSource`] reads regions from per-tile FITS files, one HDU per
//! extension. Tests substitute procedural sources.

mod fits_source;

pub use fits_source::FitsRasterSource;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::{TileId, TileRecord};
use crate::fits::{FitsError, ImageSection};

/// Errors from reading tile rasters.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The tile file is missing or unreadable.
    #[error("Failed to read tile {tile} from {path}: {source}")]
    Fits {
        tile: TileId,
        path: PathBuf,
        #[source]
        source: FitsError,
    },

    /// The source returned a region other than the one requested.
    #[error("Tile {tile}: requested region {requested}, got {returned}")]
    RegionMismatch {
        tile: TileId,
        requested: PixelRegion,
        returned: PixelRegion,
    },

    /// Any other source-specific failure.
    #[error("Tile {tile} unavailable: {reason}")]
    Unavailable { tile: TileId, reason: String },
}

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)` in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRegion {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
}

impl PixelRegion {
    pub fn new(x0: usize, x1: usize, y0: usize, y1: usize) -> Self {
        Self { x0, x1, y0, y1 }
    }

    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }
}

impl fmt::Display for PixelRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}, {}:{}]", self.y0, self.y1, self.x0, self.x1)
    }
}

/// Pixels of one region of one tile extension.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRegion {
    region: PixelRegion,
    section: ImageSection,
}

impl RasterRegion {
    /// Wrap an image section read from a file.
    pub fn from_section(section: ImageSection) -> Self {
        let region = PixelRegion::new(
            section.x0,
            section.x0 + section.width,
            section.y0,
            section.y0 + section.height,
        );
        Self { region, section }
    }

    /// Build a region by evaluating `f(x, y)` at every tile pixel in it.
    pub fn from_fn(region: PixelRegion, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(region.pixel_count());
        for y in region.y0..region.y1 {
            for x in region.x0..region.x1 {
                values.push(f(x, y));
            }
        }

        Self {
            region,
            section: ImageSection {
                x0: region.x0,
                y0: region.y0,
                width: region.width(),
                height: region.height(),
                values,
            },
        }
    }

    pub fn region(&self) -> PixelRegion {
        self.region
    }

    pub fn width(&self) -> usize {
        self.section.width
    }

    pub fn height(&self) -> usize {
        self.section.height
    }

    /// Value at `(col, row)` relative to the region origin.
    #[inline]
    pub fn value(&self, col: usize, row: usize) -> f64 {
        self.section.value(col, row)
    }
}

/// Reads rectangular pixel regions from tile rasters.
///
/// Implementations are shared across sampler worker threads.
pub trait RasterSource: Send + Sync {
    /// Read `region` of extension (HDU) `extension` of `tile`.
    ///
    /// # Arguments
    ///
    /// * `tile` - Catalog record of the tile to read
    /// * `extension` - Extension ordinal within the tile file
    /// * `region` - Non-empty pixel rectangle inside the tile
    fn read_region(
        &self,
        tile: &TileRecord,
        extension: usize,
        region: PixelRegion,
    ) -> Result<RasterRegion, RasterError>;
}
