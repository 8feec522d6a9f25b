//! Tile raster geometry.

use std::fmt;
use std::str::FromStr;

use super::ReleaseError;

/// Side length of every tile on the sky, in degrees.
pub const TILE_SIDE_DEGREES: f64 = 12.5;

/// The two raster resolutions the tiles are published at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileSize {
    /// 8000 × 8000 pixels, 5.625 arcsec per pixel.
    #[default]
    Large,
    /// 3000 × 3000 pixels, 15 arcsec per pixel.
    Small,
}

impl TileSize {
    pub fn side_pixels(self) -> u32 {
        match self {
            TileSize::Large => 8000,
            TileSize::Small => 3000,
        }
    }

    /// Pixel scale in arcseconds per pixel.
    pub fn pixel_scale_arcsec(self) -> f64 {
        match self {
            TileSize::Large => 5.625,
            TileSize::Small => 15.0,
        }
    }

    pub fn geometry(self) -> TileGeometry {
        TileGeometry::new(self.side_pixels(), TILE_SIDE_DEGREES)
    }

    pub fn name(self) -> &'static str {
        match self {
            TileSize::Large => "large",
            TileSize::Small => "small",
        }
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TileSize {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "large" | "8k" => Ok(TileSize::Large),
            "small" | "3k" => Ok(TileSize::Small),
            other => Err(ReleaseError::InvalidTileSize(other.to_string())),
        }
    }
}

/// Pixel geometry shared by every tile of one size.
///
/// Tiles are square gnomonic projections centered on their catalog
/// position. Pixel `(0, 0)` is the lower-left corner and the tangent point
/// sits at [`crpix`](Self::crpix) on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGeometry {
    side_pixels: u32,
    side_degrees: f64,
}

impl TileGeometry {
    /// Create a geometry with a custom raster size.
    ///
    /// The published tiles use [`TileSize::geometry`]; other sizes are
    /// useful for small synthetic rasters.
    pub fn new(side_pixels: u32, side_degrees: f64) -> Self {
        Self {
            side_pixels,
            side_degrees,
        }
    }

    pub fn side_pixels(&self) -> u32 {
        self.side_pixels
    }

    pub fn side_degrees(&self) -> f64 {
        self.side_degrees
    }

    /// Projection scale in pixels per radian.
    pub fn scale(&self) -> f64 {
        (self.side_pixels as f64 / self.side_degrees).to_degrees()
    }

    /// Reference pixel of the tangent point, `side/2 - 0.5`.
    pub fn crpix(&self) -> f64 {
        self.side_pixels as f64 / 2.0 - 0.5
    }

    /// Largest valid pixel coordinate on either axis.
    pub fn max_pixel(&self) -> u32 {
        self.side_pixels.saturating_sub(1)
    }
}

impl Default for TileGeometry {
    fn default() -> Self {
        TileSize::default().geometry()
    }
}
