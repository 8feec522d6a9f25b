//! Tile catalog: tile centers, raster files, and the sphere-pixel lookup.
//!
//! The catalog is loaded once at startup and shared read-only:
//!
//! ```text
//!   (theta, phi) ──ring index @ nside 64──► PixelTileLookup ──► TileId
//!                                                                 │
//!                            TileRecord { ra, dec, file_name } ◄──┘
//! ```
//!
//! [`TileCatalog::new`] validates the pairing up front (contiguous ids,
//! full pixel coverage, no dangling tile references), so lookups on a
//! constructed catalog can only miss for out-of-range pixel indices.

mod loader;
mod types;

pub use loader::{CatalogLoader, FitsCatalogLoader, DEFAULT_INDEX_FILE, DEFAULT_LOOKUP_FILE};
pub use types::{TileId, TileRecord};

use std::path::PathBuf;

use thiserror::Error;

use crate::fits::FitsError;
use crate::healpix::{HealpixError, RingPixelizer};

/// Errors from building or querying a tile catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog file could not be read.
    #[error("Failed to read catalog file {path}: {source}")]
    Fits {
        path: PathBuf,
        #[source]
        source: FitsError,
    },

    /// The lookup nside is invalid.
    #[error(transparent)]
    Healpix(#[from] HealpixError),

    #[error("Tile catalog is empty")]
    Empty,

    /// Tile ids are not exactly `1..=n` in order.
    #[error("Tile ids must run 1..=n in order: expected {expected}, found {found}")]
    NonContiguousIds { expected: u32, found: i64 },

    /// The lookup table does not cover every sphere pixel exactly once.
    #[error("Lookup table for nside {nside} needs {expected} pixels, got {actual}")]
    LookupSize {
        nside: u32,
        expected: u64,
        actual: u64,
    },

    /// A pixel appears twice, or a pixel index is outside the sphere.
    #[error("Lookup table pixel {pixel} is duplicated or out of range")]
    BadLookupPixel { pixel: i64 },

    /// A lookup entry names a tile that is not in the catalog.
    #[error("Lookup table maps pixel {pixel} to unknown tile {tile}")]
    DanglingTile { pixel: u64, tile: i64 },

    /// No tile with this id.
    #[error("Unknown tile {0}")]
    UnknownTile(TileId),

    /// A sphere pixel index is outside the lookup table.
    #[error("Sphere pixel {pixel} has no lookup entry (table covers {npix} pixels)")]
    LookupMiss { pixel: u64, npix: u64 },
}

/// Sphere pixel → tile mapping at a fixed nside.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelTileLookup {
    pixelizer: RingPixelizer,
    tiles: Vec<TileId>,
}

impl PixelTileLookup {
    /// Build a lookup from one tile id per ring-ordered pixel.
    pub fn new(nside: u32, tiles: Vec<TileId>) -> Result<Self, CatalogError> {
        let pixelizer = RingPixelizer::new(nside)?;
        if tiles.len() as u64 != pixelizer.npix() {
            return Err(CatalogError::LookupSize {
                nside,
                expected: pixelizer.npix(),
                actual: tiles.len() as u64,
            });
        }
        Ok(Self { pixelizer, tiles })
    }

    /// Build a lookup from `(pixel, tile)` pairs in any order.
    ///
    /// Every pixel must appear exactly once.
    pub fn from_pairs(nside: u32, pairs: &[(i64, TileId)]) -> Result<Self, CatalogError> {
        let pixelizer = RingPixelizer::new(nside)?;
        let npix = pixelizer.npix();
        if pairs.len() as u64 != npix {
            return Err(CatalogError::LookupSize {
                nside,
                expected: npix,
                actual: pairs.len() as u64,
            });
        }

        let mut slots: Vec<Option<TileId>> = vec![None; npix as usize];
        for &(pixel, tile) in pairs {
            let slot = usize::try_from(pixel)
                .ok()
                .and_then(|p| slots.get_mut(p))
                .filter(|s| s.is_none())
                .ok_or(CatalogError::BadLookupPixel { pixel })?;
            *slot = Some(tile);
        }

        // Every slot is filled: npix distinct in-range pixels were written.
        let tiles = slots.into_iter().flatten().collect();
        Ok(Self { pixelizer, tiles })
    }

    pub fn nside(&self) -> u32 {
        self.pixelizer.nside()
    }

    pub fn pixelizer(&self) -> &RingPixelizer {
        &self.pixelizer
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile owning a ring-ordered pixel.
    #[inline]
    pub fn tile_for_pixel(&self, pixel: u64) -> Option<TileId> {
        usize::try_from(pixel)
            .ok()
            .and_then(|p| self.tiles.get(p))
            .copied()
    }

    pub fn entries(&self) -> &[TileId] {
        &self.tiles
    }
}

/// Immutable tile table plus sphere-pixel lookup.
///
/// # Example
///
/// ```
/// use wssa::catalog::{PixelTileLookup, TileCatalog, TileId, TileRecord};
///
/// let tiles = vec![
///     TileRecord::new(TileId::new(1), 0.0, 45.0, "north.fits"),
///     TileRecord::new(TileId::new(2), 0.0, -45.0, "south.fits"),
/// ];
/// // nside 1 has 12 pixels; the northern half goes to tile 1
/// let ids = (0..12).map(|p| TileId::new(if p < 6 { 1 } else { 2 })).collect();
/// let lookup = PixelTileLookup::new(1, ids).unwrap();
///
/// let catalog = TileCatalog::new(tiles, lookup).unwrap();
/// assert_eq!(catalog.tile_for_pixel(11).unwrap().file_name, "south.fits");
/// assert!(catalog.tile_for_pixel(12).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TileCatalog {
    tiles: Vec<TileRecord>,
    lookup: PixelTileLookup,
}

impl TileCatalog {
    /// Validate and assemble a catalog.
    ///
    /// # Arguments
    ///
    /// * `tiles` - Tile records; ids must be exactly `1..=tiles.len()` in order
    /// * `lookup` - Pixel lookup whose entries all name one of `tiles`
    pub fn new(tiles: Vec<TileRecord>, lookup: PixelTileLookup) -> Result<Self, CatalogError> {
        if tiles.is_empty() {
            return Err(CatalogError::Empty);
        }

        for (position, tile) in tiles.iter().enumerate() {
            let expected = position as u32 + 1;
            if tile.id.get() as u32 != expected {
                return Err(CatalogError::NonContiguousIds {
                    expected,
                    found: tile.id.get() as i64,
                });
            }
        }

        let count = tiles.len();
        if let Some((pixel, tile)) = lookup
            .entries()
            .iter()
            .enumerate()
            .find(|(_, id)| id.get() == 0 || id.get() as usize > count)
        {
            return Err(CatalogError::DanglingTile {
                pixel: pixel as u64,
                tile: tile.get() as i64,
            });
        }

        Ok(Self { tiles, lookup })
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[TileRecord] {
        &self.tiles
    }

    pub fn lookup(&self) -> &PixelTileLookup {
        &self.lookup
    }

    pub fn lookup_nside(&self) -> u32 {
        self.lookup.nside()
    }

    pub fn tile(&self, id: TileId) -> Result<&TileRecord, CatalogError> {
        self.tiles
            .get(id.index())
            .filter(|t| t.id == id)
            .ok_or(CatalogError::UnknownTile(id))
    }

    /// Tile owning a ring-ordered pixel at the lookup nside.
    pub fn tile_for_pixel(&self, pixel: u64) -> Result<&TileRecord, CatalogError> {
        let id = self
            .lookup
            .tile_for_pixel(pixel)
            .ok_or(CatalogError::LookupMiss {
                pixel,
                npix: self.lookup.len() as u64,
            })?;
        self.tile(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tiles() -> Vec<TileRecord> {
        vec![
            TileRecord::new(TileId::new(1), 0.0, 45.0, "a.fits"),
            TileRecord::new(TileId::new(2), 180.0, -45.0, "b.fits"),
        ]
    }

    fn split_lookup() -> PixelTileLookup {
        let ids = (0..12)
            .map(|p| TileId::new(if p < 6 { 1 } else { 2 }))
            .collect();
        PixelTileLookup::new(1, ids).unwrap()
    }

    #[test]
    fn test_lookup_size_must_match_nside() {
        let err = PixelTileLookup::new(2, vec![TileId::new(1); 12]).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::LookupSize {
                nside: 2,
                expected: 48,
                actual: 12
            }
        ));
    }

    #[test]
    fn test_lookup_rejects_bad_nside() {
        assert!(matches!(
            PixelTileLookup::new(0, Vec::new()),
            Err(CatalogError::Healpix(_))
        ));
    }

    #[test]
    fn test_lookup_from_shuffled_pairs() {
        let pairs: Vec<(i64, TileId)> = (0..12)
            .rev()
            .map(|p| (p, TileId::new(if p % 2 == 0 { 1 } else { 2 })))
            .collect();
        let lookup = PixelTileLookup::from_pairs(1, &pairs).unwrap();
        assert_eq!(lookup.tile_for_pixel(0), Some(TileId::new(1)));
        assert_eq!(lookup.tile_for_pixel(11), Some(TileId::new(2)));
        assert_eq!(lookup.tile_for_pixel(12), None);
    }

    #[test]
    fn test_lookup_from_pairs_rejects_duplicates() {
        let mut pairs: Vec<(i64, TileId)> = (0..12).map(|p| (p, TileId::new(1))).collect();
        pairs[5].0 = 4;
        assert!(matches!(
            PixelTileLookup::from_pairs(1, &pairs),
            Err(CatalogError::BadLookupPixel { pixel: 4 })
        ));

        pairs[5].0 = -1;
        assert!(matches!(
            PixelTileLookup::from_pairs(1, &pairs),
            Err(CatalogError::BadLookupPixel { pixel: -1 })
        ));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = TileCatalog::new(two_tiles(), split_lookup()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup_nside(), 1);
        assert_eq!(catalog.tile_for_pixel(3).unwrap().file_name, "a.fits");
        assert_eq!(catalog.tile(TileId::new(2)).unwrap().ra, 180.0);
    }

    #[test]
    fn test_catalog_lookup_miss() {
        let catalog = TileCatalog::new(two_tiles(), split_lookup()).unwrap();
        assert!(matches!(
            catalog.tile_for_pixel(99),
            Err(CatalogError::LookupMiss { pixel: 99, npix: 12 })
        ));
        assert!(matches!(
            catalog.tile(TileId::new(3)),
            Err(CatalogError::UnknownTile(_))
        ));
    }

    #[test]
    fn test_catalog_rejects_gaps_in_ids() {
        let mut tiles = two_tiles();
        tiles[1].id = TileId::new(3);
        assert!(matches!(
            TileCatalog::new(tiles, split_lookup()),
            Err(CatalogError::NonContiguousIds {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_catalog_rejects_dangling_lookup() {
        let mut ids = vec![TileId::new(1); 12];
        ids[7] = TileId::new(9);
        let lookup = PixelTileLookup::new(1, ids).unwrap();
        assert!(matches!(
            TileCatalog::new(two_tiles(), lookup),
            Err(CatalogError::DanglingTile { pixel: 7, tile: 9 })
        ));
    }

    #[test]
    fn test_empty_catalog() {
        assert!(matches!(
            TileCatalog::new(Vec::new(), split_lookup()),
            Err(CatalogError::Empty)
        ));
    }
}
