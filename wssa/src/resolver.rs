//! Celestial coordinate → tile and in-tile pixel position.
//!
//! ```text
//!  (ra, dec) deg
//!      │  theta = (90 − dec)°, phi = ra°
//!      ▼
//!  ring index @ lookup nside ──► PixelTileLookup ──► TileRecord (ra0, dec0)
//!      │                                                   │
//!      └────────── gnomonic projection about (ra0, dec0) ◄─┘
//!                          │  + crpix on both axes
//!                          ▼
//!                   (tile, x, y) raster pixels, (0, 0) lower left
//! ```

use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewD, Zip};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{CatalogError, TileCatalog, TileId};
use crate::projection::TangentPlane;
use crate::release::TileGeometry;

/// Errors from coordinate resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// ra and dec do not have the same shape.
    #[error("ra has shape {ra:?} but dec has shape {dec:?}")]
    ShapeMismatch { ra: Vec<usize>, dec: Vec<usize> },

    /// The sphere pixel has no tile (nside/table mismatch).
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Where one coordinate lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TilePosition {
    pub tile: TileId,
    /// Raster column coordinate (may fall slightly outside the tile).
    pub x: f64,
    /// Raster row coordinate.
    pub y: f64,
}

/// Resolved positions for a flat batch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedTiles {
    pub tiles: Vec<TileId>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl ResolvedTiles {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn position(&self, index: usize) -> TilePosition {
        TilePosition {
            tile: self.tiles[index],
            x: self.x[index],
            y: self.y[index],
        }
    }
}

/// Resolved positions shaped like the input arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArrays {
    pub tiles: ArrayD<i32>,
    pub x: ArrayD<f64>,
    pub y: ArrayD<f64>,
}

/// Maps (ra, dec) in degrees to a tile id and raster pixel coordinates.
///
/// Holds the shared catalog plus one precomputed tangent plane per tile.
#[derive(Debug, Clone)]
pub struct CoordinateResolver {
    catalog: Arc<TileCatalog>,
    geometry: TileGeometry,
    planes: Vec<TangentPlane>,
}

impl CoordinateResolver {
    pub fn new(catalog: Arc<TileCatalog>, geometry: TileGeometry) -> Self {
        let scale = geometry.scale();
        let planes = catalog
            .tiles()
            .iter()
            .map(|t| TangentPlane::new(t.ra.to_radians(), t.dec.to_radians(), scale))
            .collect();

        Self {
            catalog,
            geometry,
            planes,
        }
    }

    pub fn catalog(&self) -> &Arc<TileCatalog> {
        &self.catalog
    }

    pub fn geometry(&self) -> TileGeometry {
        self.geometry
    }

    /// Tile owning `(ra, dec)` without projecting.
    pub fn tile_for(&self, ra: f64, dec: f64) -> Result<TileId, CatalogError> {
        let theta = (90.0 - dec).to_radians();
        let phi = ra.to_radians();
        let pixel = self
            .catalog
            .lookup()
            .pixelizer()
            .angle_to_index(theta, phi);
        Ok(self.catalog.tile_for_pixel(pixel)?.id)
    }

    /// Resolve one coordinate.
    #[inline]
    pub fn resolve_one(&self, ra: f64, dec: f64) -> Result<TilePosition, CatalogError> {
        let tile = self.tile_for(ra, dec)?;
        let (x, y) = self.planes[tile.index()].project(ra.to_radians(), dec.to_radians());
        let crpix = self.geometry.crpix();

        Ok(TilePosition {
            tile,
            x: x + crpix,
            y: y + crpix,
        })
    }

    /// Resolve equal-length coordinate slices.
    ///
    /// # Returns
    ///
    /// Tile ids and pixel coordinates in input order. The first coordinate
    /// with no lookup entry fails the whole batch.
    pub fn resolve(&self, ra: &[f64], dec: &[f64]) -> Result<ResolvedTiles, ResolveError> {
        if ra.len() != dec.len() {
            return Err(ResolveError::ShapeMismatch {
                ra: vec![ra.len()],
                dec: vec![dec.len()],
            });
        }

        let mut resolved = ResolvedTiles {
            tiles: Vec::with_capacity(ra.len()),
            x: Vec::with_capacity(ra.len()),
            y: Vec::with_capacity(ra.len()),
        };
        for (&r, &d) in ra.iter().zip(dec) {
            let position = self.resolve_one(r, d)?;
            resolved.tiles.push(position.tile);
            resolved.x.push(position.x);
            resolved.y.push(position.y);
        }
        Ok(resolved)
    }

    /// Resolve arrays of any (equal) shape, preserving the shape.
    pub fn resolve_array(
        &self,
        ra: ArrayViewD<'_, f64>,
        dec: ArrayViewD<'_, f64>,
    ) -> Result<ResolvedArrays, ResolveError> {
        if ra.shape() != dec.shape() {
            return Err(ResolveError::ShapeMismatch {
                ra: ra.shape().to_vec(),
                dec: dec.shape().to_vec(),
            });
        }

        let mut tiles = ArrayD::zeros(ra.raw_dim());
        let mut x = ArrayD::zeros(ra.raw_dim());
        let mut y = ArrayD::zeros(ra.raw_dim());
        let mut failure = None;

        Zip::from(&mut tiles)
            .and(&mut x)
            .and(&mut y)
            .and(&ra)
            .and(&dec)
            .for_each(|t, px, py, &r, &d| {
                if failure.is_some() {
                    return;
                }
                match self.resolve_one(r, d) {
                    Ok(position) => {
                        *t = i32::from(position.tile);
                        *px = position.x;
                        *py = position.y;
                    }
                    Err(err) => failure = Some(err),
                }
            });

        match failure {
            Some(err) => Err(err.into()),
            None => Ok(ResolvedArrays { tiles, x, y }),
        }
    }
}
