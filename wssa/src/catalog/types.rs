//! Tile identifiers and records.

use std::fmt;

use serde::Serialize;

/// 1-based tile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TileId(u16);

impl TileId {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    /// 0-based position in the tile table.
    pub fn index(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TileId> for i32 {
    fn from(id: TileId) -> Self {
        id.0 as i32
    }
}

/// One physical tile: where it sits on the sky and which file holds it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileRecord {
    pub id: TileId,
    /// Center right ascension, degrees.
    pub ra: f64,
    /// Center declination, degrees.
    pub dec: f64,
    /// Raster file name relative to the tile directory.
    pub file_name: String,
}

impl TileRecord {
    pub fn new(id: TileId, ra: f64, dec: f64, file_name: impl Into<String>) -> Self {
        Self {
            id,
            ra,
            dec,
            file_name: file_name.into(),
        }
    }
}
