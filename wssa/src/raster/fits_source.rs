//! FITS-backed tile rasters.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{PixelRegion, RasterError, RasterRegion, RasterSource};
use crate::catalog::TileRecord;
use crate::fits::FitsFile;

/// Reads tile regions from `<root>/<file_name>[.gz]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitsRasterSource {
    root: PathBuf,
    gzip: bool,
}

impl FitsRasterSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            gzip: false,
        }
    }

    /// Read `.gz` compressed tile files.
    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn gzip(&self) -> bool {
        self.gzip
    }

    /// Full path of a tile's raster file.
    pub fn tile_path(&self, tile: &TileRecord) -> PathBuf {
        let path = self.root.join(&tile.file_name);
        if self.gzip {
            let mut name = path.into_os_string();
            name.push(".gz");
            PathBuf::from(name)
        } else {
            path
        }
    }
}

impl RasterSource for FitsRasterSource {
    fn read_region(
        &self,
        tile: &TileRecord,
        extension: usize,
        region: PixelRegion,
    ) -> Result<RasterRegion, RasterError> {
        let path = self.tile_path(tile);
        let fits_error = |source| RasterError::Fits {
            tile: tile.id,
            path: path.clone(),
            source,
        };

        debug!(
            tile = %tile.id,
            extension,
            region = %region,
            file = %path.display(),
            "Reading tile region"
        );

        let mut fits = FitsFile::open(&path).map_err(fits_error)?;
        let section = fits
            .read_section(extension, region.x0..region.x1, region.y0..region.y1)
            .map_err(fits_error)?;

        Ok(RasterRegion::from_section(section))
    }
}
