//! Catalog loading from persisted tables.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{CatalogError, PixelTileLookup, TileCatalog, TileId, TileRecord};
use crate::fits::{FitsError, FitsFile, TableHdu};

/// File name of the tile index catalog within the data directory.
pub const DEFAULT_INDEX_FILE: &str = "wisetile-index-allsky.fits";

/// File name of the sphere-pixel lookup table within the data directory.
pub const DEFAULT_LOOKUP_FILE: &str = "pixel_lookup.fits";

/// nside assumed when the lookup table header carries no `NSIDE`.
const DEFAULT_LOOKUP_NSIDE: u32 = 64;

/// Source of a [`TileCatalog`].
///
/// Loading happens once, before any query; failure is fatal to the
/// caller.
pub trait CatalogLoader: Send + Sync {
    fn load(&self) -> Result<TileCatalog, CatalogError>;
}

/// Loads the catalog from two FITS binary tables.
///
/// - index table (HDU 1): `RA`, `DEC` (degrees), `FNAME`, optional `TILE`
///   (defaults to row number + 1)
/// - lookup table (HDU 1): `TILE`, optional `PIX` ring index (defaults to
///   row number); `NSIDE` from the table or primary header
#[derive(Debug, Clone, PartialEq)]
pub struct FitsCatalogLoader {
    index_file: PathBuf,
    lookup_file: PathBuf,
    default_nside: u32,
}

impl FitsCatalogLoader {
    pub fn new(index_file: impl Into<PathBuf>, lookup_file: impl Into<PathBuf>) -> Self {
        Self {
            index_file: index_file.into(),
            lookup_file: lookup_file.into(),
            default_nside: DEFAULT_LOOKUP_NSIDE,
        }
    }

    /// Loader for the default file names inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(DEFAULT_INDEX_FILE), dir.join(DEFAULT_LOOKUP_FILE))
    }

    /// nside used when the lookup file has no `NSIDE` keyword.
    pub fn with_default_nside(mut self, nside: u32) -> Self {
        self.default_nside = nside;
        self
    }

    pub fn index_file(&self) -> &Path {
        &self.index_file
    }

    pub fn lookup_file(&self) -> &Path {
        &self.lookup_file
    }

    fn load_tiles(&self) -> Result<Vec<TileRecord>, CatalogError> {
        let path = &self.index_file;
        let fits_error = |source: FitsError| CatalogError::Fits {
            path: path.clone(),
            source,
        };

        let mut fits = FitsFile::open(path).map_err(fits_error)?;
        let table = fits.table(1).map_err(fits_error)?;

        let ra: Vec<f64> = fits.column(&table, "RA").map_err(fits_error)?;
        let dec: Vec<f64> = fits.column(&table, "DEC").map_err(fits_error)?;
        let names: Vec<String> = fits.column(&table, "FNAME").map_err(fits_error)?;
        let ids = optional_ids(&mut fits, &table, "TILE").map_err(fits_error)?;

        (0..table.rows())
            .map(|row| -> Result<TileRecord, CatalogError> {
                let id = match &ids {
                    Some(ids) => ids[row],
                    None => row as i64 + 1,
                };
                let id = u16::try_from(id).map_err(|_| CatalogError::NonContiguousIds {
                    expected: row as u32 + 1,
                    found: id,
                })?;
                Ok(TileRecord::new(
                    TileId::new(id),
                    ra[row],
                    dec[row],
                    names[row].trim_end(),
                ))
            })
            .collect()
    }

    fn load_lookup(&self) -> Result<PixelTileLookup, CatalogError> {
        let path = &self.lookup_file;
        let fits_error = |source: FitsError| CatalogError::Fits {
            path: path.clone(),
            source,
        };

        let mut fits = FitsFile::open(path).map_err(fits_error)?;
        let nside = [1, 0]
            .into_iter()
            .find_map(|hdu| fits.read_key::<i64>(hdu, "NSIDE"))
            .map(|n| u32::try_from(n).unwrap_or(0))
            .unwrap_or(self.default_nside);
        let table = fits.table(1).map_err(fits_error)?;

        let tiles: Vec<TileId> = fits
            .column::<i64>(&table, "TILE")
            .map_err(fits_error)?
            .into_iter()
            .enumerate()
            .map(|(pixel, tile)| {
                u16::try_from(tile)
                    .map(TileId::new)
                    .map_err(|_| CatalogError::DanglingTile {
                        pixel: pixel as u64,
                        tile,
                    })
            })
            .collect::<Result<_, _>>()?;

        debug!(
            path = %path.display(),
            nside,
            rows = tiles.len(),
            "Read pixel lookup table"
        );

        match optional_ids(&mut fits, &table, "PIX").map_err(fits_error)? {
            Some(pixels) => {
                let pairs: Vec<(i64, TileId)> = pixels.into_iter().zip(tiles).collect();
                PixelTileLookup::from_pairs(nside, &pairs)
            }
            None => PixelTileLookup::new(nside, tiles),
        }
    }
}

impl CatalogLoader for FitsCatalogLoader {
    fn load(&self) -> Result<TileCatalog, CatalogError> {
        let tiles = self.load_tiles()?;
        let lookup = self.load_lookup()?;
        let catalog = TileCatalog::new(tiles, lookup)?;

        info!(
            tiles = catalog.len(),
            nside = catalog.lookup_nside(),
            index = %self.index_file.display(),
            "Loaded tile catalog"
        );
        Ok(catalog)
    }
}

fn optional_ids(
    fits: &mut FitsFile,
    table: &TableHdu,
    column: &str,
) -> Result<Option<Vec<i64>>, FitsError> {
    if table.has_column(column) {
        fits.column(table, column).map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitsio::tables::{ColumnDataType, ColumnDescription, ConcreteColumnDescription};

    fn column(name: &str, data_type: ColumnDataType) -> ConcreteColumnDescription {
        ColumnDescription::new(name)
            .with_type(data_type)
            .create()
            .unwrap()
    }

    fn write_index(path: &Path, with_ids: bool) {
        let mut columns = vec![
            column("RA", ColumnDataType::Double),
            column("DEC", ColumnDataType::Float),
            ColumnDescription::new("FNAME")
                .with_type(ColumnDataType::String)
                .that_repeats(20)
                .create()
                .unwrap(),
        ];
        if with_ids {
            columns.push(column("TILE", ColumnDataType::Short));
        }

        let mut fptr = fitsio::FitsFile::create(path).open().unwrap();
        let hdu = fptr.create_table("INDEX".to_string(), &columns).unwrap();
        hdu.write_col(&mut fptr, "RA", &[0.0f64, 180.0][..]).unwrap();
        hdu.write_col(&mut fptr, "DEC", &[45.0f32, -45.0][..]).unwrap();
        hdu.write_col(
            &mut fptr,
            "FNAME",
            &["north.fits".to_string(), "south.fits".to_string()][..],
        )
        .unwrap();
        if with_ids {
            hdu.write_col(&mut fptr, "TILE", &[1i32, 2][..]).unwrap();
        }
    }

    fn write_lookup(path: &Path, tiles: Vec<i32>, pixels: Option<Vec<i32>>) {
        let mut columns = vec![column("TILE", ColumnDataType::Int)];
        if pixels.is_some() {
            columns.push(column("PIX", ColumnDataType::Int));
        }

        let mut fptr = fitsio::FitsFile::create(path).open().unwrap();
        let hdu = fptr.create_table("LOOKUP".to_string(), &columns).unwrap();
        hdu.write_col(&mut fptr, "TILE", &tiles).unwrap();
        if let Some(pixels) = pixels {
            hdu.write_col(&mut fptr, "PIX", &pixels).unwrap();
        }
        hdu.write_key(&mut fptr, "NSIDE", 1i64).unwrap();
    }

    #[test]
    fn test_loads_index_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&dir.path().join(DEFAULT_INDEX_FILE), false);
        let tiles: Vec<i32> = (0..12).map(|p| if p < 6 { 1 } else { 2 }).collect();
        write_lookup(&dir.path().join(DEFAULT_LOOKUP_FILE), tiles, None);

        let catalog = FitsCatalogLoader::from_dir(dir.path()).load().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup_nside(), 1);
        assert_eq!(catalog.tile(TileId::new(2)).unwrap().dec, -45.0);
        assert_eq!(catalog.tile_for_pixel(0).unwrap().file_name, "north.fits");
        assert_eq!(catalog.tile_for_pixel(11).unwrap().file_name, "south.fits");
    }

    #[test]
    fn test_lookup_with_pixel_column() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&dir.path().join(DEFAULT_INDEX_FILE), true);
        let pixels: Vec<i32> = (0..12).rev().collect();
        let tiles: Vec<i32> = pixels.iter().map(|&p| if p == 0 { 2 } else { 1 }).collect();
        write_lookup(&dir.path().join(DEFAULT_LOOKUP_FILE), tiles, Some(pixels));

        let catalog = FitsCatalogLoader::from_dir(dir.path()).load().unwrap();
        assert_eq!(catalog.tile_for_pixel(0).unwrap().id, TileId::new(2));
        assert_eq!(catalog.tile_for_pixel(1).unwrap().id, TileId::new(1));
    }

    #[test]
    fn test_wrong_lookup_length() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&dir.path().join(DEFAULT_INDEX_FILE), false);
        write_lookup(&dir.path().join(DEFAULT_LOOKUP_FILE), vec![1; 10], None);

        let err = FitsCatalogLoader::from_dir(dir.path()).load().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::LookupSize {
                expected: 12,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = FitsCatalogLoader::from_dir(dir.path()).load().unwrap_err();
        match err {
            CatalogError::Fits { path, .. } => {
                assert!(path.ends_with(DEFAULT_INDEX_FILE));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_INDEX_FILE);
        let mut fptr = fitsio::FitsFile::create(&path).open().unwrap();
        let hdu = fptr
            .create_table("INDEX".to_string(), &[column("RA", ColumnDataType::Double)])
            .unwrap();
        hdu.write_col(&mut fptr, "RA", &[1.0f64][..]).unwrap();
        drop(fptr);

        let err = FitsCatalogLoader::from_dir(dir.path()).load().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Fits {
                source: FitsError::ColumnNotFound(_),
                ..
            }
        ));
    }
}
