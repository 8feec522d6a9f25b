//! Top-level value queries.
//!
//! [`ValueService`] ties the pipeline together:
//!
//! ```text
//!  ra[..], dec[..] (any shape)
//!        │ validate shape and range, flatten
//!        ▼
//!  CoordinateResolver ──► (tile, x, y)
//!        │
//!        ▼
//!  TileSampler ──► values (+ per-tile failures)
//!        │ calibrate (continuous only), reshape
//!        ▼
//!  ValueResponse
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ndarray::array;
//! use wssa::config::ConfigFile;
//! use wssa::service::{ValueQuery, ValueService};
//!
//! let mut config = ConfigFile::load()?;
//! config.apply_env();
//! let service = ValueService::from_config(&config)?;
//!
//! let ra = array![[10.0, 10.5], [11.0, 11.5]].into_dyn();
//! let dec = array![[-5.0, -5.0], [-5.5, -5.5]].into_dyn();
//! let response = service.get_value(ra.view(), dec.view(), &ValueQuery::new().calibrated())?;
//! assert_eq!(response.values.shape(), &[2, 2]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod query;

pub use error::{QueryError, ServiceError};
pub use query::{Unit, ValueQuery, ValueResponse, Values};

use std::sync::Arc;

use ndarray::{ArrayD, ArrayView1, ArrayViewD, IxDyn};
use tracing::{debug, info};

use crate::catalog::{CatalogLoader, FitsCatalogLoader, TileCatalog};
use crate::config::ConfigFile;
use crate::raster::{FitsRasterSource, RasterSource};
use crate::release::{ExtensionSpec, ReleaseParams, TileGeometry};
use crate::resolver::{CoordinateResolver, ResolvedArrays};
use crate::sampler::{SampleOutcome, SamplerConfig, Samples, TileSampler};

/// Resolves and samples tile values for arrays of sky coordinates.
///
/// Cheap to share: the catalog and raster source sit behind `Arc`s and
/// queries take `&self`.
pub struct ValueService {
    resolver: CoordinateResolver,
    sampler: TileSampler,
    release: ReleaseParams,
}

impl ValueService {
    /// Build a service over an already loaded catalog.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Tile table and sphere-pixel lookup
    /// * `source` - Where tile raster regions are read from
    /// * `release` - Extension table and calibration factor
    /// * `geometry` - Raster size of the tiles `source` serves
    pub fn new(
        catalog: Arc<TileCatalog>,
        source: Arc<dyn RasterSource>,
        release: ReleaseParams,
        geometry: TileGeometry,
    ) -> Self {
        Self {
            resolver: CoordinateResolver::new(Arc::clone(&catalog), geometry),
            sampler: TileSampler::new(catalog, source, geometry),
            release,
        }
    }

    pub fn with_sampler_config(mut self, config: SamplerConfig) -> Self {
        self.sampler = self.sampler.with_config(config);
        self
    }

    /// Load the catalog with `loader` and build a service.
    pub fn from_loader(
        loader: &dyn CatalogLoader,
        source: Arc<dyn RasterSource>,
        release: ReleaseParams,
        geometry: TileGeometry,
    ) -> Result<Self, ServiceError> {
        let catalog = Arc::new(loader.load()?);
        Ok(Self::new(catalog, source, release, geometry))
    }

    /// Build a service from configuration: FITS catalog tables and FITS
    /// tile rasters at the configured locations.
    pub fn from_config(config: &ConfigFile) -> Result<Self, ServiceError> {
        let release = config.release_params()?;
        let geometry = config.geometry();

        let loader = FitsCatalogLoader::new(config.index_path(), config.lookup_path())
            .with_default_nside(release.lookup_nside);
        let source = FitsRasterSource::new(&config.tiles.path).with_gzip(config.tiles.gzip);

        info!(
            release = %release.id,
            tile_size = %config.tiles.size,
            tiles = %config.tiles.path.display(),
            gzip = config.tiles.gzip,
            "Creating value service"
        );

        Ok(Self::from_loader(&loader, Arc::new(source), release, geometry)?
            .with_sampler_config(config.sampler_config()))
    }

    pub fn release(&self) -> &ReleaseParams {
        &self.release
    }

    pub fn geometry(&self) -> TileGeometry {
        self.resolver.geometry()
    }

    pub fn catalog(&self) -> &Arc<TileCatalog> {
        self.resolver.catalog()
    }

    pub fn resolver(&self) -> &CoordinateResolver {
        &self.resolver
    }

    /// Sample one extension at every `(ra[i], dec[i])`, degrees.
    ///
    /// Output arrays have the input shape, except that 0-d input yields a
    /// one-element 1-d array. Tile read failures do not fail the query;
    /// see [`ValueResponse::into_complete`] for all-or-nothing behaviour.
    ///
    /// # Errors
    ///
    /// * [`QueryError::InputShape`] - `ra` and `dec` shapes differ
    /// * [`QueryError::CoordinateRange`] - `|dec| > 90` or a non-finite value
    /// * [`QueryError::UnknownExtension`] - selector not in the release
    /// * [`QueryError::LookupMiss`] - lookup table does not cover a pixel
    pub fn get_value(
        &self,
        ra: ArrayViewD<'_, f64>,
        dec: ArrayViewD<'_, f64>,
        query: &ValueQuery,
    ) -> Result<ValueResponse, QueryError> {
        let extension = self.release.extension(&query.extension)?;
        let (shape, flat_ra, flat_dec) = flatten_checked(ra, dec)?;

        debug!(
            samples = flat_ra.len(),
            extension = extension.name,
            unit = %query.unit,
            "Value query"
        );

        let resolved = self.resolver.resolve(&flat_ra, &flat_dec)?;
        let outcome = self
            .sampler
            .sample(&resolved.tiles, &resolved.x, &resolved.y, extension)?;

        self.shape_response(outcome, extension, query, &shape)
    }

    /// [`get_value`](Self::get_value) over flat slices.
    pub fn get_values(
        &self,
        ra: &[f64],
        dec: &[f64],
        query: &ValueQuery,
    ) -> Result<ValueResponse, QueryError> {
        self.get_value(
            ArrayView1::from(ra).into_dyn(),
            ArrayView1::from(dec).into_dyn(),
            query,
        )
    }

    /// Tile ids and raster coordinates for every `(ra[i], dec[i])`, with
    /// the same validation as [`get_value`](Self::get_value).
    pub fn resolve(
        &self,
        ra: ArrayViewD<'_, f64>,
        dec: ArrayViewD<'_, f64>,
    ) -> Result<ResolvedArrays, QueryError> {
        let (shape, flat_ra, flat_dec) = flatten_checked(ra, dec)?;
        let resolved = self.resolver.resolve(&flat_ra, &flat_dec)?;

        let tiles = resolved.tiles.iter().map(|&t| i32::from(t)).collect();
        Ok(ResolvedArrays {
            tiles: reshape(tiles, &shape)?,
            x: reshape(resolved.x, &shape)?,
            y: reshape(resolved.y, &shape)?,
        })
    }

    fn shape_response(
        &self,
        outcome: SampleOutcome,
        extension: &ExtensionSpec,
        query: &ValueQuery,
        shape: &[usize],
    ) -> Result<ValueResponse, QueryError> {
        let failed = reshape(outcome.failed_mask(), shape)?;

        let values = match outcome.samples {
            Samples::Continuous(mut v) => {
                if query.unit == Unit::Calibrated && extension.kind.is_calibratable() {
                    let factor = self.release.calibration_factor;
                    for value in &mut v {
                        *value = (f64::from(*value) * factor) as f32;
                    }
                }
                Values::Continuous(reshape(v, shape)?)
            }
            Samples::Categorical(v) => Values::Categorical(reshape(v, shape)?),
        };

        Ok(ValueResponse {
            values,
            failed,
            failures: outcome.failures,
        })
    }
}

/// Validate a coordinate pair and flatten it in logical order.
fn flatten_checked(
    ra: ArrayViewD<'_, f64>,
    dec: ArrayViewD<'_, f64>,
) -> Result<(Vec<usize>, Vec<f64>, Vec<f64>), QueryError> {
    if ra.shape() != dec.shape() {
        return Err(QueryError::InputShape {
            ra: ra.shape().to_vec(),
            dec: dec.shape().to_vec(),
        });
    }

    let flat_ra: Vec<f64> = ra.iter().copied().collect();
    let flat_dec: Vec<f64> = dec.iter().copied().collect();

    if let Some(index) = flat_ra
        .iter()
        .zip(&flat_dec)
        .position(|(r, d)| !r.is_finite() || !d.is_finite() || d.abs() > 90.0)
    {
        return Err(QueryError::CoordinateRange {
            index,
            ra: flat_ra[index],
            dec: flat_dec[index],
        });
    }

    let shape = if ra.ndim() == 0 {
        vec![1]
    } else {
        ra.shape().to_vec()
    };
    Ok((shape, flat_ra, flat_dec))
}

fn reshape<T>(values: Vec<T>, shape: &[usize]) -> Result<ArrayD<T>, QueryError> {
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| QueryError::InputShape {
        ra: shape.to_vec(),
        dec: shape.to_vec(),
    })
}
