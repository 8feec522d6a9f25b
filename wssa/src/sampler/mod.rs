//! Batched tile raster sampling.
//!
//! Samples are grouped by tile so each tile raster is opened once per
//! batch, however many samples land on it:
//!
//! ```text
//!  input order      stable sort by tile      per-tile groups
//!  i: 0 1 2 3 4  ─►  i: 1 3 0 4 2        ─►  [tile 7: 1 3] [tile 9: 0 4] [tile 12: 2]
//!  t: 9 7 12 7 9     t: 7 7 9 9 12                 │            │            │
//!                                            bounding region read per group (in parallel)
//!                                                  │            │            │
//!                                            scatter values back to input order
//! ```
//!
//! Categorical extensions are sampled at the nearest pixel and returned as
//! `i32`; continuous ones are interpolated bilinearly and returned as
//! `f32`. A tile whose raster cannot be read fails only its own samples.

mod interpolate;

pub use interpolate::{bilinear, bounding_region, nearest};

use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{CatalogError, TileCatalog, TileId};
use crate::raster::{RasterError, RasterRegion, RasterSource};
use crate::release::{ExtensionKind, ExtensionSpec, TileGeometry};

/// Errors that fail a whole sampling batch.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Input slices differ in length.
    #[error("Sample inputs differ in length: {tiles} tiles, {x} x, {y} y")]
    LengthMismatch { tiles: usize, x: usize, y: usize },

    /// A tile id is not in the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Sampler behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Sample tile groups on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl SamplerConfig {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Sampled values, typed by extension kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Continuous(Vec<f32>),
    Categorical(Vec<i32>),
}

impl Samples {
    /// Failure-marked storage: NaN for continuous, 0 for categorical.
    fn filled(kind: ExtensionKind, len: usize) -> Self {
        match kind {
            ExtensionKind::Continuous => Samples::Continuous(vec![f32::NAN; len]),
            ExtensionKind::Categorical => Samples::Categorical(vec![0; len]),
        }
    }

    fn set(&mut self, index: usize, value: f64) {
        match self {
            Samples::Continuous(v) => v[index] = value as f32,
            Samples::Categorical(v) => v[index] = value as i64 as i32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::Continuous(v) => v.len(),
            Samples::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ExtensionKind {
        match self {
            Samples::Continuous(_) => ExtensionKind::Continuous,
            Samples::Categorical(_) => ExtensionKind::Categorical,
        }
    }
}

/// One tile group whose raster could not be read.
#[derive(Debug)]
pub struct TileFailure {
    pub tile: TileId,
    /// Input positions of the samples on this tile, ascending.
    pub indices: Vec<usize>,
    pub error: RasterError,
}

/// Result of a sampling batch.
///
/// Values of failed samples are NaN (continuous) or 0 (categorical) and
/// are listed in `failures`.
#[derive(Debug)]
pub struct SampleOutcome {
    pub samples: Samples,
    pub failures: Vec<TileFailure>,
}

impl SampleOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Per-sample failure flags in input order.
    pub fn failed_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.samples.len()];
        for failure in &self.failures {
            for &i in &failure.indices {
                mask[i] = true;
            }
        }
        mask
    }
}

/// Samples tile rasters at resolved tile pixel positions.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use wssa::catalog::{CatalogLoader, FitsCatalogLoader};
/// use wssa::raster::FitsRasterSource;
/// use wssa::release::{ReleaseParams, TileSize};
/// use wssa::sampler::TileSampler;
///
/// let catalog = Arc::new(FitsCatalogLoader::from_dir("/data/wssa").load()?);
/// let source = Arc::new(FitsRasterSource::new("/data/wssa/tiles"));
/// let sampler = TileSampler::new(catalog, source, TileSize::Large.geometry());
///
/// let release = ReleaseParams::default();
/// let tiles = [wssa::catalog::TileId::new(17)];
/// let outcome = sampler.sample(&tiles, &[1234.5], &[987.25], release.default_extension())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TileSampler {
    catalog: Arc<TileCatalog>,
    source: Arc<dyn RasterSource>,
    geometry: TileGeometry,
    config: SamplerConfig,
}

/// Samples of one tile, as positions into the input slices.
struct TileGroup<'a> {
    tile: TileId,
    indices: &'a [usize],
}

impl TileSampler {
    pub fn new(
        catalog: Arc<TileCatalog>,
        source: Arc<dyn RasterSource>,
        geometry: TileGeometry,
    ) -> Self {
        Self {
            catalog,
            source,
            geometry,
            config: SamplerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SamplerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> SamplerConfig {
        self.config
    }

    pub fn geometry(&self) -> TileGeometry {
        self.geometry
    }

    /// Sample `extension` at `(x[i], y[i])` on tile `tiles[i]`.
    ///
    /// # Arguments
    ///
    /// * `tiles` - Tile id per sample
    /// * `x`, `y` - Raster pixel coordinates per sample; values outside the
    ///   raster take the nearest edge pixel
    /// * `extension` - Layer to sample; its kind picks nearest-pixel or
    ///   bilinear sampling
    ///
    /// # Returns
    ///
    /// Values in input order plus any per-tile read failures. Only invalid
    /// input fails the whole batch.
    pub fn sample(
        &self,
        tiles: &[TileId],
        x: &[f64],
        y: &[f64],
        extension: &ExtensionSpec,
    ) -> Result<SampleOutcome, SampleError> {
        if tiles.len() != x.len() || tiles.len() != y.len() {
            return Err(SampleError::LengthMismatch {
                tiles: tiles.len(),
                x: x.len(),
                y: y.len(),
            });
        }
        if let Some(&bad) = tiles.iter().find(|&&t| self.catalog.tile(t).is_err()) {
            return Err(CatalogError::UnknownTile(bad).into());
        }

        let mut order: Vec<usize> = (0..tiles.len()).collect();
        order.sort_by_key(|&i| tiles[i]);
        let groups: Vec<TileGroup<'_>> = order
            .chunk_by(|&a, &b| tiles[a] == tiles[b])
            .map(|indices| TileGroup {
                tile: tiles[indices[0]],
                indices,
            })
            .collect();

        let group_count = groups.len();
        let sample_group = |(n, group): (usize, &TileGroup<'_>)| {
            self.sample_group(group, x, y, extension, n + 1, group_count)
        };
        let results: Vec<Result<Vec<f64>, RasterError>> = if self.config.parallel && group_count > 1
        {
            groups.par_iter().enumerate().map(sample_group).collect()
        } else {
            groups.iter().enumerate().map(sample_group).collect()
        };

        let mut samples = Samples::filled(extension.kind, tiles.len());
        let mut failures = Vec::new();
        for (group, result) in groups.iter().zip(results) {
            match result {
                Ok(values) => {
                    for (&i, value) in group.indices.iter().zip(values) {
                        samples.set(i, value);
                    }
                }
                Err(error) => {
                    warn!(
                        tile = %group.tile,
                        samples = group.indices.len(),
                        error = %error,
                        "Tile read failed, samples marked as failed"
                    );
                    let mut indices = group.indices.to_vec();
                    indices.sort_unstable();
                    failures.push(TileFailure {
                        tile: group.tile,
                        indices,
                        error,
                    });
                }
            }
        }

        debug!(
            samples = tiles.len(),
            tiles = group_count,
            failed_tiles = failures.len(),
            extension = extension.name,
            "Sampling complete"
        );

        Ok(SampleOutcome { samples, failures })
    }

    fn sample_group(
        &self,
        group: &TileGroup<'_>,
        x: &[f64],
        y: &[f64],
        extension: &ExtensionSpec,
        ordinal: usize,
        group_count: usize,
    ) -> Result<Vec<f64>, RasterError> {
        let gx: Vec<f64> = group.indices.iter().map(|&i| x[i]).collect();
        let gy: Vec<f64> = group.indices.iter().map(|&i| y[i]).collect();
        let side = self.geometry.side_pixels() as usize;
        let region = bounding_region(&gx, &gy, side);

        // Catalog membership was checked for every id before grouping.
        let record = self.catalog.tile(group.tile).map_err(|e| RasterError::Unavailable {
            tile: group.tile,
            reason: e.to_string(),
        })?;

        debug!(
            group = ordinal,
            groups = group_count,
            tile = %group.tile,
            file = %record.file_name,
            samples = group.indices.len(),
            region = %region,
            "Sampling tile"
        );

        let raster = self.source.read_region(record, extension.index, region)?;
        if raster.region() != region {
            return Err(RasterError::RegionMismatch {
                tile: group.tile,
                requested: region,
                returned: raster.region(),
            });
        }

        let sample: fn(&RasterRegion, f64, f64) -> f64 = match extension.kind {
            ExtensionKind::Categorical => nearest,
            ExtensionKind::Continuous => bilinear,
        };
        Ok(gx
            .iter()
            .zip(&gy)
            .map(|(&px, &py)| sample(&raster, px, py))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PixelTileLookup, TileRecord};
    use crate::raster::PixelRegion;
    use crate::release::ReleaseParams;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const SIDE: u32 = 64;

    /// Tile `t` holds `1000 * t + x + 100 * y`; tile 3 is unreadable.
    struct PlaneSource {
        reads: AtomicUsize,
        regions: Mutex<Vec<(TileId, PixelRegion)>>,
    }

    impl PlaneSource {
        fn new() -> Self {
            Self {
                reads: AtomicUsize::new(0),
                regions: Mutex::new(Vec::new()),
            }
        }
    }

    impl RasterSource for PlaneSource {
        fn read_region(
            &self,
            tile: &TileRecord,
            _extension: usize,
            region: PixelRegion,
        ) -> Result<RasterRegion, RasterError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.regions.lock().unwrap().push((tile.id, region));
            if tile.id == TileId::new(3) {
                return Err(RasterError::Unavailable {
                    tile: tile.id,
                    reason: "disk on fire".to_string(),
                });
            }
            let base = 1000.0 * tile.id.get() as f64;
            Ok(RasterRegion::from_fn(region, move |x, y| {
                base + x as f64 + 100.0 * y as f64
            }))
        }
    }

    fn catalog() -> Arc<TileCatalog> {
        let tiles = (1..=4)
            .map(|i| TileRecord::new(TileId::new(i), 0.0, 0.0, format!("tile{i}.fits")))
            .collect();
        let ids = (0..12).map(|p| TileId::new(p % 4 + 1)).collect();
        Arc::new(TileCatalog::new(tiles, PixelTileLookup::new(1, ids).unwrap()).unwrap())
    }

    fn sampler(source: Arc<PlaneSource>, parallel: bool) -> TileSampler {
        TileSampler::new(catalog(), source, TileGeometry::new(SIDE, 1.0))
            .with_config(SamplerConfig::default().with_parallel(parallel))
    }

    fn extension(name: &str) -> &'static ExtensionSpec {
        ReleaseParams::default()
            .extension(&name.parse().unwrap())
            .unwrap()
    }

    fn ids(raw: &[u16]) -> Vec<TileId> {
        raw.iter().map(|&t| TileId::new(t)).collect()
    }

    #[test]
    fn test_continuous_values_in_input_order() {
        let source = Arc::new(PlaneSource::new());
        let sampler = sampler(source.clone(), false);

        let tiles = ids(&[2, 1, 2, 4]);
        let x = [1.5, 10.0, 3.0, 0.25];
        let y = [2.0, 5.5, 4.0, 0.0];
        let outcome = sampler
            .sample(&tiles, &x, &y, extension("clean"))
            .unwrap();

        assert!(outcome.is_complete());
        assert_eq!(
            outcome.samples,
            Samples::Continuous(vec![2201.5, 1560.0, 2403.0, 4000.25])
        );
        // one read per distinct tile
        assert_eq!(source.reads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_group_reads_bounding_region() {
        let source = Arc::new(PlaneSource::new());
        let sampler = sampler(source.clone(), false);

        let tiles = ids(&[1, 1, 1]);
        sampler
            .sample(&tiles, &[4.2, 9.9, 6.0], &[20.5, 18.0, 30.0], extension("clean"))
            .unwrap();

        let regions = source.regions.lock().unwrap();
        assert_eq!(
            regions.as_slice(),
            &[(TileId::new(1), PixelRegion::new(4, 11, 18, 31))]
        );
    }

    #[test]
    fn test_categorical_is_integer_nearest() {
        let sampler = sampler(Arc::new(PlaneSource::new()), false);
        let outcome = sampler
            .sample(&ids(&[1, 1]), &[2.5, 3.5], &[0.4, 0.6], extension("amsk"))
            .unwrap();
        assert_eq!(outcome.samples, Samples::Categorical(vec![1002, 1104]));
        assert_eq!(outcome.samples.kind(), ExtensionKind::Categorical);
    }

    #[test]
    fn test_boundary_coordinates_clamp() {
        let sampler = sampler(Arc::new(PlaneSource::new()), false);
        let side = SIDE as f64;
        let edge = (SIDE - 1) as f64;

        for name in ["clean", "omsk"] {
            let outcome = sampler
                .sample(
                    &ids(&[2, 2]),
                    &[-1.0, side],
                    &[-1.0, side],
                    extension(name),
                )
                .unwrap();
            let expected = [2000.0, 2000.0 + edge + 100.0 * edge];
            match outcome.samples {
                Samples::Continuous(v) => {
                    assert_eq!(v, vec![expected[0] as f32, expected[1] as f32])
                }
                Samples::Categorical(v) => {
                    assert_eq!(v, vec![expected[0] as i32, expected[1] as i32])
                }
            }
        }
    }

    #[test]
    fn test_failed_tile_marks_only_its_samples() {
        let sampler = sampler(Arc::new(PlaneSource::new()), true);
        let tiles = ids(&[3, 1, 3, 2]);
        let outcome = sampler
            .sample(&tiles, &[1.0; 4], &[1.0; 4], extension("clean"))
            .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].tile, TileId::new(3));
        assert_eq!(outcome.failures[0].indices, vec![0, 2]);
        assert_eq!(outcome.failed_mask(), vec![true, false, true, false]);

        let Samples::Continuous(values) = outcome.samples else {
            panic!("expected continuous samples");
        };
        assert!(values[0].is_nan() && values[2].is_nan());
        assert_eq!(values[1], 1101.0);
        assert_eq!(values[3], 2101.0);
    }

    #[test]
    fn test_failed_categorical_samples_are_zero() {
        let sampler = sampler(Arc::new(PlaneSource::new()), false);
        let outcome = sampler
            .sample(&ids(&[3]), &[1.0], &[1.0], extension("amsk"))
            .unwrap();
        assert_eq!(outcome.samples, Samples::Categorical(vec![0]));
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let tiles: Vec<TileId> = (0..200).map(|i| TileId::new((i * 7 % 4 + 1) as u16)).collect();
        let x: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37) % 70.0 - 3.0).collect();
        let y: Vec<f64> = (0..200).map(|i| (i as f64 * 1.13) % 66.0 - 1.0).collect();

        let a = sampler(Arc::new(PlaneSource::new()), false)
            .sample(&tiles, &x, &y, extension("dirt"))
            .unwrap();
        let b = sampler(Arc::new(PlaneSource::new()), true)
            .sample(&tiles, &x, &y, extension("dirt"))
            .unwrap();

        assert_eq!(a.failed_mask(), b.failed_mask());
        let (Samples::Continuous(a), Samples::Continuous(b)) = (a.samples, b.samples) else {
            panic!("expected continuous samples");
        };
        for (va, vb) in a.iter().zip(&b) {
            assert!(va == vb || (va.is_nan() && vb.is_nan()));
        }
    }

    #[test]
    fn test_length_mismatch() {
        let sampler = sampler(Arc::new(PlaneSource::new()), false);
        assert!(matches!(
            sampler.sample(&ids(&[1, 2]), &[0.0], &[0.0, 1.0], extension("clean")),
            Err(SampleError::LengthMismatch {
                tiles: 2,
                x: 1,
                y: 2
            })
        ));
    }

    #[test]
    fn test_unknown_tile_fails_batch() {
        let sampler = sampler(Arc::new(PlaneSource::new()), false);
        assert!(matches!(
            sampler.sample(&ids(&[1, 9]), &[0.0; 2], &[0.0; 2], extension("clean")),
            Err(SampleError::Catalog(CatalogError::UnknownTile(_)))
        ));
    }

    #[test]
    fn test_empty_batch() {
        let source = Arc::new(PlaneSource::new());
        let outcome = sampler(source.clone(), true)
            .sample(&[], &[], &[], extension("clean"))
            .unwrap();
        assert!(outcome.samples.is_empty());
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsigned_mask_bits_survive_as_i32() {
        // 32-bit unsigned masks come back from BZERO = 2^31 as values above i32::MAX
        let mut samples = Samples::filled(ExtensionKind::Categorical, 3);
        samples.set(0, 2_147_483_648.0 + 5.0);
        samples.set(1, 4_294_967_295.0);
        samples.set(2, 12.0);
        assert_eq!(
            samples,
            Samples::Categorical(vec![i32::MIN + 5, -1, 12])
        );
    }
}
