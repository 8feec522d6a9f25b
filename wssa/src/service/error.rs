//! Query and service construction errors.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::release::ReleaseError;
use crate::resolver::ResolveError;
use crate::sampler::{SampleError, TileFailure};

/// Errors that fail a value query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// ra and dec are not equal-shaped arrays.
    #[error("ra has shape {ra:?} but dec has shape {dec:?}")]
    InputShape { ra: Vec<usize>, dec: Vec<usize> },

    /// A declination outside [-90, 90] or a non-finite coordinate.
    #[error("Coordinate {index} out of range: ra={ra}, dec={dec}")]
    CoordinateRange { index: usize, ra: f64, dec: f64 },

    /// A sphere pixel has no tile; the lookup table does not match its nside.
    #[error("Tile lookup failed: {0}")]
    LookupMiss(#[source] CatalogError),

    /// One or more tile rasters could not be read.
    #[error("{}", describe_failures(.failures))]
    RasterIo { failures: Vec<TileFailure> },

    #[error("Unknown extension '{selector}' for release {release}")]
    UnknownExtension { selector: String, release: String },

    #[error(transparent)]
    Release(ReleaseError),

    #[error(transparent)]
    Catalog(CatalogError),
}

fn describe_failures(failures: &[TileFailure]) -> String {
    let samples: usize = failures.iter().map(|f| f.indices.len()).sum();
    match failures.first() {
        Some(first) => format!(
            "Failed to read {} tile raster(s) covering {} sample(s); first: {}",
            failures.len(),
            samples,
            first.error
        ),
        None => "Failed to read tile rasters".to_string(),
    }
}

impl From<ReleaseError> for QueryError {
    fn from(err: ReleaseError) -> Self {
        match err {
            ReleaseError::UnknownExtension { release, selector } => {
                QueryError::UnknownExtension { selector, release }
            }
            other => QueryError::Release(other),
        }
    }
}

impl From<CatalogError> for QueryError {
    fn from(err: CatalogError) -> Self {
        match err {
            err @ CatalogError::LookupMiss { .. } => QueryError::LookupMiss(err),
            other => QueryError::Catalog(other),
        }
    }
}

impl From<ResolveError> for QueryError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::ShapeMismatch { ra, dec } => QueryError::InputShape { ra, dec },
            ResolveError::Catalog(err) => err.into(),
        }
    }
}

impl From<SampleError> for QueryError {
    fn from(err: SampleError) -> Self {
        match err {
            SampleError::LengthMismatch { x, y, .. } => QueryError::InputShape {
                ra: vec![x],
                dec: vec![y],
            },
            SampleError::Catalog(err) => err.into(),
        }
    }
}

/// Errors from building a [`ValueService`](super::ValueService).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Release configuration error: {0}")]
    Release(#[from] ReleaseError),

    #[error("Failed to load tile catalog: {0}")]
    Catalog(#[from] CatalogError),
}
