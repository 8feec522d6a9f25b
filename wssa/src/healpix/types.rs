//! Checked pixelizer handle and error types.

use ndarray::{ArrayD, ArrayViewD, Zip};
use thiserror::Error;

use super::{ang2pix_ring, npix, pix2ang_ring};

/// Largest supported nside (`2^29`), the limit of 64-bit ring indices.
pub const MAX_NSIDE: u32 = 1 << 29;

/// Errors from checked pixelizer operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HealpixError {
    /// nside is zero or larger than [`MAX_NSIDE`].
    #[error("Invalid nside {0}: must be between 1 and 536870912")]
    InvalidNside(u32),

    /// Pixel index is not below `12 * nside^2`.
    #[error("Pixel index {index} out of range for nside {nside} (npix = {npix})")]
    IndexOutOfRange { index: u64, nside: u32, npix: u64 },

    /// Element-wise operands do not share a shape.
    #[error("Shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },
}

/// A ring-ordered pixelization at a fixed nside.
///
/// Wraps the free functions in [`crate::healpix`] with a validated nside,
/// checked inverse conversion, and element-wise array forms that preserve
/// the input shape.
///
/// # Example
///
/// ```
/// use wssa::healpix::RingPixelizer;
///
/// let pixelizer = RingPixelizer::new(64).unwrap();
/// let (theta, phi) = pixelizer.index_to_angle(12345).unwrap();
/// assert_eq!(pixelizer.angle_to_index(theta, phi), 12345);
/// assert!(pixelizer.index_to_angle(49152).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingPixelizer {
    nside: u32,
}

impl RingPixelizer {
    /// Create a pixelizer, rejecting nside outside `1..=MAX_NSIDE`.
    pub fn new(nside: u32) -> Result<Self, HealpixError> {
        if nside == 0 || nside > MAX_NSIDE {
            return Err(HealpixError::InvalidNside(nside));
        }
        Ok(Self { nside })
    }

    pub fn nside(&self) -> u32 {
        self.nside
    }

    /// Total pixel count, `12 * nside^2`.
    pub fn npix(&self) -> u64 {
        npix(self.nside)
    }

    /// Polar angles (radians) to pixel index.
    #[inline]
    pub fn angle_to_index(&self, theta: f64, phi: f64) -> u64 {
        ang2pix_ring(self.nside, theta, phi)
    }

    /// Pixel index to the polar angles of its center.
    pub fn index_to_angle(&self, index: u64) -> Result<(f64, f64), HealpixError> {
        self.check_index(index)?;
        Ok(pix2ang_ring(self.nside, index))
    }

    /// Element-wise [`angle_to_index`](Self::angle_to_index) over
    /// equal-shaped arrays.
    pub fn angles_to_indices(
        &self,
        theta: ArrayViewD<'_, f64>,
        phi: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<u64>, HealpixError> {
        if theta.shape() != phi.shape() {
            return Err(HealpixError::ShapeMismatch {
                left: theta.shape().to_vec(),
                right: phi.shape().to_vec(),
            });
        }

        Ok(Zip::from(&theta)
            .and(&phi)
            .map_collect(|&t, &p| ang2pix_ring(self.nside, t, p)))
    }

    /// Element-wise [`index_to_angle`](Self::index_to_angle), returning
    /// `(theta, phi)` arrays shaped like `indices`.
    pub fn indices_to_angles(
        &self,
        indices: ArrayViewD<'_, u64>,
    ) -> Result<(ArrayD<f64>, ArrayD<f64>), HealpixError> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.npix()) {
            return Err(self.out_of_range(bad));
        }

        let mut theta = ArrayD::zeros(indices.raw_dim());
        let mut phi = ArrayD::zeros(indices.raw_dim());
        Zip::from(&mut theta)
            .and(&mut phi)
            .and(&indices)
            .for_each(|t, p, &i| {
                (*t, *p) = pix2ang_ring(self.nside, i);
            });

        Ok((theta, phi))
    }

    fn check_index(&self, index: u64) -> Result<(), HealpixError> {
        if index >= self.npix() {
            return Err(self.out_of_range(index));
        }
        Ok(())
    }

    fn out_of_range(&self, index: u64) -> HealpixError {
        HealpixError::IndexOutOfRange {
            index,
            nside: self.nside,
            npix: self.npix(),
        }
    }
}
