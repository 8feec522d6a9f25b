//! Gnomonic (tangent-plane) projection about a tile center.
//!
//! With `Δ = ra − ra0`:
//!
//! ```text
//! A = cos(dec)·cos(Δ)
//! F = scale / (sin(dec0)·sin(dec) + A·cos(dec0))
//! x = −F·cos(dec)·sin(Δ)
//! y =  F·(cos(dec0)·sin(dec) − A·sin(dec0))
//! ```
//!
//! `x` grows toward decreasing right ascension (east to the left, as on
//! the sky). The projection is only evaluated near its own tangent point;
//! points 90° or more away land behind the plane and give meaningless
//! (possibly infinite) coordinates.

use std::f64::consts::TAU;

/// A tangent plane centered on `(ra0, dec0)`, trigonometry precomputed.
///
/// All angles are radians; `scale` is output units per radian.
///
/// # Example
///
/// ```
/// use wssa::projection::TangentPlane;
///
/// let plane = TangentPlane::new(1.0, 0.5, 1.0);
/// let (x, y) = plane.project(1.0, 0.5);
/// assert_eq!((x, y), (0.0, 0.0));
///
/// let (ra, dec) = plane.deproject(0.01, -0.02);
/// let (x, y) = plane.project(ra, dec);
/// assert!((x - 0.01).abs() < 1e-12 && (y + 0.02).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentPlane {
    ra0: f64,
    dec0: f64,
    sin_dec0: f64,
    cos_dec0: f64,
    scale: f64,
}

impl TangentPlane {
    pub fn new(ra0: f64, dec0: f64, scale: f64) -> Self {
        let (sin_dec0, cos_dec0) = dec0.sin_cos();
        Self {
            ra0,
            dec0,
            sin_dec0,
            cos_dec0,
            scale,
        }
    }

    /// Tangent point `(ra0, dec0)`.
    pub fn center(&self) -> (f64, f64) {
        (self.ra0, self.dec0)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Project `(ra, dec)` to plane coordinates relative to the center.
    #[inline]
    pub fn project(&self, ra: f64, dec: f64) -> (f64, f64) {
        let (sin_dra, cos_dra) = (ra - self.ra0).sin_cos();
        let (sin_dec, cos_dec) = dec.sin_cos();

        let a = cos_dec * cos_dra;
        let f = self.scale / (self.sin_dec0 * sin_dec + a * self.cos_dec0);

        let x = -f * cos_dec * sin_dra;
        let y = f * (self.cos_dec0 * sin_dec - a * self.sin_dec0);
        (x, y)
    }

    /// Inverse of [`project`](Self::project); right ascension in `[0, 2π)`.
    pub fn deproject(&self, x: f64, y: f64) -> (f64, f64) {
        let xi = -x / self.scale;
        let eta = y / self.scale;
        let rho = xi.hypot(eta);
        if rho == 0.0 {
            return (self.ra0.rem_euclid(TAU), self.dec0);
        }

        let c = rho.atan();
        let (sin_c, cos_c) = c.sin_cos();

        let dec = (cos_c * self.sin_dec0 + eta * sin_c * self.cos_dec0 / rho).asin();
        let ra = self.ra0
            + (xi * sin_c).atan2(rho * self.cos_dec0 * cos_c - eta * self.sin_dec0 * sin_c);
        (ra.rem_euclid(TAU), dec)
    }
}

/// One-shot forward projection, radians in, `scale` units out.
pub fn gnomonic(ra: f64, dec: f64, ra0: f64, dec0: f64, scale: f64) -> (f64, f64) {
    TangentPlane::new(ra0, dec0, scale).project(ra, dec)
}
