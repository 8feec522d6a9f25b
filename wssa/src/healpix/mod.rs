//! Ring-ordered HEALPix pixelization.
//!
//! Converts between spherical polar angles and pixel indices under the
//! HEALPix RING numbering, where pixels are counted ring by ring from the
//! north pole to the south pole. The sphere is split into three regimes by
//! `z = cos(theta)`, each with its own closed-form index formula:
//!
//! ```text
//!        z >  2/3   ┌──────────────────────┐  north polar cap
//!                   │ rings 1 .. nside-1   │  4·i pixels in ring i
//!                   ├──────────────────────┤
//!  -2/3 < z <= 2/3  │ rings nside .. 3nside│  equatorial belt
//!                   │ 4·nside pixels/ring  │
//!                   ├──────────────────────┤
//!        z <= -2/3  │ rings 3nside+1 ..    │  south polar cap
//!                   └──────────────────────┘
//! ```
//!
//! The formulas reproduce the IDL `ang2pix_ring` / `pix2ang_ring` routines
//! exactly, so the indices agree with the lookup tables built from them.
//! All index arithmetic is done in 64-bit integers, which keeps every
//! nside up to [`MAX_NSIDE`] overflow free.
//!
//! # Example
//!
//! ```
//! use wssa::healpix::{ang2pix_ring, pix2ang_ring, npix};
//!
//! let nside = 16;
//! let (theta, phi) = pix2ang_ring(nside, 1000);
//! assert_eq!(ang2pix_ring(nside, theta, phi), 1000);
//! assert_eq!(npix(nside), 3072);
//! ```

mod types;

pub use types::{HealpixError, RingPixelizer, MAX_NSIDE};

use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Boundary between the polar caps and the equatorial belt, in `cos(theta)`.
const Z_CAP: f64 = 2.0 / 3.0;

/// Total number of pixels for the given nside (`12 * nside^2`).
#[inline]
pub fn npix(nside: u32) -> u64 {
    let n = nside as u64;
    12 * n * n
}

/// Converts polar angles to a ring-ordered pixel index.
///
/// # Arguments
///
/// * `nside` - HEALPix resolution parameter
/// * `theta` - Polar angle from the north pole, radians, in `[0, π]`
/// * `phi` - Azimuth, radians; any value is accepted and wrapped into `[0, 2π)`
///
/// # Returns
///
/// Pixel index in `[0, 12 * nside^2)`.
pub fn ang2pix_ring(nside: u32, theta: f64, phi: f64) -> u64 {
    let ns = nside as i64;
    let z = theta.cos();
    let tt = phi.rem_euclid(TAU) / FRAC_PI_2;

    if z > Z_CAP {
        let (ir, ip) = polar_ring_and_offset(ns, tt, z);
        (2 * ir * (ir - 1) + ip - 1) as u64
    } else if z > -Z_CAP {
        equatorial_index(ns, tt, z)
    } else {
        let (ir, ip) = polar_ring_and_offset(ns, tt, z);
        (12 * ns * ns - 2 * ir * (ir + 1) + ip - 1) as u64
    }
}

/// Converts a ring-ordered pixel index to the polar angles of its center.
///
/// `ipix` must be below [`npix`]`(nside)`; use
/// [`RingPixelizer::index_to_angle`] for a checked conversion.
///
/// # Returns
///
/// `(theta, phi)` in radians, `theta` in `[0, π]` and `phi` in `[0, 2π)`.
pub fn pix2ang_ring(nside: u32, ipix: u64) -> (f64, f64) {
    let ns = nside as i64;
    let nl2 = 2 * ns;
    let nl4 = 4 * ns;
    let ncap = nl2 * (ns - 1);
    let nsup = nl2 * (5 * ns + 1);
    let fact1 = 1.5 * ns as f64;
    let fact2 = 3.0 * ns as f64 * ns as f64;
    let ipix = ipix as i64;

    if ipix < ncap {
        let ip = ipix + 1;
        let iring = polar_ring_number(ip);
        let iphi = ip - 2 * iring * (iring - 1);

        let theta = (1.0 - (iring * iring) as f64 / fact2).acos();
        let phi = (iphi as f64 - 0.5) * PI / (2.0 * iring as f64);
        (theta, phi)
    } else if ipix < nsup {
        let ip = ipix - ncap;
        let iring = ip / nl4 + ns;
        let iphi = ip % nl4 + 1;
        // Rings alternate between starting on and half a pixel off phi = 0
        let fodd = 0.5 * (1 + (iring + ns) % 2) as f64;

        let theta = ((nl2 - iring) as f64 / fact1).acos();
        let phi = (iphi as f64 - fodd) * PI / (2.0 * ns as f64);
        (theta, phi)
    } else {
        let ip = 12 * ns * ns - ipix;
        let iring = polar_ring_number(ip);
        let iphi = 1 + 4 * iring - (ip - 2 * iring * (iring - 1));

        let theta = (-1.0 + (iring * iring) as f64 / fact2).acos();
        let phi = (iphi as f64 - 0.5) * PI / (2.0 * iring as f64);
        (theta, phi)
    }
}

/// Ring number (counted from the nearest pole) and 1-based offset within
/// the ring for a point in either polar cap.
fn polar_ring_and_offset(ns: i64, tt: f64, z: f64) -> (i64, i64) {
    let tp = tt.fract();
    let tmp = (3.0 * (1.0 - z.abs())).sqrt();
    let nsf = ns as f64;

    let jp = (nsf * tp * tmp) as i64;
    let jm = (nsf * (1.0 - tp) * tmp) as i64;

    let ir = jp + jm + 1;
    let mut ip = (tt * ir as f64) as i64 + 1;
    if ip > 4 * ir {
        ip -= 4 * ir;
    }
    (ir, ip)
}

fn equatorial_index(ns: i64, tt: f64, z: f64) -> u64 {
    let nl4 = 4 * ns;
    let ncap = 2 * ns * (ns - 1);
    let nsf = ns as f64;

    // Indices of the ascending and descending edge lines
    let jp = (nsf * (0.5 + tt - z * 0.75)) as i64;
    let jm = (nsf * (0.5 + tt + z * 0.75)) as i64;

    // Ring number counted from z = 2/3, in 1..=2*nside+1
    let ir = ns + 1 + jp - jm;
    let kshift = i64::from(ir % 2 == 0);

    let mut ip = (jp + jm + kshift + 1 - ns).div_euclid(2) + 1;
    if ip > nl4 {
        ip -= nl4;
    }

    (ncap + nl4 * (ir - 1) + ip - 1) as u64
}

/// Ring number of the `ip`-th pixel (1-based) counted from a pole.
fn polar_ring_number(ip: i64) -> i64 {
    let half = ip as f64 / 2.0;
    (half - half.floor().sqrt()).sqrt() as i64 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_npix() {
        assert_eq!(npix(1), 12);
        assert_eq!(npix(16), 3072);
        assert_eq!(npix(64), 49152);
        assert_eq!(npix(MAX_NSIDE), 12 * (1u64 << 58));
    }

    #[test]
    fn test_poles_at_nside_one() {
        assert_eq!(ang2pix_ring(1, 0.0, 0.0), 0);
        // First pixel of the south ring
        assert_eq!(ang2pix_ring(1, PI, 0.0), 8);
    }

    #[test]
    fn test_equator_at_nside_one() {
        assert_eq!(ang2pix_ring(1, FRAC_PI_2, 0.0), 4);

        let (theta, phi) = pix2ang_ring(1, 4);
        assert!((theta - FRAC_PI_2).abs() < EPS);
        assert!(phi.abs() < EPS);
    }

    #[test]
    fn test_first_pixel_center() {
        let (theta, phi) = pix2ang_ring(1, 0);
        assert!((theta - (2.0_f64 / 3.0).acos()).abs() < EPS);
        assert!((phi - PI / 4.0).abs() < EPS);
    }

    #[test]
    fn test_north_cap_ring_layout() {
        // Ring i of the north cap holds 4*i pixels
        let nside = 8;
        let mut start = 0;
        for ring in 1..nside as u64 {
            let (theta_first, _) = pix2ang_ring(nside, start);
            let (theta_last, _) = pix2ang_ring(nside, start + 4 * ring - 1);
            assert!((theta_first - theta_last).abs() < EPS);
            start += 4 * ring;
        }
    }

    #[test]
    fn test_cap_pixels_invert_to_their_own_ring() {
        // First pixel of ring 2 and a pixel deep in the nside 64 cap
        let (theta, phi) = pix2ang_ring(16, 4);
        assert_eq!(ang2pix_ring(16, theta, phi), 4);
        let (theta, phi) = pix2ang_ring(64, 2664);
        assert_eq!(ang2pix_ring(64, theta, phi), 2664);

        // Ring boundaries: last pixel of ring i and first of ring i + 1
        let nside = 32;
        let mut start = 0;
        for ring in 1..nside as u64 {
            for pixel in [start, start + 4 * ring - 1] {
                let (theta, phi) = pix2ang_ring(nside, pixel);
                assert_eq!(ang2pix_ring(nside, theta, phi), pixel);
            }
            start += 4 * ring;
        }
    }

    #[test]
    fn test_negative_and_large_phi_wrap() {
        let nside = 64;
        let theta = 1.0;
        let base = ang2pix_ring(nside, theta, 0.3);
        assert_eq!(ang2pix_ring(nside, theta, 0.3 - TAU), base);
        assert_eq!(ang2pix_ring(nside, theta, 0.3 + 2.0 * TAU), base);
    }

    #[test]
    fn test_phi_at_full_turn_wraps_to_start() {
        for nside in [1, 16, 64] {
            for theta in [0.1, 1.0, FRAC_PI_2, 2.5, 3.0] {
                assert_eq!(
                    ang2pix_ring(nside, theta, TAU),
                    ang2pix_ring(nside, theta, 0.0),
                    "nside {} theta {}",
                    nside,
                    theta
                );
            }
        }
    }

    #[test]
    fn test_roundtrip_every_index_nside_16() {
        let nside = 16;
        for ipix in 0..npix(nside) {
            let (theta, phi) = pix2ang_ring(nside, ipix);
            assert_eq!(ang2pix_ring(nside, theta, phi), ipix, "pixel {}", ipix);
        }
    }

    #[test]
    fn test_roundtrip_every_index_nside_64() {
        let nside = 64;
        for ipix in 0..npix(nside) {
            let (theta, phi) = pix2ang_ring(nside, ipix);
            assert_eq!(ang2pix_ring(nside, theta, phi), ipix, "pixel {}", ipix);
        }
    }

    #[test]
    fn test_roundtrip_beyond_32bit_threshold() {
        // Above nside 8192 the pixel count no longer fits in 32 bits
        let nside = 16384;
        let n = nside as u64;
        let ncap = 2 * n * (n - 1);
        let nsup = 2 * n * (5 * n + 1);
        let total = npix(nside);
        for ipix in [0, 1, ncap - 1, ncap, ncap + 7, nsup - 1, nsup, total - 1] {
            let (theta, phi) = pix2ang_ring(nside, ipix);
            assert_eq!(ang2pix_ring(nside, theta, phi), ipix, "pixel {}", ipix);
        }
    }

    #[test]
    fn test_centers_in_range() {
        let nside = 16;
        for ipix in 0..npix(nside) {
            let (theta, phi) = pix2ang_ring(nside, ipix);
            assert!((0.0..=PI).contains(&theta));
            assert!((0.0..TAU).contains(&phi), "phi {} for pixel {}", phi, ipix);
        }
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_index_always_in_range(
                theta in 0.0..=PI,
                phi in -4.0 * PI..4.0 * PI,
                nside in prop::sample::select(vec![1u32, 2, 16, 64, 1024, 8192, 16384])
            ) {
                let ipix = ang2pix_ring(nside, theta, phi);
                prop_assert!(
                    ipix < npix(nside),
                    "index {} >= npix {} for theta {} phi {}",
                    ipix, npix(nside), theta, phi
                );
            }

            #[test]
            fn test_forward_lands_near_pixel_center(
                theta in 0.0..=PI,
                phi in 0.0..TAU
            ) {
                let nside = 64;
                let ipix = ang2pix_ring(nside, theta, phi);
                let (tc, pc) = pix2ang_ring(nside, ipix);

                // Great-circle distance to the pixel center
                let cos_d = theta.cos() * tc.cos() + theta.sin() * tc.sin() * (phi - pc).cos();
                let dist = cos_d.clamp(-1.0, 1.0).acos();

                // Pixels are ~0.92 degrees across at nside 64
                prop_assert!(
                    dist < 2.0_f64.to_radians(),
                    "({}, {}) landed in pixel {} centered {} rad away",
                    theta, phi, ipix, dist
                );
            }

            #[test]
            fn test_roundtrip_property(ipix in 0u64..49152) {
                let (theta, phi) = pix2ang_ring(64, ipix);
                prop_assert_eq!(ang2pix_ring(64, theta, phi), ipix);
            }
        }
    }
}
