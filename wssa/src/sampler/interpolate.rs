//! Bounding boxes and per-sample interpolation over a raster region.

use crate::raster::{PixelRegion, RasterRegion};

/// Coordinates that are NaN sample pixel 0.
#[inline]
fn sanitize(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

/// Smallest region covering every `(x, y)`, clamped to the raster.
///
/// Both ends are clamped to `[0, side − 1]`, so points entirely off the
/// raster still yield a one-pixel-wide edge region rather than an empty
/// one. `x` and `y` must be non-empty and of equal length.
pub fn bounding_region(x: &[f64], y: &[f64], side: usize) -> PixelRegion {
    let (x0, x1) = axis_bounds(x, side);
    let (y0, y1) = axis_bounds(y, side);
    PixelRegion::new(x0, x1, y0, y1)
}

fn axis_bounds(values: &[f64], side: usize) -> (usize, usize) {
    let max_pixel = side.saturating_sub(1) as f64;
    let (lo, hi) = values
        .iter()
        .map(|&v| sanitize(v))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    let start = lo.floor().clamp(0.0, max_pixel) as usize;
    let end = hi.ceil().clamp(0.0, max_pixel) as usize + 1;
    (start.min(end - 1), end)
}

/// Local index along one axis, clamped to `[0, len − 1]`.
#[inline]
fn clamp_local(v: f64, origin: usize, len: usize) -> f64 {
    (sanitize(v) - origin as f64).clamp(0.0, len.saturating_sub(1) as f64)
}

/// Value of the pixel nearest `(x, y)`, rounding half to even.
///
/// Coordinates outside the region take the value of the nearest edge
/// pixel.
#[inline]
pub fn nearest(region: &RasterRegion, x: f64, y: f64) -> f64 {
    let origin = region.region();
    let col = clamp_local(sanitize(x).round_ties_even(), origin.x0, region.width());
    let row = clamp_local(sanitize(y).round_ties_even(), origin.y0, region.height());
    region.value(col as usize, row as usize)
}

/// Bilinear interpolation at `(x, y)` with edge extension.
///
/// Coordinates are clamped into the region before interpolating, so
/// points beyond the edge take the edge value rather than a fill value.
#[inline]
pub fn bilinear(region: &RasterRegion, x: f64, y: f64) -> f64 {
    let origin = region.region();
    let (c0, c1, tx) = lerp_axis(clamp_local(x, origin.x0, region.width()), region.width());
    let (r0, r1, ty) = lerp_axis(clamp_local(y, origin.y0, region.height()), region.height());

    let v00 = region.value(c0, r0);
    let v10 = region.value(c1, r0);
    let v01 = region.value(c0, r1);
    let v11 = region.value(c1, r1);

    (1.0 - ty) * ((1.0 - tx) * v00 + tx * v10) + ty * ((1.0 - tx) * v01 + tx * v11)
}

/// Lower and upper neighbour along one axis plus the fractional weight.
#[inline]
fn lerp_axis(local: f64, len: usize) -> (usize, usize, f64) {
    let lower = (local.floor() as usize).min(len.saturating_sub(2));
    let upper = (lower + 1).min(len.saturating_sub(1));
    (lower, upper, local - lower as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(region: PixelRegion) -> RasterRegion {
        RasterRegion::from_fn(region, |x, y| x as f64 + 1000.0 * y as f64)
    }

    #[test]
    fn test_bounding_region_floor_and_ceil() {
        let region = bounding_region(&[10.2, 12.7], &[5.5, 5.5], 100);
        assert_eq!(region, PixelRegion::new(10, 14, 5, 7));
    }

    #[test]
    fn test_bounding_region_integer_coordinates() {
        let region = bounding_region(&[3.0], &[4.0], 100);
        assert_eq!(region, PixelRegion::new(3, 4, 4, 5));
    }

    #[test]
    fn test_bounding_region_clamps_both_ends() {
        // entirely below the raster
        assert_eq!(
            bounding_region(&[-5.0, -1.0], &[-3.0], 100),
            PixelRegion::new(0, 1, 0, 1)
        );
        // entirely above the raster
        assert_eq!(
            bounding_region(&[100.0, 250.0], &[99.5], 100),
            PixelRegion::new(99, 100, 99, 100)
        );
        // straddling both edges
        assert_eq!(
            bounding_region(&[-1.0, 100.0], &[0.0], 100),
            PixelRegion::new(0, 100, 0, 1)
        );
    }

    #[test]
    fn test_bounding_region_nan_maps_to_origin() {
        assert_eq!(
            bounding_region(&[f64::NAN], &[f64::NAN], 100),
            PixelRegion::new(0, 1, 0, 1)
        );
    }

    #[test]
    fn test_nearest_rounds_half_to_even() {
        let raster = plane(PixelRegion::new(0, 10, 0, 10));
        assert_eq!(nearest(&raster, 2.5, 0.0), 2.0);
        assert_eq!(nearest(&raster, 3.5, 0.0), 4.0);
        assert_eq!(nearest(&raster, 3.49, 1.51), 2003.0);
    }

    #[test]
    fn test_nearest_offsets_by_region_origin() {
        let raster = plane(PixelRegion::new(20, 25, 30, 33));
        assert_eq!(nearest(&raster, 22.2, 31.9), 32022.0);
    }

    #[test]
    fn test_nearest_clamps_outside() {
        let raster = plane(PixelRegion::new(0, 8, 0, 8));
        assert_eq!(nearest(&raster, -1.0, -1.0), 0.0);
        assert_eq!(nearest(&raster, 8.0, 8.0), 7007.0);
    }

    #[test]
    fn test_bilinear_reproduces_plane() {
        let raster = plane(PixelRegion::new(10, 20, 40, 50));
        let v = bilinear(&raster, 12.25, 43.5);
        assert!((v - (12.25 + 43500.0)).abs() < 1e-9);
    }

    #[test]
    fn test_bilinear_exact_on_pixels_and_edges() {
        let raster = plane(PixelRegion::new(0, 4, 0, 4));
        assert_eq!(bilinear(&raster, 3.0, 3.0), 3003.0);
        assert_eq!(bilinear(&raster, 0.0, 0.0), 0.0);
        assert_eq!(bilinear(&raster, -1.0, -1.0), 0.0);
        assert_eq!(bilinear(&raster, 4.0, 4.0), 3003.0);
    }

    #[test]
    fn test_bilinear_single_pixel_region() {
        let raster = plane(PixelRegion::new(7, 8, 9, 10));
        assert_eq!(bilinear(&raster, 7.4, 8.2), 9007.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bounding_region_contains_all_points(
                points in prop::collection::vec((-20.0f64..120.0, -20.0f64..120.0), 1..50)
            ) {
                let (x, y): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
                let region = bounding_region(&x, &y, 100);
                prop_assert!(!region.is_empty());
                prop_assert!(region.x1 <= 100 && region.y1 <= 100);
                for (&px, &py) in x.iter().zip(&y) {
                    let cx = px.clamp(0.0, 99.0);
                    let cy = py.clamp(0.0, 99.0);
                    prop_assert!(cx >= region.x0 as f64 && cx <= (region.x1 - 1) as f64);
                    prop_assert!(cy >= region.y0 as f64 && cy <= (region.y1 - 1) as f64);
                }
            }

            #[test]
            fn bilinear_matches_clamped_plane(x in -5.0f64..60.0, y in -5.0f64..60.0) {
                let raster = plane(PixelRegion::new(0, 50, 0, 50));
                let expected = x.clamp(0.0, 49.0) + 1000.0 * y.clamp(0.0, 49.0);
                prop_assert!((bilinear(&raster, x, y) - expected).abs() < 1e-6);
            }
        }
    }
}
