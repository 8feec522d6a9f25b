//! Image sections.

/// A rectangular block of image pixels.
///
/// `x0`/`y0` locate the block in the full image; `values` are row-major
/// with `width` values per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSection {
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl ImageSection {
    /// Value at `(col, row)` relative to the section origin.
    #[inline]
    pub fn value(&self, col: usize, row: usize) -> f64 {
        self.values[row * self.width + col]
    }
}
