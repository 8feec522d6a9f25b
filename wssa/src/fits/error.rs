//! FITS error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for FITS operations.
pub type Result<T> = std::result::Result<T, FitsError>;

/// Errors from reading FITS files.
#[derive(Debug, Error)]
pub enum FitsError {
    /// The file could not be read or inflated.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// cfitsio rejected the file.
    #[error("Failed to open FITS file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: fitsio::errors::Error,
    },

    /// An HDU, keyword or data read failed on an open file.
    #[error(transparent)]
    Fitsio(#[from] fitsio::errors::Error),

    #[error("HDU {0} is not a 2-d image")]
    NotAnImage(usize),

    #[error("HDU {0} is not a binary table")]
    NotATable(usize),

    #[error("Column {0} not found")]
    ColumnNotFound(String),

    /// The requested section is empty or lies outside the image.
    #[error(
        "Section x={x0}..{x1}, y={y0}..{y1} outside image of {width}x{height} pixels"
    )]
    SectionOutOfBounds {
        x0: usize,
        x1: usize,
        y0: usize,
        y1: usize,
        width: usize,
        height: usize,
    },
}
