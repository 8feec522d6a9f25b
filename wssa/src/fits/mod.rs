//! FITS access for tile rasters and catalog tables.
//!
//! A thin layer over [`fitsio`] (cfitsio) covering what the tile rasters
//! and lookup catalogs need:
//!
//! - [`FitsFile`] opens plain or gzip-compressed files and reads image
//!   sections row by row, never the whole image
//! - [`ImageSection`] holds the pixels of one section with BSCALE/BZERO
//!   already applied
//! - [`TableHdu`] describes a binary table whose columns are read through
//!   [`FitsFile::column`]
//!
//! Gzip files are inflated as a stream into a temporary file, so memory
//! use does not grow with the size of the tile.

mod error;
mod file;
mod image;

pub use error::{FitsError, Result};
pub use file::{FitsFile, TableHdu};
pub use image::ImageSection;
