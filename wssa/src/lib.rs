//! WSSA - WISE 12 micron all-sky tile sampling
//!
//! This library looks up values in the WISE W3 all-sky tile set at
//! arbitrary celestial coordinates. Coordinates are mapped to one of the
//! tiles through a HEALPix ring lookup table, projected onto that tile's
//! gnomonic plane, and sampled from the tile raster: bilinearly for
//! intensity layers and nearest-pixel for bit-masks.
//!
//! The usual entry point is [`service::ValueService`]; the lower layers
//! ([`healpix`], [`resolver`], [`sampler`]) are public for callers that
//! need tile positions or their own raster sources.

pub mod catalog;
pub mod config;
pub mod fits;
pub mod healpix;
pub mod logging;
pub mod projection;
pub mod raster;
pub mod release;
pub mod resolver;
pub mod sampler;
pub mod service;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
