//! CLI command implementations.

pub mod common;
pub mod config;
pub mod extensions;
pub mod getval;
pub mod healpix;
pub mod resolve;
