//! Query parameters and responses.

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayD;

use super::QueryError;
use crate::release::{ExtensionKind, ExtensionSelector};
use crate::sampler::TileFailure;

/// Output unit for continuous extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Unit {
    /// Native tile units (W3 DN).
    #[default]
    Native,
    /// Native units times the release calibration factor (MJy/sr).
    Calibrated,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Native => write!(f, "native"),
            Unit::Calibrated => write!(f, "calibrated"),
        }
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "dn" => Ok(Unit::Native),
            "calibrated" | "mjysr" => Ok(Unit::Calibrated),
            other => Err(format!(
                "Unknown unit '{}': expected native or calibrated",
                other
            )),
        }
    }
}

/// What to sample and in which unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueQuery {
    pub extension: ExtensionSelector,
    pub unit: Unit,
}

impl ValueQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, extension: impl Into<ExtensionSelector>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn calibrated(self) -> Self {
        self.with_unit(Unit::Calibrated)
    }
}

/// Sampled values shaped like the query coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Continuous(ArrayD<f32>),
    Categorical(ArrayD<i32>),
}

impl Values {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            Values::Continuous(_) => ExtensionKind::Continuous,
            Values::Categorical(_) => ExtensionKind::Categorical,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Values::Continuous(a) => a.shape(),
            Values::Categorical(a) => a.shape(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Values::Continuous(a) => a.len(),
            Values::Categorical(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_continuous(&self) -> Option<&ArrayD<f32>> {
        match self {
            Values::Continuous(a) => Some(a),
            Values::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&ArrayD<i32>> {
        match self {
            Values::Categorical(a) => Some(a),
            Values::Continuous(_) => None,
        }
    }

    /// Widen to `f64`, e.g. for uniform printing.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            Values::Continuous(a) => a.mapv(f64::from),
            Values::Categorical(a) => a.mapv(f64::from),
        }
    }
}

/// Result of a value query.
///
/// Samples on tiles whose raster could not be read are flagged in `failed`
/// and hold NaN (continuous) or 0 (categorical).
#[derive(Debug)]
pub struct ValueResponse {
    pub values: Values,
    /// Per-sample failure flags, same shape as `values`.
    pub failed: ArrayD<bool>,
    pub failures: Vec<TileFailure>,
}

impl ValueResponse {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// All-or-nothing view: any tile failure fails the query.
    pub fn into_complete(self) -> Result<Values, QueryError> {
        if self.failures.is_empty() {
            Ok(self.values)
        } else {
            Err(QueryError::RasterIo {
                failures: self.failures,
            })
        }
    }
}
