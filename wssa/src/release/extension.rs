//! Tile extension (data layer) descriptions.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// How an extension's pixels are interpreted and sampled.
///
/// A closed set: the sampler matches on it exhaustively to pick the
/// interpolation and the output numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    /// Flux-like values, sampled bilinearly, returned as `f32`.
    Continuous,
    /// Bit-masks, sampled at the nearest pixel, returned as `i32`.
    Categorical,
}

impl ExtensionKind {
    /// Whether the release calibration factor applies to this kind.
    pub fn is_calibratable(self) -> bool {
        matches!(self, ExtensionKind::Continuous)
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionKind::Continuous => write!(f, "continuous"),
            ExtensionKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// One named data layer within every tile raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtensionSpec {
    /// HDU ordinal within the tile file (0 is the primary HDU).
    pub index: usize,
    /// Logical name, e.g. "clean" or "amsk".
    pub name: &'static str,
    pub kind: ExtensionKind,
    /// Human-readable description of the value domain.
    pub description: &'static str,
}

impl ExtensionSpec {
    pub const fn continuous(index: usize, name: &'static str, description: &'static str) -> Self {
        Self {
            index,
            name,
            kind: ExtensionKind::Continuous,
            description,
        }
    }

    pub const fn categorical(index: usize, name: &'static str, description: &'static str) -> Self {
        Self {
            index,
            name,
            kind: ExtensionKind::Categorical,
            description,
        }
    }
}

/// Selects an extension by ordinal or by logical name.
///
/// Parses from a string: anything that is a non-negative integer selects
/// by ordinal, everything else by name.
///
/// ```
/// use wssa::release::ExtensionSelector;
///
/// assert_eq!("5".parse::<ExtensionSelector>().unwrap(), ExtensionSelector::Index(5));
/// assert_eq!(
///     "clean".parse::<ExtensionSelector>().unwrap(),
///     ExtensionSelector::Name("clean".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExtensionSelector {
    Index(usize),
    Name(String),
}

impl Default for ExtensionSelector {
    fn default() -> Self {
        ExtensionSelector::Index(0)
    }
}

impl fmt::Display for ExtensionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionSelector::Index(index) => write!(f, "{}", index),
            ExtensionSelector::Name(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for ExtensionSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<usize>() {
            Ok(index) => ExtensionSelector::Index(index),
            Err(_) => ExtensionSelector::Name(s.to_string()),
        })
    }
}

impl From<usize> for ExtensionSelector {
    fn from(index: usize) -> Self {
        ExtensionSelector::Index(index)
    }
}

impl From<&str> for ExtensionSelector {
    fn from(name: &str) -> Self {
        ExtensionSelector::Name(name.to_string())
    }
}
