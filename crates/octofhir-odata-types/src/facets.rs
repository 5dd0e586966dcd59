//! Facets restricting the values of a primitive-typed element

use serde::{Deserialize, Serialize};

/// Value restrictions declared on a property, parameter or type definition
///
/// For `Decimal`, `precision` is the total number of significant digits and
/// `scale` the digits after the decimal point. For `DateTimeOffset`,
/// `TimeOfDay` and `Duration`, `precision` bounds the fractional seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Facets {
    pub max_length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unicode: Option<bool>,
    pub srid: Option<u32>,
}

impl Facets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_unicode(mut self, unicode: bool) -> Self {
        self.unicode = Some(unicode);
        self
    }

    pub fn with_srid(mut self, srid: u32) -> Self {
        self.srid = Some(srid);
        self
    }

    /// Facets declared here take precedence over `base`
    pub fn overlay(self, base: Facets) -> Self {
        Self {
            max_length: self.max_length.or(base.max_length),
            precision: self.precision.or(base.precision),
            scale: self.scale.or(base.scale),
            unicode: self.unicode.or(base.unicode),
            srid: self.srid.or(base.srid),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
