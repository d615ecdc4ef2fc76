// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measurement units and their conversion to pixels.
//!
//! Every numeric value in a calculation may carry a [`Unit`]. Units stay
//! attached to a value until it is consumed (by an operator or as a final
//! result), at which point [`resolve_unit`] converts it to pixels using the
//! [`UnitContext`] of the outline being evaluated.

/// A measurement unit attached to a numeric value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Unit {
    /// Raw pixels. Resolution is the identity.
    #[default]
    Px,
    /// Density-independent pixels (1/96 inch).
    Dp,
    /// Scaled pixels: density-independent pixels times the text scale.
    Sp,
    /// Multiples of the current font size.
    Em,
    /// Multiples of the current line height.
    Ln,
    /// Typographic points (1/72 inch).
    Pt,
    /// Millimeters.
    Mm,
}

impl Unit {
    /// Parses a unit suffix such as `"dp"` or `"em"`.
    ///
    /// Matching is case-insensitive. An empty string parses as [`Unit::Px`].
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let unit = match suffix.as_bytes() {
            [] => Self::Px,
            [a, b] => match [a.to_ascii_lowercase(), b.to_ascii_lowercase()] {
                [b'p', b'x'] => Self::Px,
                [b'd', b'p'] => Self::Dp,
                [b's', b'p'] => Self::Sp,
                [b'e', b'm'] => Self::Em,
                [b'l', b'n'] => Self::Ln,
                [b'p', b't'] => Self::Pt,
                [b'm', b'm'] => Self::Mm,
                _ => return None,
            },
            _ => return None,
        };
        Some(unit)
    }

    /// Returns the canonical lowercase suffix for this unit.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Dp => "dp",
            Self::Sp => "sp",
            Self::Em => "em",
            Self::Ln => "ln",
            Self::Pt => "pt",
            Self::Mm => "mm",
        }
    }
}

/// Everything needed to turn a unit-tagged value into pixels.
///
/// `dpi` is the density along the axis the value is measured on; callers
/// evaluating a vertical coordinate pass the vertical density.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitContext {
    /// Current font size in pixels.
    pub font_size: f64,
    /// Current line height in pixels.
    pub line_height: f64,
    /// Display density in dots per inch.
    pub dpi: f64,
    /// Text scale factor applied to [`Unit::Sp`].
    pub scale: f64,
}

impl UnitContext {
    /// Density of a "standard" display, where one dp equals one pixel.
    pub const BASE_DPI: f64 = 96.0;

    /// A context where every unit except [`Unit::Pt`] and [`Unit::Mm`]
    /// resolves one-to-one against a 96 dpi display.
    pub const IDENTITY: Self = Self {
        font_size: 1.0,
        line_height: 1.0,
        dpi: Self::BASE_DPI,
        scale: 1.0,
    };

    /// Returns a copy of this context measured along a different axis.
    #[inline]
    #[must_use]
    pub const fn with_dpi(self, dpi: f64) -> Self {
        Self { dpi, ..self }
    }
}

impl Default for UnitContext {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Converts `x`, expressed in `unit`, to pixels.
#[must_use]
pub fn resolve_unit(x: f64, unit: Unit, cx: &UnitContext) -> f64 {
    match unit {
        Unit::Px => x,
        Unit::Dp => x * cx.dpi / UnitContext::BASE_DPI,
        Unit::Sp => x * cx.dpi / UnitContext::BASE_DPI * cx.scale,
        Unit::Em => x * cx.font_size,
        Unit::Ln => x * cx.line_height,
        Unit::Pt => x * cx.dpi / 72.0,
        Unit::Mm => x * cx.dpi / 25.4,
    }
}
