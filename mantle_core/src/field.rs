// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Numeric field identifiers and the standard outline field table.
//!
//! Skins name fields with strings; the engine resolves each name once, at
//! skin build time, to a [`FieldId`]. Standard fields are owned by every
//! outline. Behaviors and layouts declare additional fields through their
//! [`Resolver`](crate::resolver::Resolver).

use core::fmt;

use crate::calc::CalcKind;

/// A numeric field identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

impl FieldId {
    /// No field.
    pub const NONE: Self = Self(0);

    /// Absolute left edge.
    pub const ABS_LEFT: Self = Self(1);
    /// Absolute top edge.
    pub const ABS_TOP: Self = Self(2);
    /// Absolute right edge.
    pub const ABS_RIGHT: Self = Self(3);
    /// Absolute bottom edge.
    pub const ABS_BOTTOM: Self = Self(4);
    /// Left edge as a fraction of the parent's width.
    pub const REL_LEFT: Self = Self(5);
    /// Top edge as a fraction of the parent's height.
    pub const REL_TOP: Self = Self(6);
    /// Right edge as a fraction of the parent's width.
    pub const REL_RIGHT: Self = Self(7);
    /// Bottom edge as a fraction of the parent's height.
    pub const REL_BOTTOM: Self = Self(8);
    /// Absolute horizontal pivot.
    pub const CENTER_X: Self = Self(9);
    /// Absolute vertical pivot.
    pub const CENTER_Y: Self = Self(10);
    /// Horizontal pivot as a fraction of the node's width.
    pub const CENTER_REL_X: Self = Self(11);
    /// Vertical pivot as a fraction of the node's height.
    pub const CENTER_REL_Y: Self = Self(12);
    /// Left margin.
    pub const MARGIN_LEFT: Self = Self(13);
    /// Top margin.
    pub const MARGIN_TOP: Self = Self(14);
    /// Right margin.
    pub const MARGIN_RIGHT: Self = Self(15);
    /// Bottom margin.
    pub const MARGIN_BOTTOM: Self = Self(16);
    /// Left padding.
    pub const PADDING_LEFT: Self = Self(17);
    /// Top padding.
    pub const PADDING_TOP: Self = Self(18);
    /// Right padding.
    pub const PADDING_RIGHT: Self = Self(19);
    /// Bottom padding.
    pub const PADDING_BOTTOM: Self = Self(20);
    /// Minimum width.
    pub const MIN_X: Self = Self(21);
    /// Minimum height.
    pub const MIN_Y: Self = Self(22);
    /// Maximum width.
    pub const MAX_X: Self = Self(23);
    /// Maximum height.
    pub const MAX_Y: Self = Self(24);
    /// Font size in pixels.
    pub const FONT_SIZE: Self = Self(25);
    /// Line height in pixels.
    pub const LINE_HEIGHT: Self = Self(26);
    /// Stacking order hint.
    pub const ZINDEX: Self = Self(27);
    /// Layout flags.
    pub const FLAGS: Self = Self(28);
    /// Behavior name.
    pub const BEHAVIOR: Self = Self(29);
    /// Layout name.
    pub const LAYOUT: Self = Self(30);

    /// Resolved left edge (read-only).
    pub const AREA_LEFT: Self = Self(31);
    /// Resolved top edge (read-only).
    pub const AREA_TOP: Self = Self(32);
    /// Resolved right edge (read-only).
    pub const AREA_RIGHT: Self = Self(33);
    /// Resolved bottom edge (read-only).
    pub const AREA_BOTTOM: Self = Self(34);
    /// Resolved width (read-only).
    pub const WIDTH: Self = Self(35);
    /// Resolved height (read-only).
    pub const HEIGHT: Self = Self(36);

    /// Fill color, `0xRRGGBBAA`.
    pub const FILL_COLOR: Self = Self(64);
    /// Border thickness.
    pub const BORDER: Self = Self(65);
    /// Border color, `0xRRGGBBAA`.
    pub const BORDER_COLOR: Self = Self(66);
    /// Blur radius.
    pub const BLUR: Self = Self(67);
    /// Top-left corner radius.
    pub const CORNER_NW: Self = Self(68);
    /// Top-right corner radius.
    pub const CORNER_NE: Self = Self(69);
    /// Bottom-right corner radius.
    pub const CORNER_SE: Self = Self(70);
    /// Bottom-left corner radius.
    pub const CORNER_SW: Self = Self(71);
    /// Text content.
    pub const TEXT: Self = Self(80);
    /// Text color, `0xRRGGBBAA`.
    pub const TEXT_COLOR: Self = Self(81);

    /// First identifier available to application-defined fields.
    pub const FIRST_CUSTOM: Self = Self(1024);

    /// Returns `true` for the coordinate fields that feed layout.
    #[must_use]
    pub const fn is_geometry(self) -> bool {
        self.0 >= Self::ABS_LEFT.0 && self.0 <= Self::MAX_Y.0
    }

    /// Returns `true` for fields every outline owns.
    #[must_use]
    pub const fn is_standard(self) -> bool {
        self.0 >= Self::ABS_LEFT.0 && self.0 <= Self::HEIGHT.0
    }
}

impl fmt::Debug for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match standard_name(*self) {
            Some(name) => write!(f, "FieldId({name})"),
            None => write!(f, "FieldId({})", self.0),
        }
    }
}

/// A named, typed field declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    /// Name used in skins and state keys.
    pub name: &'static str,
    /// Numeric identifier.
    pub id: FieldId,
    /// The kind calculations bound to this field must produce.
    pub kind: CalcKind,
}

impl FieldInfo {
    /// Declares a field.
    #[must_use]
    pub const fn new(name: &'static str, id: FieldId, kind: CalcKind) -> Self {
        Self { name, id, kind }
    }
}

const fn float(name: &'static str, id: FieldId) -> FieldInfo {
    FieldInfo::new(name, id, CalcKind::Float)
}

/// Fields every outline owns, with their skin names.
pub const STANDARD_FIELDS: &[FieldInfo] = &[
    float("abs_left", FieldId::ABS_LEFT),
    float("abs_top", FieldId::ABS_TOP),
    float("abs_right", FieldId::ABS_RIGHT),
    float("abs_bottom", FieldId::ABS_BOTTOM),
    float("rel_left", FieldId::REL_LEFT),
    float("rel_top", FieldId::REL_TOP),
    float("rel_right", FieldId::REL_RIGHT),
    float("rel_bottom", FieldId::REL_BOTTOM),
    float("c_x", FieldId::CENTER_X),
    float("c_y", FieldId::CENTER_Y),
    float("c_rel_x", FieldId::CENTER_REL_X),
    float("c_rel_y", FieldId::CENTER_REL_Y),
    float("margin_left", FieldId::MARGIN_LEFT),
    float("margin_top", FieldId::MARGIN_TOP),
    float("margin_right", FieldId::MARGIN_RIGHT),
    float("margin_bottom", FieldId::MARGIN_BOTTOM),
    float("padding_left", FieldId::PADDING_LEFT),
    float("padding_top", FieldId::PADDING_TOP),
    float("padding_right", FieldId::PADDING_RIGHT),
    float("padding_bottom", FieldId::PADDING_BOTTOM),
    float("min_x", FieldId::MIN_X),
    float("min_y", FieldId::MIN_Y),
    float("max_x", FieldId::MAX_X),
    float("max_y", FieldId::MAX_Y),
    float("fontsize", FieldId::FONT_SIZE),
    float("lineheight", FieldId::LINE_HEIGHT),
    FieldInfo::new("zindex", FieldId::ZINDEX, CalcKind::Int),
    FieldInfo::new("flags", FieldId::FLAGS, CalcKind::Int),
    FieldInfo::new("behavior", FieldId::BEHAVIOR, CalcKind::Str),
    FieldInfo::new("layout", FieldId::LAYOUT, CalcKind::Str),
    float("area_left", FieldId::AREA_LEFT),
    float("area_top", FieldId::AREA_TOP),
    float("area_right", FieldId::AREA_RIGHT),
    float("area_bottom", FieldId::AREA_BOTTOM),
    float("width", FieldId::WIDTH),
    float("height", FieldId::HEIGHT),
];

/// Looks up a standard field by name (ASCII case-insensitive).
#[must_use]
pub fn standard_field(name: &str) -> Option<&'static FieldInfo> {
    STANDARD_FIELDS
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
}

/// Returns the skin name of a standard field.
#[must_use]
pub fn standard_name(id: FieldId) -> Option<&'static str> {
    STANDARD_FIELDS.iter().find(|f| f.id == id).map(|f| f.name)
}

/// Reports whether a standard field is vertical, for picking the density
/// its units resolve against.
#[must_use]
pub const fn is_vertical(id: FieldId) -> bool {
    matches!(
        id,
        FieldId::ABS_TOP
            | FieldId::ABS_BOTTOM
            | FieldId::REL_TOP
            | FieldId::REL_BOTTOM
            | FieldId::CENTER_Y
            | FieldId::CENTER_REL_Y
            | FieldId::MARGIN_TOP
            | FieldId::MARGIN_BOTTOM
            | FieldId::PADDING_TOP
            | FieldId::PADDING_BOTTOM
            | FieldId::MIN_Y
            | FieldId::MAX_Y
            | FieldId::LINE_HEIGHT
            | FieldId::AREA_TOP
            | FieldId::AREA_BOTTOM
            | FieldId::HEIGHT
    )
}
