// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `box` behavior: a filled rectangle with an optional border.

use alloc::boxed::Box;
use core::any::Any;

use super::color;
use crate::calc::{CalcKind, CalcValue};
use crate::context::{BehaviorDef, Host};
use crate::document::{DocId, Document};
use crate::field::{FieldId, FieldInfo};
use crate::message::{Message, MessageResult, RectStyle};
use crate::resolver::Resolver;

/// State of a `box` document.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxState {
    /// Fill color, `0xRRGGBBAA`.
    pub fill_color: u32,
    /// Border thickness.
    pub border: f64,
    /// Border color, `0xRRGGBBAA`.
    pub border_color: u32,
    /// Blur radius.
    pub blur: f64,
    /// Corner radii: top-left, top-right, bottom-right, bottom-left.
    pub corners: [f64; 4],
}

impl BoxState {
    /// The style this state draws with.
    #[must_use]
    pub const fn style(&self) -> RectStyle {
        RectStyle {
            fill: self.fill_color,
            border: self.border,
            border_color: self.border_color,
            blur: self.blur,
            corners: self.corners,
        }
    }
}

const FIELDS: &[FieldInfo] = &[
    FieldInfo::new("fillcolor", FieldId::FILL_COLOR, CalcKind::Int),
    FieldInfo::new("border", FieldId::BORDER, CalcKind::Float),
    FieldInfo::new("bordercolor", FieldId::BORDER_COLOR, CalcKind::Int),
    FieldInfo::new("blur", FieldId::BLUR, CalcKind::Float),
    FieldInfo::new("corner_nw", FieldId::CORNER_NW, CalcKind::Float),
    FieldInfo::new("corner_ne", FieldId::CORNER_NE, CalcKind::Float),
    FieldInfo::new("corner_se", FieldId::CORNER_SE, CalcKind::Float),
    FieldInfo::new("corner_sw", FieldId::CORNER_SW, CalcKind::Float),
];

fn corner(field: FieldId) -> Option<usize> {
    match field {
        FieldId::CORNER_NW => Some(0),
        FieldId::CORNER_NE => Some(1),
        FieldId::CORNER_SE => Some(2),
        FieldId::CORNER_SW => Some(3),
        _ => None,
    }
}

/// Field access for [`BoxState`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BoxResolver;

impl Resolver for BoxResolver {
    fn fields(&self) -> &'static [FieldInfo] {
        FIELDS
    }

    fn get(&self, state: &dyn Any, field: FieldId) -> Option<CalcValue> {
        let s = state.downcast_ref::<BoxState>()?;
        match field {
            FieldId::FILL_COLOR => Some(CalcValue::Int(i64::from(s.fill_color))),
            FieldId::BORDER => Some(CalcValue::Float(s.border)),
            FieldId::BORDER_COLOR => Some(CalcValue::Int(i64::from(s.border_color))),
            FieldId::BLUR => Some(CalcValue::Float(s.blur)),
            _ => corner(field).map(|i| CalcValue::Float(s.corners[i])),
        }
    }

    fn set(&self, state: &mut dyn Any, field: FieldId, value: &CalcValue) -> bool {
        let Some(s) = state.downcast_mut::<BoxState>() else {
            return false;
        };
        let (Some(n), Some(c)) = (value.as_f64(), color(value)) else {
            return false;
        };
        match field {
            FieldId::FILL_COLOR => s.fill_color = c,
            FieldId::BORDER => s.border = n,
            FieldId::BORDER_COLOR => s.border_color = c,
            FieldId::BLUR => s.blur = n,
            _ => match corner(field) {
                Some(i) => s.corners[i] = n,
                None => return false,
            },
        }
        true
    }
}

fn dispatch(
    doc: &mut Document,
    _host: Host<'_>,
    id: DocId,
    msg: &mut Message<'_>,
) -> MessageResult {
    if let Message::Draw { area, canvas } = msg
        && let Some(state) = doc.state::<BoxState>(id)
    {
        canvas.draw_rect(*area, &state.style());
    }
    MessageResult::Unhandled
}

fn new_state() -> Box<dyn Any> {
    Box::new(BoxState::default())
}

/// The registry entry for `box`.
#[must_use]
pub fn definition() -> BehaviorDef {
    BehaviorDef::new("box", dispatch, &BoxResolver, new_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_round_trips_every_field() {
        let mut state = BoxState::default();
        let r = BoxResolver;
        assert!(r.set(&mut state, FieldId::FILL_COLOR, &CalcValue::Int(0xFF00_00FF)));
        assert!(r.set(&mut state, FieldId::CORNER_SE, &CalcValue::Float(4.0)));
        assert_eq!(state.fill_color, 0xFF00_00FF);
        assert_eq!(state.corners, [0.0, 0.0, 4.0, 0.0]);
        assert_eq!(
            r.get(&state, FieldId::FILL_COLOR),
            Some(CalcValue::Int(0xFF00_00FF))
        );
    }

    #[test]
    fn resolver_rejects_foreign_fields() {
        let mut state = BoxState::default();
        let r = BoxResolver;
        assert!(!r.set(&mut state, FieldId::TEXT, &CalcValue::Int(1)));
        assert!(!r.set(&mut state, FieldId::BORDER, &CalcValue::Str("x".into())));
        assert_eq!(r.get(&state, FieldId::ABS_LEFT), None);
        assert_eq!(r.id_of("BorderColor"), Some(FieldId::BORDER_COLOR));
    }

    #[test]
    fn style_mirrors_state() {
        let state = BoxState {
            fill_color: 1,
            border: 2.0,
            border_color: 3,
            blur: 4.0,
            corners: [5.0; 4],
        };
        let style = state.style();
        assert_eq!(style.fill, 1);
        assert_eq!(style.border_color, 3);
        assert_eq!(style.corners, [5.0; 4]);
    }
}
