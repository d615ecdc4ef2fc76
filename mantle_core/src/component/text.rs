// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `text` behavior: one run of text in the outline's font metrics.

use alloc::boxed::Box;
use alloc::string::String;
use core::any::Any;

use super::color;
use crate::calc::{CalcKind, CalcValue};
use crate::context::{BehaviorDef, Host};
use crate::document::{DocId, Document};
use crate::field::{FieldId, FieldInfo};
use crate::message::{Message, MessageResult, TextStyle};
use crate::resolver::Resolver;

/// State of a `text` document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextState {
    /// The text to draw.
    pub text: String,
    /// Text color, `0xRRGGBBAA`.
    pub color: u32,
    /// Font size in pixels, taken from the outline on construction and
    /// before every draw.
    pub font_size: f64,
}

const FIELDS: &[FieldInfo] = &[
    FieldInfo::new("text", FieldId::TEXT, CalcKind::Str),
    FieldInfo::new("color", FieldId::TEXT_COLOR, CalcKind::Int),
];

/// Field access for [`TextState`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TextResolver;

impl Resolver for TextResolver {
    fn fields(&self) -> &'static [FieldInfo] {
        FIELDS
    }

    fn get(&self, state: &dyn Any, field: FieldId) -> Option<CalcValue> {
        let s = state.downcast_ref::<TextState>()?;
        match field {
            FieldId::TEXT => Some(CalcValue::Str(s.text.clone())),
            FieldId::TEXT_COLOR => Some(CalcValue::Int(i64::from(s.color))),
            _ => None,
        }
    }

    fn set(&self, state: &mut dyn Any, field: FieldId, value: &CalcValue) -> bool {
        let Some(s) = state.downcast_mut::<TextState>() else {
            return false;
        };
        match (field, value) {
            (FieldId::TEXT, CalcValue::Str(text)) => {
                s.text.clone_from(text);
                true
            }
            (FieldId::TEXT_COLOR, _) => match color(value) {
                Some(c) => {
                    s.color = c;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }
}

fn dispatch(
    doc: &mut Document,
    _host: Host<'_>,
    id: DocId,
    msg: &mut Message<'_>,
) -> MessageResult {
    match msg {
        Message::Construct => sync_font(doc, id),
        Message::Draw { area, canvas } => {
            sync_font(doc, id);
            let line_height = doc.outline(doc.document(id).outline()).line_height();
            if let Some(state) = doc.state::<TextState>(id) {
                let style = TextStyle {
                    color: state.color,
                    font_size: state.font_size,
                    line_height,
                };
                canvas.draw_text(*area, &state.text, &style);
            }
        }
        _ => {}
    }
    MessageResult::Unhandled
}

/// Copies the outline's current font size into the state.
fn sync_font(doc: &mut Document, id: DocId) {
    let size = doc.outline(doc.document(id).outline()).font_size();
    if let Some(state) = doc.state_mut::<TextState>(id) {
        state.font_size = size;
    }
}

fn new_state() -> Box<dyn Any> {
    Box::new(TextState::default())
}

/// The registry entry for `text`.
#[must_use]
pub fn definition() -> BehaviorDef {
    BehaviorDef::new("text", dispatch, &TextResolver, new_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_color_are_settable() {
        let mut state = TextState::default();
        let r = TextResolver;
        assert!(r.set(&mut state, FieldId::TEXT, &CalcValue::Str("hello".into())));
        assert!(r.set(&mut state, FieldId::TEXT_COLOR, &CalcValue::Int(0x0000_00FF)));
        assert_eq!(state.text, "hello");
        assert_eq!(r.get(&state, FieldId::TEXT_COLOR), Some(CalcValue::Int(0xFF)));
    }

    #[test]
    fn text_rejects_non_strings() {
        let mut state = TextState::default();
        assert!(!TextResolver.set(&mut state, FieldId::TEXT, &CalcValue::Int(3)));
        assert!(!TextResolver.set(&mut state, FieldId::FILL_COLOR, &CalcValue::Int(3)));
        assert_eq!(TextResolver.id_of("color"), Some(FieldId::TEXT_COLOR));
    }
}
