// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed message dispatch between documents and their behaviors.
//!
//! [`Document::send`] hands a [`Message`] to the behavior bound to the
//! target document. A behavior that returns [`MessageResult::Unhandled`]
//! falls through to [`default_behavior`], which implements child
//! management through the layout, the draw traversal, the three-stage state
//! resolver chain and DPI/text-scale inheritance.

use core::fmt;

use kurbo::{Rect, Vec2};

use crate::calc::CalcValue;
use crate::context::Host;
use crate::document::{DocId, Document};
use crate::field::FieldId;
use crate::layout::LayoutOp;

/// Fill and border parameters for [`Canvas::draw_rect`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RectStyle {
    /// Fill color, `0xRRGGBBAA`.
    pub fill: u32,
    /// Border thickness in pixels.
    pub border: f64,
    /// Border color, `0xRRGGBBAA`.
    pub border_color: u32,
    /// Blur radius in pixels.
    pub blur: f64,
    /// Corner radii: top-left, top-right, bottom-right, bottom-left.
    pub corners: [f64; 4],
}

/// Text parameters for [`Canvas::draw_text`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextStyle {
    /// Text color, `0xRRGGBBAA`.
    pub color: u32,
    /// Font size in pixels.
    pub font_size: f64,
    /// Line height in pixels.
    pub line_height: f64,
}

/// The drawing backend. Areas are in root coordinates.
pub trait Canvas {
    /// Draws a rectangle.
    fn draw_rect(&mut self, area: Rect, style: &RectStyle);

    /// Draws a run of text inside `area`.
    fn draw_text(&mut self, area: Rect, text: &str, style: &TextStyle);
}

/// A message delivered to a document.
pub enum Message<'a> {
    /// The behavior's state was just allocated.
    Construct,
    /// The behavior's state is about to be freed.
    Destroy,
    /// Paint into `canvas`; `area` is the document's area.
    Draw {
        /// Area to paint, in root coordinates.
        area: Rect,
        /// Destination.
        canvas: &'a mut dyn Canvas,
    },
    /// A child document was attached.
    AddChild(DocId),
    /// A child document is being detached.
    RemoveChild(DocId),
    /// Read a field.
    GetState(FieldId),
    /// Write a field.
    SetState {
        /// Field to write.
        field: FieldId,
        /// New value.
        value: CalcValue,
    },
    /// Query the display density.
    GetDpi,
    /// Query the text scale factor.
    GetTextScale,
    /// The document gained input focus.
    GotFocus,
    /// The document lost input focus.
    LostFocus,
    /// Application-defined message.
    Custom(u32),
}

impl fmt::Debug for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construct => f.write_str("Construct"),
            Self::Destroy => f.write_str("Destroy"),
            Self::Draw { area, .. } => f
                .debug_struct("Draw")
                .field("area", area)
                .finish_non_exhaustive(),
            Self::AddChild(c) => f.debug_tuple("AddChild").field(c).finish(),
            Self::RemoveChild(c) => f.debug_tuple("RemoveChild").field(c).finish(),
            Self::GetState(field) => f.debug_tuple("GetState").field(field).finish(),
            Self::SetState { field, value } => f
                .debug_struct("SetState")
                .field("field", field)
                .field("value", value)
                .finish(),
            Self::GetDpi => f.write_str("GetDpi"),
            Self::GetTextScale => f.write_str("GetTextScale"),
            Self::GotFocus => f.write_str("GotFocus"),
            Self::LostFocus => f.write_str("LostFocus"),
            Self::Custom(n) => f.debug_tuple("Custom").field(n).finish(),
        }
    }
}

/// The answer to a [`Message`].
#[derive(Clone, Debug, PartialEq)]
pub enum MessageResult {
    /// The message was processed.
    Handled,
    /// The behavior does not handle this message; try the default.
    Unhandled,
    /// The message was understood and refused.
    Rejected,
    /// A field value.
    Value(CalcValue),
    /// Display density per axis.
    Dpi(Vec2),
    /// Text scale factor.
    Scale(f64),
}

impl MessageResult {
    /// Returns `true` unless the message was refused or ignored.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, Self::Unhandled | Self::Rejected)
    }
}

/// The behavior every document falls back to.
pub fn default_behavior(
    doc: &mut Document,
    host: Host<'_>,
    id: DocId,
    msg: &mut Message<'_>,
) -> MessageResult {
    match msg {
        Message::Construct | Message::Destroy => MessageResult::Handled,
        Message::AddChild(child) => {
            let layout = host.ctx.layout(doc.document(id).layout()).layout;
            layout(doc, host, id, *child, LayoutOp::Add);
            MessageResult::Handled
        }
        Message::RemoveChild(child) => {
            let layout = host.ctx.layout(doc.document(id).layout()).layout;
            layout(doc, host, id, *child, LayoutOp::Remove);
            MessageResult::Handled
        }
        Message::Draw { canvas, .. } => {
            for child in doc.draw_order(id) {
                let area = doc.document(child).area();
                doc.send(
                    host,
                    child,
                    &mut Message::Draw {
                        area,
                        canvas: &mut **canvas,
                    },
                );
            }
            MessageResult::Handled
        }
        Message::GetState(field) => match doc.resolve_state(host, id, *field) {
            Some(value) => MessageResult::Value(value),
            None => MessageResult::Rejected,
        },
        Message::SetState { field, value } => {
            if doc.assign_state(host, id, *field, value) {
                MessageResult::Handled
            } else {
                MessageResult::Rejected
            }
        }
        Message::GetDpi => match doc.parent_document(id) {
            Some(parent) => doc.send(host, parent, &mut Message::GetDpi),
            None => MessageResult::Dpi(doc.config().dpi),
        },
        Message::GetTextScale => match doc.parent_document(id) {
            Some(parent) => doc.send(host, parent, &mut Message::GetTextScale),
            None => MessageResult::Scale(doc.config().scale),
        },
        Message::GotFocus | Message::LostFocus | Message::Custom(_) => MessageResult::Rejected,
    }
}

impl Document {
    /// Delivers a message to a document's behavior, falling back to
    /// [`default_behavior`].
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn send(&mut self, host: Host<'_>, id: DocId, msg: &mut Message<'_>) -> MessageResult {
        if let Some(behavior) = self.document(id).behavior() {
            let dispatch = host.ctx.behavior(behavior).dispatch;
            let result = dispatch(self, host, id, msg);
            if result != MessageResult::Unhandled {
                return result;
            }
        }
        default_behavior(self, host, id, msg)
    }

    /// Delivers an input message, bubbling it to ancestors while rejected.
    ///
    /// Returns the first accepting answer, or the root's refusal.
    pub fn inject(&mut self, host: Host<'_>, id: DocId, msg: &mut Message<'_>) -> MessageResult {
        let mut target = Some(id);
        let mut result = MessageResult::Rejected;
        while let Some(t) = target {
            result = self.send(host, t, msg);
            if result.is_accepted() {
                break;
            }
            target = self.parent_document(t);
        }
        result
    }

    /// Draws the whole document into `canvas`.
    pub fn draw(&mut self, host: Host<'_>, canvas: &mut dyn Canvas) {
        let root = self.root_document();
        let area = self.document(root).area();
        self.send(host, root, &mut Message::Draw { area, canvas });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_results() {
        assert!(MessageResult::Handled.is_accepted());
        assert!(MessageResult::Value(CalcValue::Int(1)).is_accepted());
        assert!(MessageResult::Scale(1.0).is_accepted());
        assert!(!MessageResult::Unhandled.is_accepted());
        assert!(!MessageResult::Rejected.is_accepted());
    }

    #[test]
    fn draw_message_debug_hides_the_canvas() {
        struct Nothing;
        impl Canvas for Nothing {
            fn draw_rect(&mut self, _: Rect, _: &RectStyle) {}
            fn draw_text(&mut self, _: Rect, _: &str, _: &TextStyle) {}
        }
        let mut canvas = Nothing;
        let msg = Message::Draw {
            area: Rect::new(0.0, 0.0, 1.0, 1.0),
            canvas: &mut canvas,
        };
        let text = alloc::format!("{msg:?}");
        assert!(text.starts_with("Draw"), "{text}");
        assert!(text.contains(".."), "{text}");
    }
}
