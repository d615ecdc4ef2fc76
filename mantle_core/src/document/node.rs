// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outline and document records.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::any::Any;

use kurbo::{Insets, Rect, Size, Vec2};

use super::id::{DocId, OutlineId};
use crate::calc::CalcValue;
use crate::context::{BehaviorId, LayoutId};
use crate::data::DataRef;
use crate::field::FieldId;
use crate::skin::SkinNodeId;
use crate::spatial::SpatialId;

/// The layout inputs of an outline, all in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    /// Absolute edge offsets.
    pub abs: Rect,
    /// Edges as fractions of the parent's size.
    pub rel: Rect,
    /// Absolute pivot offset.
    pub center: Vec2,
    /// Pivot as a fraction of the node's own size.
    pub center_rel: Vec2,
    /// Outer spacing.
    pub margin: Insets,
    /// Inner spacing.
    pub padding: Insets,
    /// Minimum size.
    pub min: Size,
    /// Maximum size.
    pub max: Size,
}

impl Geometry {
    /// Reads a geometry field.
    #[must_use]
    pub fn get(&self, field: FieldId) -> Option<f64> {
        let mut copy = *self;
        copy.slot_mut(field).map(|v| *v)
    }

    /// The storage behind a geometry field.
    pub fn slot_mut(&mut self, field: FieldId) -> Option<&mut f64> {
        Some(match field {
            FieldId::ABS_LEFT => &mut self.abs.x0,
            FieldId::ABS_TOP => &mut self.abs.y0,
            FieldId::ABS_RIGHT => &mut self.abs.x1,
            FieldId::ABS_BOTTOM => &mut self.abs.y1,
            FieldId::REL_LEFT => &mut self.rel.x0,
            FieldId::REL_TOP => &mut self.rel.y0,
            FieldId::REL_RIGHT => &mut self.rel.x1,
            FieldId::REL_BOTTOM => &mut self.rel.y1,
            FieldId::CENTER_X => &mut self.center.x,
            FieldId::CENTER_Y => &mut self.center.y,
            FieldId::CENTER_REL_X => &mut self.center_rel.x,
            FieldId::CENTER_REL_Y => &mut self.center_rel.y,
            FieldId::MARGIN_LEFT => &mut self.margin.x0,
            FieldId::MARGIN_TOP => &mut self.margin.y0,
            FieldId::MARGIN_RIGHT => &mut self.margin.x1,
            FieldId::MARGIN_BOTTOM => &mut self.margin.y1,
            FieldId::PADDING_LEFT => &mut self.padding.x0,
            FieldId::PADDING_TOP => &mut self.padding.y0,
            FieldId::PADDING_RIGHT => &mut self.padding.x1,
            FieldId::PADDING_BOTTOM => &mut self.padding.y1,
            FieldId::MIN_X => &mut self.min.width,
            FieldId::MIN_Y => &mut self.min.height,
            FieldId::MAX_X => &mut self.max.width,
            FieldId::MAX_Y => &mut self.max.height,
            _ => return None,
        })
    }
}

/// Where a behavior or layout swap currently stands.
///
/// A swap runs to completion inside one call; the phase is only observable
/// from within the messages and layout calls the swap makes. A second swap
/// requested while one is in progress is ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SwapPhase {
    /// No swap in progress.
    #[default]
    Idle,
    /// Children are being removed from the outgoing layout.
    Detaching,
    /// The outgoing component's state is being torn down.
    Destroying,
    /// The incoming component's state is being built and its fields bound.
    Constructing,
    /// Children are being added to the incoming layout.
    Reattaching,
}

/// The skin node an outline was generated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Template {
    /// Index into the document's skin list.
    pub(crate) skin: usize,
    pub(crate) node: SkinNodeId,
}

/// The instantiated form of one skin node.
///
/// Outlines hold what the skin asked for: geometry, font metrics and the
/// requested behavior and layout. The bound [`DocumentNode`] holds what is
/// active.
#[derive(Debug)]
pub struct OutlineNode {
    pub(crate) parent: Option<OutlineId>,
    pub(crate) children: Vec<OutlineId>,
    pub(crate) template: Option<Template>,
    pub(crate) data: Option<DataRef>,
    pub(crate) doc: Option<DocId>,
    pub(crate) geometry: Geometry,
    pub(crate) font_size: f64,
    pub(crate) line_height: f64,
    pub(crate) zindex: i64,
    pub(crate) flags: i64,
    pub(crate) behavior: Option<BehaviorId>,
    pub(crate) layout: LayoutId,
    pub(crate) swap: SwapPhase,
}

impl OutlineNode {
    pub(crate) fn new(parent: Option<OutlineId>, layout: LayoutId) -> Self {
        Self {
            parent,
            children: Vec::new(),
            template: None,
            data: None,
            doc: None,
            geometry: Geometry::default(),
            font_size: 0.0,
            line_height: 0.0,
            zindex: 0,
            flags: 0,
            behavior: None,
            layout,
            swap: SwapPhase::Idle,
        }
    }

    /// The parent outline, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<OutlineId> {
        self.parent
    }

    /// Child outlines in generation order.
    #[must_use]
    pub fn children(&self) -> &[OutlineId] {
        &self.children
    }

    /// The data object this outline is bound to.
    #[must_use]
    pub fn data(&self) -> Option<DataRef> {
        self.data
    }

    /// The document bound to this outline.
    #[must_use]
    pub fn doc(&self) -> Option<DocId> {
        self.doc
    }

    /// Layout inputs.
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Font size in pixels.
    #[must_use]
    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Line height in pixels.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    /// Stacking order hint.
    #[must_use]
    pub fn zindex(&self) -> i64 {
        self.zindex
    }

    /// Layout flags.
    #[must_use]
    pub fn flags(&self) -> i64 {
        self.flags
    }

    /// The behavior the skin asked for.
    #[must_use]
    pub fn behavior(&self) -> Option<BehaviorId> {
        self.behavior
    }

    /// The layout the skin asked for.
    #[must_use]
    pub fn layout(&self) -> LayoutId {
        self.layout
    }

    /// The current swap phase.
    #[must_use]
    pub fn swap_phase(&self) -> SwapPhase {
        self.swap
    }

    /// Reads a writable standard field.
    pub(crate) fn standard(&self, field: FieldId) -> Option<CalcValue> {
        match field {
            FieldId::FONT_SIZE => Some(CalcValue::Float(self.font_size)),
            FieldId::LINE_HEIGHT => Some(CalcValue::Float(self.line_height)),
            FieldId::ZINDEX => Some(CalcValue::Int(self.zindex)),
            FieldId::FLAGS => Some(CalcValue::Int(self.flags)),
            _ => self.geometry.get(field).map(CalcValue::Float),
        }
    }

    /// Writes a writable standard field.
    ///
    /// Returns `None` if `field` is not one, or `value` has the wrong kind,
    /// and otherwise whether the stored value changed.
    pub(crate) fn store(&mut self, field: FieldId, value: &CalcValue) -> Option<bool> {
        match field {
            FieldId::FONT_SIZE => replace(&mut self.font_size, value.as_f64()?),
            FieldId::LINE_HEIGHT => replace(&mut self.line_height, value.as_f64()?),
            FieldId::ZINDEX => replace(&mut self.zindex, value.as_i64()?),
            FieldId::FLAGS => replace(&mut self.flags, value.as_i64()?),
            _ => {
                let v = value.as_f64()?;
                replace(self.geometry.slot_mut(field)?, v)
            }
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> Option<bool> {
    let changed = *slot != value;
    *slot = value;
    Some(changed)
}

/// The live component bound to an outline.
#[derive(Debug)]
pub struct DocumentNode {
    pub(crate) outline: OutlineId,
    pub(crate) behavior: Option<BehaviorId>,
    pub(crate) layout: LayoutId,
    pub(crate) state: Option<Box<dyn Any>>,
    pub(crate) aux: Option<Box<dyn Any>>,
    pub(crate) spatial: Option<SpatialId>,
    pub(crate) area: Rect,
    pub(crate) attached: bool,
    /// The pass each field was last evaluated in.
    pub(crate) transitions: BTreeMap<FieldId, u64>,
}

impl DocumentNode {
    pub(crate) fn new(outline: OutlineId, layout: LayoutId) -> Self {
        Self {
            outline,
            behavior: None,
            layout,
            state: None,
            aux: None,
            spatial: None,
            area: Rect::ZERO,
            attached: false,
            transitions: BTreeMap::new(),
        }
    }

    /// The outline this document is bound to.
    #[must_use]
    pub fn outline(&self) -> OutlineId {
        self.outline
    }

    /// The active behavior.
    #[must_use]
    pub fn behavior(&self) -> Option<BehaviorId> {
        self.behavior
    }

    /// The active layout.
    #[must_use]
    pub fn layout(&self) -> LayoutId {
        self.layout
    }

    /// The resolved area, in root coordinates.
    #[must_use]
    pub fn area(&self) -> Rect {
        self.area
    }

    /// The spatial node indexing this document, once it has been placed.
    #[must_use]
    pub fn spatial(&self) -> Option<SpatialId> {
        self.spatial
    }

    /// Whether the parent's layout has been told about this document.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}
