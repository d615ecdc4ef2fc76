// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding resolution for calculations evaluated on behalf of an outline.

use crate::calc::{Bindings, CalcKind, CalcType, CalcValue};
use crate::context::Host;
use crate::data::{DataRef, KeyRoot, coerce, lookup, split_key};
use crate::field::FieldId;
use crate::message::{Message, MessageResult};
use crate::unit::UnitContext;

use super::{Document, OutlineId};

/// Answers `Data` and `State` lookups for one outline.
pub(crate) struct OutlineBindings<'d, 'h> {
    pub(crate) doc: &'d mut Document,
    pub(crate) host: Host<'h>,
    pub(crate) outline: OutlineId,
}

impl Bindings for OutlineBindings<'_, '_> {
    fn data(&mut self, key: &str, ty: CalcType, units: &UnitContext) -> CalcValue {
        let (root, path) = split_key(key);
        let Some(base) = self.doc.data_base(self.outline, root) else {
            return CalcValue::zero(ty.kind);
        };
        let field = lookup(self.host.data, base, path);
        coerce(&field, ty, self.host.data, units)
    }

    fn state(&mut self, key: &str, kind: CalcKind) -> CalcValue {
        let Some((target, field)) = self.doc.state_target(self.host, self.outline, key) else {
            return CalcValue::zero(kind);
        };
        let Some(doc) = self.doc.outline(target).doc else {
            return CalcValue::zero(kind);
        };
        match self.doc.send(self.host, doc, &mut Message::GetState(field)) {
            MessageResult::Value(value) if value.kind() == kind => value,
            MessageResult::Value(value) => match kind {
                CalcKind::Float => value.as_f64().map_or(CalcValue::zero(kind), CalcValue::Float),
                CalcKind::Int => value.as_i64().map_or(CalcValue::zero(kind), CalcValue::Int),
                _ => CalcValue::zero(kind),
            },
            _ => CalcValue::zero(kind),
        }
    }
}

impl Document {
    /// The data object a key rooted at `root` resolves against.
    pub(crate) fn data_base(&self, outline: OutlineId, root: KeyRoot) -> Option<DataRef> {
        match root {
            KeyRoot::Node => self.outline(outline).data,
            KeyRoot::Root => self.data_root,
        }
    }

    /// Resolves a state key to the outline and field it names.
    ///
    /// Each leading `^` moves one outline up; walking past the root fails.
    pub(crate) fn state_target(
        &self,
        host: Host<'_>,
        outline: OutlineId,
        key: &str,
    ) -> Option<(OutlineId, FieldId)> {
        let name = key.trim_start_matches('^');
        let mut target = outline;
        for _ in 0..key.len() - name.len() {
            target = self.outline(target).parent?;
        }
        let info = host.ctx.field(name)?;
        Some((target, info.id))
    }
}
