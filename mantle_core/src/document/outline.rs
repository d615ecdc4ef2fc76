// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-field resolution, component swaps and change propagation.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::calc::{CalcValue, Calculation, evaluate};
use crate::context::{BehaviorId, Context, Host, LayoutId};
use crate::data::{DataAccessor, DataRef, DataValue, resolve_container};
use crate::dirty;
use crate::event::{Delivery, EventId, EventSource, EventTuple, Registration};
use crate::field::{FieldId, is_vertical};
use crate::layout::LayoutOp;
use crate::message::{Message, MessageResult};
use crate::resolver::Resolver;
use crate::skin::SkinNode;
use crate::trace::{
    DiagnosticEvent, DiagnosticKind, EdgeEvent, EdgeEventKind, FieldChangeEvent, FireEvent,
    SwapEvent, SwapTarget,
};
use crate::unit::UnitContext;

use super::bindings::OutlineBindings;
use super::{DocId, Document, DocumentNode, Listener, OutlineId, SwapPhase};

/// Scalar fields resolved before the behavior and layout.
const METRIC_FIELDS: [FieldId; 4] = [
    FieldId::FONT_SIZE,
    FieldId::LINE_HEIGHT,
    FieldId::ZINDEX,
    FieldId::FLAGS,
];

/// The listener the generator links for every static binding: re-evaluate
/// the destination field unless it was already recomputed this pass.
pub(crate) fn reevaluate(doc: &mut Document, host: Host<'_>, delivery: &Delivery) {
    let dest = delivery.tuple.dest;
    let field = delivery.tuple.dest_field;
    if !doc.contains_outline(dest) {
        return;
    }
    if let Some(d) = doc.outline(dest).doc
        && doc.document(d).transitions.get(&field) == Some(&doc.pass)
    {
        return;
    }
    doc.regenerate(host, dest, Some(field));
}

impl Document {
    // -- Field resolution --

    /// Re-evaluates an outline's skin bindings.
    ///
    /// With `only == None` every bound field is evaluated; otherwise just
    /// that one. Fields are resolved in a fixed order: font metrics, z-index
    /// and flags first (so `em` and `ln` units below see them), then the
    /// behavior and layout (swapping components on a name change), then
    /// geometry, then the fields the active behavior and layout declare.
    ///
    /// Values that changed are fired to their dependents afterwards. A
    /// document not yet attached is attached to its parent; an attached one
    /// whose geometry changed is reflowed through its parent's layout.
    pub(crate) fn regenerate(&mut self, host: Host<'_>, id: OutlineId, only: Option<FieldId>) {
        let Some(template) = self.outline(id).template else {
            return;
        };
        let skin = Rc::clone(&self.skins[template.skin]);
        let node = skin.node(template.node);
        let wants = |field: FieldId| only.is_none_or(|o| o == field);
        let doc = match self.outline(id).doc {
            Some(doc) => doc,
            None => self.create_document(host, id),
        };
        let mut changed = Vec::new();

        for field in METRIC_FIELDS {
            if wants(field)
                && let Some(calc) = node.field(field)
            {
                let value = self.eval_field(host, id, doc, field, calc);
                if self.outline_mut(id).store(field, &value) == Some(true) {
                    changed.push(field);
                }
            }
        }

        let mut swapped_behavior = false;
        if wants(FieldId::BEHAVIOR)
            && let Some(calc) = node.field(FieldId::BEHAVIOR)
        {
            let value = self.eval_field(host, id, doc, FieldId::BEHAVIOR, calc);
            let name = value.as_str().unwrap_or_default();
            match host.ctx.behavior_id(name) {
                Some(next) if self.outline(id).behavior != Some(next) => {
                    if let Some(fields) = self.swap_behavior(host, id, doc, node, next) {
                        swapped_behavior = true;
                        changed.push(FieldId::BEHAVIOR);
                        changed.extend(fields);
                    }
                }
                Some(_) => {}
                None if name.is_empty() => {}
                None => self.diagnose(Some(id), Some(doc), DiagnosticKind::UnknownBehavior, name),
            }
        }

        let mut swapped_layout = false;
        if wants(FieldId::LAYOUT)
            && let Some(calc) = node.field(FieldId::LAYOUT)
        {
            let value = self.eval_field(host, id, doc, FieldId::LAYOUT, calc);
            let name = value.as_str().unwrap_or_default();
            match host.ctx.layout_id(name) {
                Some(next) if self.outline(id).layout != next => {
                    if let Some(fields) = self.swap_layout(host, id, doc, node, next) {
                        swapped_layout = true;
                        changed.push(FieldId::LAYOUT);
                        changed.extend(fields);
                    }
                }
                Some(_) => {}
                None if name.is_empty() => {}
                None => self.diagnose(Some(id), Some(doc), DiagnosticKind::UnknownLayout, name),
            }
        }

        for raw in FieldId::ABS_LEFT.0..=FieldId::MAX_Y.0 {
            let field = FieldId(raw);
            if wants(field)
                && let Some(calc) = node.field(field)
            {
                let value = self.eval_field(host, id, doc, field, calc);
                if self.outline_mut(id).store(field, &value) == Some(true) {
                    changed.push(field);
                }
            }
        }

        if !swapped_behavior {
            let fields = self.bind_component_fields(host, id, doc, node, SwapTarget::Behavior, only);
            changed.extend(fields);
        }
        if !swapped_layout {
            let fields = self.bind_component_fields(host, id, doc, node, SwapTarget::Layout, only);
            changed.extend(fields);
        }

        if !self.document(doc).attached {
            self.attach(host, doc);
        } else if changed.iter().any(|f| f.is_geometry()) {
            self.reflow(host, doc);
        }

        for field in changed {
            self.tracer.field_change(&FieldChangeEvent {
                outline: id,
                field,
                pass: self.pass,
            });
            self.fire(host, EventSource::Outline(id), field.0);
        }
    }

    /// Evaluates one binding and stamps the field with the current pass.
    fn eval_field(
        &mut self,
        host: Host<'_>,
        id: OutlineId,
        doc: DocId,
        field: FieldId,
        calc: &Calculation,
    ) -> CalcValue {
        let units = self.units(id, field);
        let pass = self.pass;
        self.doc_mut(doc).transitions.insert(field, pass);
        let ops = host.ctx.operators();
        let mut bindings = OutlineBindings {
            doc: self,
            host,
            outline: id,
        };
        evaluate(calc, ops, &mut bindings, &units)
    }

    /// Unit conversion parameters for evaluating `field` on `id`.
    fn units(&self, id: OutlineId, field: FieldId) -> UnitContext {
        let outline = self.outline(id);
        let dpi = if is_vertical(field) {
            self.config.dpi.y
        } else {
            self.config.dpi.x
        };
        UnitContext {
            font_size: outline.font_size,
            line_height: outline.line_height,
            dpi,
            scale: self.config.scale,
        }
    }

    /// Evaluates the fields a component declares into its state.
    ///
    /// Returns the fields whose stored value changed.
    fn bind_component_fields(
        &mut self,
        host: Host<'_>,
        id: OutlineId,
        doc: DocId,
        node: &SkinNode,
        target: SwapTarget,
        only: Option<FieldId>,
    ) -> Vec<FieldId> {
        let resolver: &'static dyn Resolver = match target {
            SwapTarget::Behavior => match self.document(doc).behavior {
                Some(b) => host.ctx.behavior(b).resolver,
                None => return Vec::new(),
            },
            SwapTarget::Layout => host.ctx.layout(self.document(doc).layout).resolver,
        };

        let mut changed = Vec::new();
        for info in resolver.fields() {
            if only.is_some_and(|o| o != info.id) {
                continue;
            }
            let Some(calc) = node.field(info.id) else {
                continue;
            };
            let value = self.eval_field(host, id, doc, info.id, calc);
            let Some(state) = component_state(self.doc_mut(doc), target) else {
                continue;
            };
            if resolver.get(&*state, info.id).as_ref() == Some(&value) {
                continue;
            }
            if resolver.set(state, info.id, &value) {
                changed.push(info.id);
            }
        }
        changed
    }

    // -- Component swaps --

    /// Replaces a document's behavior.
    ///
    /// Returns the component fields that changed, or `None` if another swap
    /// is in progress on this outline.
    fn swap_behavior(
        &mut self,
        host: Host<'_>,
        id: OutlineId,
        doc: DocId,
        node: &SkinNode,
        next: BehaviorId,
    ) -> Option<Vec<FieldId>> {
        if self.outline(id).swap != SwapPhase::Idle {
            let name = &host.ctx.behavior(next).name;
            self.diagnose(Some(id), Some(doc), DiagnosticKind::SwapInProgress, name);
            return None;
        }
        self.outline_mut(id).behavior = Some(next);

        self.enter_phase(id, SwapTarget::Behavior, SwapPhase::Destroying);
        if self.document(doc).behavior.is_some() {
            self.send(host, doc, &mut Message::Destroy);
        }
        let n = self.doc_mut(doc);
        n.state = None;
        n.behavior = None;

        self.enter_phase(id, SwapTarget::Behavior, SwapPhase::Constructing);
        let n = self.doc_mut(doc);
        n.behavior = Some(next);
        n.state = Some((host.ctx.behavior(next).new_state)());
        self.send(host, doc, &mut Message::Construct);
        let changed = self.bind_component_fields(host, id, doc, node, SwapTarget::Behavior, None);

        self.enter_phase(id, SwapTarget::Behavior, SwapPhase::Idle);
        Some(changed)
    }

    /// Replaces a document's layout, moving its children across.
    ///
    /// Attached children are removed from the outgoing layout, the
    /// auxiliary state is rebuilt, and the children are added to the
    /// incoming layout.
    fn swap_layout(
        &mut self,
        host: Host<'_>,
        id: OutlineId,
        doc: DocId,
        node: &SkinNode,
        next: LayoutId,
    ) -> Option<Vec<FieldId>> {
        if self.outline(id).swap != SwapPhase::Idle {
            let name = &host.ctx.layout(next).name;
            self.diagnose(Some(id), Some(doc), DiagnosticKind::SwapInProgress, name);
            return None;
        }
        self.outline_mut(id).layout = next;

        self.enter_phase(id, SwapTarget::Layout, SwapPhase::Detaching);
        let children: Vec<DocId> = self
            .outline(id)
            .children
            .iter()
            .filter_map(|c| self.outline(*c).doc)
            .filter(|d| self.document(*d).attached)
            .collect();
        for &child in &children {
            self.send(host, doc, &mut Message::RemoveChild(child));
        }

        self.enter_phase(id, SwapTarget::Layout, SwapPhase::Destroying);
        self.doc_mut(doc).aux = None;

        self.enter_phase(id, SwapTarget::Layout, SwapPhase::Constructing);
        let n = self.doc_mut(doc);
        n.layout = next;
        n.aux = host.ctx.layout(next).new_state.map(|f| f());
        let changed = self.bind_component_fields(host, id, doc, node, SwapTarget::Layout, None);

        self.enter_phase(id, SwapTarget::Layout, SwapPhase::Reattaching);
        for child in children {
            self.send(host, doc, &mut Message::AddChild(child));
        }

        self.enter_phase(id, SwapTarget::Layout, SwapPhase::Idle);
        Some(changed)
    }

    fn enter_phase(&mut self, id: OutlineId, target: SwapTarget, phase: SwapPhase) {
        self.outline_mut(id).swap = phase;
        self.tracer.swap(&SwapEvent {
            outline: id,
            target,
            phase,
        });
    }

    // -- Attachment --

    pub(crate) fn create_document(&mut self, host: Host<'_>, id: OutlineId) -> DocId {
        let layout = self.outline(id).layout;
        let mut node = DocumentNode::new(id, layout);
        node.aux = host.ctx.layout(layout).new_state.map(|f| f());
        let (idx, generation) = self.docs.insert(node);
        let doc = DocId { idx, generation };
        self.outline_mut(id).doc = Some(doc);
        doc
    }

    /// Hands a fresh document to its parent's layout.
    fn attach(&mut self, host: Host<'_>, doc: DocId) {
        let Some(parent) = self.parent_document(doc) else {
            return;
        };
        self.doc_mut(doc).attached = true;
        let _ = self
            .relayout
            .add_dependency(doc.idx, parent.idx, dirty::RELAYOUT);
        self.send(host, parent, &mut Message::AddChild(doc));
    }

    /// Re-runs the parent's layout for one attached document.
    fn reflow(&mut self, host: Host<'_>, doc: DocId) {
        let Some(parent) = self.parent_document(doc) else {
            return;
        };
        let layout = host.ctx.layout(self.document(parent).layout).layout;
        layout(self, host, parent, doc, LayoutOp::Reflow);
    }

    // -- State API --

    /// Reads a field through the resolver chain: standard fields, then the
    /// behavior's, then the layout's.
    pub(crate) fn resolve_state(
        &self,
        host: Host<'_>,
        id: DocId,
        field: FieldId,
    ) -> Option<CalcValue> {
        let node = self.document(id);
        let area = node.area;
        match field {
            FieldId::BEHAVIOR => {
                return node
                    .behavior
                    .map(|b| CalcValue::Str(host.ctx.behavior(b).name.clone()));
            }
            FieldId::LAYOUT => {
                return Some(CalcValue::Str(host.ctx.layout(node.layout).name.clone()));
            }
            FieldId::AREA_LEFT => return Some(CalcValue::Float(area.x0)),
            FieldId::AREA_TOP => return Some(CalcValue::Float(area.y0)),
            FieldId::AREA_RIGHT => return Some(CalcValue::Float(area.x1)),
            FieldId::AREA_BOTTOM => return Some(CalcValue::Float(area.y1)),
            FieldId::WIDTH => return Some(CalcValue::Float(area.width())),
            FieldId::HEIGHT => return Some(CalcValue::Float(area.height())),
            _ => {}
        }
        if let Some(value) = self.outline(node.outline).standard(field) {
            return Some(value);
        }
        if let (Some(b), Some(state)) = (node.behavior, node.state.as_deref())
            && let Some(value) = host.ctx.behavior(b).resolver.get(state, field)
        {
            return Some(value);
        }
        let aux = node.aux.as_deref()?;
        host.ctx.layout(node.layout).resolver.get(aux, field)
    }

    /// Writes a field through the resolver chain.
    ///
    /// Resolved areas, the behavior and the layout are read-only. Geometry
    /// writes on an attached document reflow it.
    pub(crate) fn assign_state(
        &mut self,
        host: Host<'_>,
        id: DocId,
        field: FieldId,
        value: &CalcValue,
    ) -> bool {
        let outline = self.document(id).outline;
        if let Some(changed) = self.outline_mut(outline).store(field, value) {
            if changed && field.is_geometry() && self.document(id).attached {
                self.reflow(host, id);
            }
            return true;
        }
        if field.is_standard() {
            return false;
        }
        let node = self.doc_mut(id);
        if let Some(b) = node.behavior
            && let Some(state) = node.state.as_deref_mut()
            && host.ctx.behavior(b).resolver.set(state, field, value)
        {
            return true;
        }
        let layout = node.layout;
        match node.aux.as_deref_mut() {
            Some(aux) => host.ctx.layout(layout).resolver.set(aux, field, value),
            None => false,
        }
    }

    /// Reads a field of an outline's document.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn get_state(&mut self, host: Host<'_>, id: OutlineId, field: FieldId) -> Option<CalcValue> {
        let doc = self.outline(id).doc?;
        match self.send(host, doc, &mut Message::GetState(field)) {
            MessageResult::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Writes a field of an outline's document and notifies dependents.
    ///
    /// Starts a new propagation pass. Returns `false` if every resolver
    /// rejected the write.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn set_state(
        &mut self,
        host: Host<'_>,
        id: OutlineId,
        field: FieldId,
        value: CalcValue,
    ) -> bool {
        let Some(doc) = self.outline(id).doc else {
            return false;
        };
        self.pass += 1;
        let accepted = self
            .send(host, doc, &mut Message::SetState { field, value })
            .is_accepted();
        if accepted {
            self.fire(host, EventSource::Outline(id), field.0);
        }
        accepted
    }

    // -- Data API --

    /// Notifies dependents that a data object changed.
    ///
    /// With a field name, fires the edges listening to that field. Without
    /// one, fires every field of the object that has listeners and then
    /// re-evaluates every outline bound to the object. Starts a new
    /// propagation pass. Returns the number of deliveries plus re-evaluated
    /// outlines.
    pub fn update_data(&mut self, host: Host<'_>, obj: DataRef, name: Option<&str>) -> usize {
        self.pass += 1;
        let source = EventSource::Data(obj);
        match name {
            Some(name) => match self.keys.get(name) {
                Some(&key) => self.fire(host, source, key),
                None => 0,
            },
            None => {
                let mut n = 0;
                for key in self.events.fields_of(source) {
                    n += self.fire(host, source, key);
                }
                let hooked = self.hooks.get(&obj).cloned().unwrap_or_default();
                for outline in hooked {
                    if self.contains_outline(outline) {
                        self.regenerate(host, outline, None);
                        n += 1;
                    }
                }
                n
            }
        }
    }

    /// Writes a scalar through the data accessor and notifies dependents.
    ///
    /// `path` is a dotted field path below `obj`. Returns `false` if the
    /// path does not resolve to a writable scalar.
    pub fn set_data(
        &mut self,
        ctx: &Context,
        data: &mut dyn DataAccessor,
        obj: DataRef,
        path: &str,
        value: DataValue,
    ) -> bool {
        let Some((container, Some(name))) = resolve_container(&*data, obj, path) else {
            return false;
        };
        let Some(target) = data.get_field(container, Some(name)).obj else {
            return false;
        };
        if !data.set_scalar(target, value) {
            return false;
        }
        self.update_data(Host::new(ctx, &*data), container, Some(name));
        true
    }

    // -- Edges --

    /// Delivers a change of `(source, field)` to every listening edge.
    ///
    /// Returns the number of deliveries.
    pub(crate) fn fire(&mut self, host: Host<'_>, source: EventSource, field: u32) -> usize {
        let deliveries = self.events.fire(source, field);
        self.tracer.fire(&FireEvent {
            source,
            field,
            deliveries: deliveries.len(),
            pass: self.pass,
        });
        for (delivery, listener) in &deliveries {
            if self.events.is_alive(delivery.edge) {
                listener(self, host, delivery);
            }
        }
        deliveries.len()
    }

    /// Links a dependency edge with a custom listener.
    ///
    /// Registering an existing tuple shares its edge and keeps the original
    /// listener.
    pub fn subscribe(&mut self, tuple: EventTuple, listener: Listener) -> Registration {
        let registration = self.events.register(tuple, listener);
        let kind = match registration {
            Registration::New(_) => EdgeEventKind::Registered,
            Registration::Shared(_) => EdgeEventKind::Shared,
        };
        self.tracer.edge(&EdgeEvent {
            edge: registration.id(),
            tuple,
            kind,
        });
        registration
    }

    /// Drops one reference to an edge.
    ///
    /// Returns `true` when the edge was unlinked.
    pub fn unsubscribe(&mut self, edge: EventId, tuple: EventTuple) -> bool {
        let unlinked = self.events.release(edge);
        self.tracer.edge(&EdgeEvent {
            edge,
            tuple,
            kind: if unlinked {
                EdgeEventKind::Unlinked
            } else {
                EdgeEventKind::Released
            },
        });
        unlinked
    }

    pub(crate) fn diagnose(
        &mut self,
        outline: Option<OutlineId>,
        document: Option<DocId>,
        kind: DiagnosticKind,
        detail: &str,
    ) {
        self.tracer.diagnostic(&DiagnosticEvent {
            outline,
            document,
            kind,
            detail,
        });
    }
}

fn component_state(
    node: &mut DocumentNode,
    target: SwapTarget,
) -> Option<&mut dyn core::any::Any> {
    match target {
        SwapTarget::Behavior => node.state.as_deref_mut(),
        SwapTarget::Layout => node.aux.as_deref_mut(),
    }
}
