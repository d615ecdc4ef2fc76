// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Skin expansion into outlines, and outline teardown.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::calc::Binding;
use crate::context::Host;
use crate::data::{
    DataField, DataIndex, DataRef, DataValue, Primitive, resolve_container, split_key,
};
use crate::event::{EventSource, EventTuple};
use crate::field::FieldId;
use crate::message::Message;
use crate::skin::{Skin, SkinNode, SkinNodeId};
use crate::trace::{DiagnosticKind, OutlineEvent, OutlineEventKind};

use super::node::Template;
use super::outline::reevaluate;
use super::{DocId, Document, OutlineId, OutlineNode};

/// Deepest template nesting the generator follows.
///
/// Templates may expand into themselves through data; a cyclic data graph
/// would otherwise never terminate.
pub const MAX_GENERATE_DEPTH: u32 = 64;

impl Document {
    // -- Generation API --

    /// Generates the root children of `skin` under the root outline.
    ///
    /// Root-level nodes are bound to the [data root](Self::data_root).
    /// Returns the outlines created directly under the root, in skin order.
    pub fn generate(&mut self, host: Host<'_>, skin: Rc<Skin>) -> Vec<OutlineId> {
        let root = skin.root();
        self.generate_node(host, skin, root, self.data_root, self.root)
    }

    /// Generates one skin node and its subtree under `parent`.
    ///
    /// A field-bearing node produces one outline bound to `data` and
    /// recurses into its children with the same data. A field-less node
    /// expands over `data`: each element of an array (or `data` itself, if
    /// it is not one) is matched to a template by selector and generated
    /// with the element as its data. The skin root generates its children.
    ///
    /// Returns the outlines created directly under `parent`. Starts a new
    /// propagation pass.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub fn generate_node(
        &mut self,
        host: Host<'_>,
        skin: Rc<Skin>,
        node: SkinNodeId,
        data: Option<DataRef>,
        parent: OutlineId,
    ) -> Vec<OutlineId> {
        let _ = self.outline(parent);
        self.pass += 1;
        let index = self.register_skin(&skin);
        let mut out = Vec::new();

        if node == skin.root() {
            let mut path = String::new();
            for &child in skin.node(node).children() {
                self.expand(host, index, child, data, parent, &mut path, 0, &mut out);
            }
        } else {
            let own = skin.path(node);
            let mut path = match own.rsplit_once('.') {
                Some((prefix, _)) => String::from(prefix),
                None => String::new(),
            };
            self.expand(host, index, node, data, parent, &mut path, 0, &mut out);
        }
        out
    }

    /// Destroys an outline and its subtree, bottom-up.
    ///
    /// Each document gets a `Destroy` message, is removed from its parent's
    /// layout and loses its spatial node. Every edge to or from the outline
    /// is unlinked and its data hook dropped.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or is the root outline.
    pub fn destroy_outline(&mut self, host: Host<'_>, id: OutlineId) {
        assert!(id != self.root, "cannot destroy the root outline");
        let children = self.outline(id).children.clone();
        for child in children.into_iter().rev() {
            self.destroy_outline(host, child);
        }

        if let Some(doc) = self.outline(id).doc {
            self.destroy_document(host, doc);
        }
        self.events.release_all_for_dest(id);
        self.events.release_all_for_source(EventSource::Outline(id));

        let node = self.outline(id);
        let parent = node.parent;
        if let Some(data) = node.data
            && let Some(hooked) = self.hooks.get_mut(&data)
        {
            hooked.retain(|o| *o != id);
            if hooked.is_empty() {
                self.hooks.remove(&data);
            }
        }
        if let Some(p) = parent {
            self.outline_mut(p).children.retain(|c| *c != id);
        }
        self.outlines.remove(id.idx, id.generation);
        self.tracer.outline(&OutlineEvent {
            outline: id,
            parent,
            kind: OutlineEventKind::Destroyed,
        });
    }

    // -- Internal helpers --

    fn register_skin(&mut self, skin: &Rc<Skin>) -> usize {
        if let Some(i) = self.skins.iter().position(|s| Rc::ptr_eq(s, skin)) {
            return i;
        }
        self.skins.push(Rc::clone(skin));
        self.skins.len() - 1
    }

    /// Generates `node` under `parent`. `path` is the selector path of the
    /// node's parent and is restored before returning.
    fn expand(
        &mut self,
        host: Host<'_>,
        skin: usize,
        node: SkinNodeId,
        data: Option<DataRef>,
        parent: OutlineId,
        path: &mut String,
        depth: u32,
        out: &mut Vec<OutlineId>,
    ) {
        if depth > MAX_GENERATE_DEPTH {
            self.diagnose(Some(parent), None, DiagnosticKind::DepthExceeded, path);
            return;
        }
        let tree = Rc::clone(&self.skins[skin]);
        let template = tree.node(node);
        let mark = path.len();
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(template.id());

        if template.is_expansion() {
            let Some(data) = data else {
                path.truncate(mark);
                return;
            };
            let mut element = host.data.get_field(data, None);
            let sequence = match element.value {
                DataValue::Array {
                    element: Primitive::Object | Primitive::Complex,
                    obj,
                } => Some(obj),
                _ => None,
            };
            if let Some(obj) = sequence {
                let mut i = 0;
                loop {
                    let item = host.data.get_index(obj, DataIndex::At(i));
                    if item.value.is_none() {
                        break;
                    }
                    self.expand_item(host, skin, &tree, node, &item, parent, path, depth, out);
                    i += 1;
                }
            } else if !element.value.is_none() {
                element.obj = element.obj.or(Some(data));
                self.expand_item(host, skin, &tree, node, &element, parent, path, depth, out);
            }
        } else {
            let id = self.create_outline(host, parent, Template { skin, node }, data);
            out.push(id);
            self.regenerate(host, id, None);
            self.gather_events(host, id, template);
            let mut nested = Vec::new();
            for &child in template.children() {
                self.expand(host, skin, child, data, id, path, depth + 1, &mut nested);
            }
        }
        path.truncate(mark);
    }

    /// Picks a template for one data element and generates it. `path` is
    /// the expansion point's selector path; the chosen template's outlines
    /// are registered below it.
    fn expand_item(
        &mut self,
        host: Host<'_>,
        skin: usize,
        tree: &Skin,
        expanding: SkinNodeId,
        item: &DataField,
        parent: OutlineId,
        path: &mut String,
        depth: u32,
        out: &mut Vec<OutlineId>,
    ) {
        match tree.lookup(path, &item.type_name, Some(expanding)) {
            Some(found) => {
                self.expand(host, skin, found, item.obj, parent, path, depth + 1, out);
            }
            None => {
                let mut detail = path.clone();
                if !item.type_name.is_empty() {
                    detail.push('.');
                    detail.push_str(&item.type_name);
                }
                self.diagnose(Some(parent), None, DiagnosticKind::MissingTemplate, &detail);
            }
        }
    }

    fn create_outline(
        &mut self,
        host: Host<'_>,
        parent: OutlineId,
        template: Template,
        data: Option<DataRef>,
    ) -> OutlineId {
        let p = self.outline(parent);
        let mut node = OutlineNode::new(Some(parent), host.ctx.default_layout());
        node.font_size = p.font_size;
        node.line_height = p.line_height;
        node.template = Some(template);
        node.data = data;
        let (idx, generation) = self.outlines.insert(node);
        let id = OutlineId { idx, generation };
        self.outline_mut(parent).children.push(id);
        if let Some(d) = data {
            self.hooks.entry(d).or_default().push(id);
        }
        self.tracer.outline(&OutlineEvent {
            outline: id,
            parent: Some(parent),
            kind: OutlineEventKind::Created,
        });
        id
    }

    /// Links an edge for every static key the outline's bindings read.
    fn gather_events(&mut self, host: Host<'_>, id: OutlineId, template: &SkinNode) {
        for (&field, calc) in template.fields() {
            for (binding, key) in calc.dependencies() {
                let Some(key) = key else {
                    let name = field_name(host, field);
                    self.diagnose(Some(id), None, DiagnosticKind::DynamicKey, name);
                    continue;
                };
                let (source, source_field) = match binding {
                    Binding::Data => {
                        let (root, path) = split_key(key);
                        let Some(base) = self.data_base(id, root) else {
                            continue;
                        };
                        let Some((container, name)) = resolve_container(host.data, base, path)
                        else {
                            continue;
                        };
                        (EventSource::Data(container), self.intern(name.unwrap_or("")))
                    }
                    Binding::State => {
                        let Some((target, read)) = self.state_target(host, id, key) else {
                            continue;
                        };
                        (EventSource::Outline(target), read.0)
                    }
                    Binding::Literal => continue,
                };
                self.subscribe(
                    EventTuple {
                        source,
                        source_field,
                        dest: id,
                        dest_field: field,
                    },
                    reevaluate,
                );
            }
        }
        for name in template.unresolved().keys() {
            self.diagnose(Some(id), None, DiagnosticKind::UnresolvedField, name);
        }
    }

    /// Interns a data field name as an edge source field.
    fn intern(&mut self, name: &str) -> u32 {
        if let Some(&key) = self.keys.get(name) {
            return key;
        }
        let key = u32::try_from(self.keys.len()).unwrap_or(u32::MAX);
        self.keys.insert(String::from(name), key);
        key
    }

    fn destroy_document(&mut self, host: Host<'_>, doc: DocId) {
        if self.document(doc).behavior.is_some() {
            self.send(host, doc, &mut Message::Destroy);
        }
        if self.document(doc).attached
            && let Some(parent) = self.parent_document(doc)
        {
            self.send(host, parent, &mut Message::RemoveChild(doc));
        }
        self.unplace(doc);
        self.relayout.remove_key(doc.idx);
        let outline = self.document(doc).outline;
        self.docs.remove(doc.idx, doc.generation);
        self.outline_mut(outline).doc = None;
    }
}

fn field_name(host: Host<'_>, field: FieldId) -> &'static str {
    host.ctx
        .fields()
        .find(|f| f.id == field)
        .map_or("", |f| f.name)
}
