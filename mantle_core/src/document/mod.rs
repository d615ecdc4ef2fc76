// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outlines, documents and the machinery that keeps them current.
//!
//! Generating a [`Skin`](crate::skin::Skin) produces a tree of outlines, one
//! per field-bearing skin node (plus one per array element for expansion
//! nodes). Each outline is bound to a document: the live instance carrying
//! behavior state, layout state, a resolved area and a spatial node.
//!
//! ```text
//!   Skin ──generate──► OutlineNode ──bound to──► DocumentNode ──► SpatialTree
//!                           ▲                          │
//!                           └──── DependencyRegistry ◄─┘ fire(field)
//! ```
//!
//! Field bindings are evaluated when an outline is generated and again
//! whenever a dependency edge delivers a change. Evaluation is synchronous
//! and gated twice: a field whose value did not change fires nothing, and a
//! field already recomputed in the current pass is not recomputed again.
//!
//! Layout is deferred. Placing a document whose area changed marks it on the
//! [`RELAYOUT`](crate::dirty::RELAYOUT) channel; [`Document::flush`] drains
//! the channel, re-runs each marked document's parent layout and reports the
//! redraw damage.
//!
//! All document areas are in root coordinates. Spatial node areas are in
//! their parent node's frame; [`Document::place`] converts between the two.

mod bindings;
mod generate;
mod id;
mod node;
mod outline;

#[cfg(test)]
mod tests;

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use kurbo::{Point, Rect, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::arena::Arena;
use crate::context::{Context, Host};
use crate::data::DataRef;
use crate::dirty;
use crate::event::{Delivery, DependencyRegistry};
use crate::layout::LayoutOp;
use crate::skin::Skin;
use crate::spatial::SpatialTree;
use crate::trace::{FlushEvent, RepairEvent, TraceSink, Tracer};

pub use id::{DocId, OutlineId};
pub use node::{DocumentNode, Geometry, OutlineNode, SwapPhase};

/// A dependency-edge callback.
///
/// Edges linked by the generator use a listener that re-evaluates the
/// destination field; applications may subscribe their own.
pub type Listener = fn(&mut Document, Host<'_>, &Delivery);

/// Upper bound on relayout drain passes per [`Document::flush`].
///
/// A layout that keeps moving its own parent would otherwise never settle.
pub const MAX_FLUSH_PASSES: u32 = 16;

/// Per-document display parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DocumentConfig {
    /// Display density per axis, in dots per inch.
    pub dpi: Vec2,
    /// Text scale factor.
    pub scale: f64,
    /// The root document's area.
    pub root_area: Rect,
    /// Font size outlines inherit when their skin sets none.
    pub font_size: f64,
    /// Line height outlines inherit when their skin sets none.
    pub line_height: f64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            dpi: Vec2::new(96.0, 96.0),
            scale: 1.0,
            root_area: Rect::ZERO,
            font_size: 14.0,
            line_height: 18.0,
        }
    }
}

/// What a [`Document::flush`] changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentChanges {
    /// Documents re-laid out, in drain order.
    pub reflowed: Vec<DocId>,
    /// Regions to repaint, in root coordinates.
    pub damage: Vec<Rect>,
}

impl DocumentChanges {
    /// Returns `true` if nothing was re-laid out or damaged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reflowed.is_empty() && self.damage.is_empty()
    }
}

/// A generated UI tree and everything needed to keep it current.
pub struct Document {
    pub(crate) config: DocumentConfig,
    pub(crate) outlines: Arena<OutlineNode>,
    pub(crate) docs: Arena<DocumentNode>,
    pub(crate) spatial: SpatialTree,
    pub(crate) events: DependencyRegistry<Listener>,
    /// Outlines bound to each data object.
    pub(crate) hooks: BTreeMap<DataRef, Vec<OutlineId>>,
    /// Interned data field names.
    pub(crate) keys: BTreeMap<String, u32>,
    pub(crate) skins: Vec<Rc<Skin>>,
    pub(crate) data_root: Option<DataRef>,
    pub(crate) root: OutlineId,
    pub(crate) root_doc: DocId,
    pub(crate) relayout: DirtyTracker<u32>,
    /// Propagation pass counter; see [`DocumentNode`] transitions.
    pub(crate) pass: u64,
    pub(crate) tracer: Tracer,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("config", &self.config)
            .field("outlines", &self.outlines.len())
            .field("docs", &self.docs.len())
            .field("spatial", &self.spatial.len())
            .field("edges", &self.events.len())
            .field("skins", &self.skins.len())
            .field("data_root", &self.data_root)
            .field("root", &self.root)
            .field("pass", &self.pass)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Creates a document holding only the root outline.
    ///
    /// The root uses `ctx`'s default layout and has no behavior. A document
    /// must always be driven with the context it was created with.
    #[must_use]
    pub fn new(ctx: &Context, config: DocumentConfig) -> Self {
        let layout = ctx.default_layout();
        let mut outlines = Arena::new();
        let mut root_node = OutlineNode::new(None, layout);
        root_node.font_size = config.font_size;
        root_node.line_height = config.line_height;
        root_node.geometry.abs = config.root_area;
        let (idx, generation) = outlines.insert(root_node);
        let root = OutlineId { idx, generation };

        let mut spatial = SpatialTree::new();
        let rt = spatial.create();
        spatial.set_area(rt, config.root_area);

        let mut node = DocumentNode::new(root, layout);
        node.area = config.root_area;
        node.attached = true;
        node.spatial = Some(rt);
        node.aux = ctx.layout(layout).new_state.map(|f| f());
        let mut docs = Arena::new();
        let (idx, generation) = docs.insert(node);
        let root_doc = DocId { idx, generation };
        spatial.set_document(rt, Some(root_doc));
        if let Some(o) = outlines.get_mut(root.idx, root.generation) {
            o.doc = Some(root_doc);
        }

        Self {
            config,
            outlines,
            docs,
            spatial,
            events: DependencyRegistry::new(),
            hooks: BTreeMap::new(),
            keys: BTreeMap::new(),
            skins: Vec::new(),
            data_root: None,
            root,
            root_doc,
            relayout: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pass: 0,
            tracer: Tracer::none(),
        }
    }

    // -- Accessors --

    /// Display parameters.
    #[must_use]
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// The root outline.
    #[must_use]
    pub fn root(&self) -> OutlineId {
        self.root
    }

    /// The root document.
    #[must_use]
    pub fn root_document(&self) -> DocId {
        self.root_doc
    }

    /// The data object unprefixed keys resolve against.
    #[must_use]
    pub fn data_root(&self) -> Option<DataRef> {
        self.data_root
    }

    /// Sets the data object unprefixed keys resolve against.
    ///
    /// The root outline is bound to it, so root-level skin nodes inherit it
    /// as their data. Already generated outlines keep their bindings.
    pub fn set_data_root(&mut self, root: Option<DataRef>) {
        self.data_root = root;
        let id = self.root;
        self.outline_mut(id).data = root;
    }

    /// Returns an outline.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    #[must_use]
    pub fn outline(&self, id: OutlineId) -> &OutlineNode {
        match self.outlines.get(id.idx, id.generation) {
            Some(node) => node,
            None => panic!("stale OutlineId {id:?}"),
        }
    }

    /// Returns a document.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    #[must_use]
    pub fn document(&self, id: DocId) -> &DocumentNode {
        match self.docs.get(id.idx, id.generation) {
            Some(node) => node,
            None => panic!("stale DocId {id:?}"),
        }
    }

    /// Returns whether `id` refers to a live outline.
    #[must_use]
    pub fn contains_outline(&self, id: OutlineId) -> bool {
        self.outlines.contains(id.idx, id.generation)
    }

    /// Returns whether `id` refers to a live document.
    #[must_use]
    pub fn contains_document(&self, id: DocId) -> bool {
        self.docs.contains(id.idx, id.generation)
    }

    /// Number of live outlines, including the root.
    #[must_use]
    pub fn outline_count(&self) -> usize {
        self.outlines.len()
    }

    /// Iterates live outlines in slot order.
    pub fn outlines(&self) -> impl Iterator<Item = (OutlineId, &OutlineNode)> + '_ {
        self.outlines
            .iter()
            .map(|(idx, generation, node)| (OutlineId { idx, generation }, node))
    }

    /// The spatial index.
    #[must_use]
    pub fn spatial(&self) -> &SpatialTree {
        &self.spatial
    }

    /// The dependency edges.
    #[must_use]
    pub fn events(&self) -> &DependencyRegistry<Listener> {
        &self.events
    }

    /// The behavior state of a document, if it is a `T`.
    #[must_use]
    pub fn state<T: Any>(&self, id: DocId) -> Option<&T> {
        self.document(id).state.as_deref()?.downcast_ref()
    }

    /// Mutable behavior state of a document, if it is a `T`.
    pub fn state_mut<T: Any>(&mut self, id: DocId) -> Option<&mut T> {
        self.doc_mut(id).state.as_deref_mut()?.downcast_mut()
    }

    /// The layout state of a document, if it is a `T`.
    #[must_use]
    pub fn layout_state<T: Any>(&self, id: DocId) -> Option<&T> {
        self.document(id).aux.as_deref()?.downcast_ref()
    }

    /// The document bound to the parent outline, `None` for the root.
    #[must_use]
    pub fn parent_document(&self, id: DocId) -> Option<DocId> {
        let outline = self.document(id).outline;
        let parent = self.outline(outline).parent?;
        self.outline(parent).doc
    }

    /// Installs a trace sink, replacing any previous one.
    ///
    /// Without the `trace` feature the sink is dropped.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer = Tracer::new(sink);
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.tracer.take()
    }

    // -- Spatial API --

    /// Records a child document's resolved area and indexes it.
    ///
    /// Layouts call this from [`LayoutOp::Add`] and [`LayoutOp::Reflow`].
    /// The spatial node is created on first placement and hung below the
    /// nearest ancestor document that has one. When the area changed, the
    /// child and everything below it are marked for relayout.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn place(&mut self, parent: DocId, child: DocId, area: Rect) {
        let anchor = self.spatial_anchor(parent);
        let previous = self.document(child).area;
        let (rt, created) = match self.document(child).spatial {
            Some(rt) => (rt, false),
            None => {
                let rt = self.spatial.create();
                self.spatial.set_document(rt, Some(child));
                self.spatial.attach(anchor, rt);
                self.doc_mut(child).spatial = Some(rt);
                (rt, true)
            }
        };
        self.doc_mut(child).area = area;
        let origin = self.spatial.frame_origin(anchor).to_vec2();
        self.spatial.set_area(rt, area - origin);
        let repair = self.spatial.fix(rt);
        for step in &repair.steps {
            self.tracer.repair(&RepairEvent::from(step));
        }
        if created || previous != area {
            self.relayout.mark_with(child.idx, dirty::RELAYOUT, &EagerPolicy);
        }
    }

    /// Removes a child document from the spatial index.
    ///
    /// Layouts call this from [`LayoutOp::Remove`]. Spatial nodes of
    /// descendant documents go with it; they are recreated when the
    /// descendants are next placed.
    pub fn unplace(&mut self, child: DocId) {
        let Some(rt) = self.doc_mut(child).spatial.take() else {
            return;
        };
        for doc in self.spatial.destroy(rt) {
            if let Some(node) = self.docs.get_mut(doc.idx, doc.generation) {
                node.spatial = None;
            }
        }
    }

    /// Child documents of `id` in draw order: the nearest indexed documents
    /// below its spatial node, most recently placed first.
    #[must_use]
    pub fn draw_order(&self, id: DocId) -> Vec<DocId> {
        match self.document(id).spatial {
            Some(rt) => self.spatial.draw_order(rt),
            None => Vec::new(),
        }
    }

    /// The topmost document containing `point` (root coordinates).
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<DocId> {
        let rt = self.document(self.root_doc).spatial?;
        self.spatial.hit_test(rt, point)
    }

    /// Resizes the root document and marks every attached document for
    /// relayout.
    pub fn set_root_area(&mut self, area: Rect) {
        self.config.root_area = area;
        let root = self.root;
        self.outline_mut(root).geometry.abs = area;
        let root_doc = self.root_doc;
        self.doc_mut(root_doc).area = area;
        if let Some(rt) = self.document(root_doc).spatial {
            self.spatial.set_area(rt, area);
        }
        self.relayout
            .mark_with(root_doc.idx, dirty::RELAYOUT, &EagerPolicy);
    }

    /// Re-lays out every document marked for relayout and drains damage.
    ///
    /// Each marked document is handed to its parent's layout with
    /// [`LayoutOp::Reflow`], parents before children. Placements that move
    /// a document mark its subtree again; the drain repeats until nothing is
    /// marked or [`MAX_FLUSH_PASSES`] is reached.
    pub fn flush(&mut self, host: Host<'_>) -> DocumentChanges {
        let mut reflowed = Vec::new();
        let mut passes = 0;
        while passes < MAX_FLUSH_PASSES {
            let marked: Vec<u32> = self
                .relayout
                .drain(dirty::RELAYOUT)
                .affected()
                .deterministic()
                .run()
                .collect();
            if marked.is_empty() {
                break;
            }
            passes += 1;
            for idx in marked {
                let Some(generation) = self.docs.live_generation(idx) else {
                    continue;
                };
                let doc = DocId { idx, generation };
                if doc == self.root_doc || !self.document(doc).attached {
                    continue;
                }
                let Some(parent) = self.parent_document(doc) else {
                    continue;
                };
                let layout = host.ctx.layout(self.document(parent).layout).layout;
                layout(self, host, parent, doc, LayoutOp::Reflow);
                reflowed.push(doc);
            }
        }

        let damage = self.spatial.take_damage();
        self.tracer.flush(&FlushEvent {
            passes,
            reflowed: reflowed.len(),
            damage: damage.len(),
        });
        DocumentChanges { reflowed, damage }
    }

    // -- Internal helpers --

    pub(crate) fn outline_mut(&mut self, id: OutlineId) -> &mut OutlineNode {
        match self.outlines.get_mut(id.idx, id.generation) {
            Some(node) => node,
            None => panic!("stale OutlineId {id:?}"),
        }
    }

    pub(crate) fn doc_mut(&mut self, id: DocId) -> &mut DocumentNode {
        match self.docs.get_mut(id.idx, id.generation) {
            Some(node) => node,
            None => panic!("stale DocId {id:?}"),
        }
    }

    /// The spatial node new children of `id` hang below: its own, or the
    /// nearest ancestor's. The root document always has one.
    fn spatial_anchor(&self, id: DocId) -> crate::spatial::SpatialId {
        let mut cur = id;
        loop {
            if let Some(rt) = self.document(cur).spatial {
                return rt;
            }
            match self.parent_document(cur) {
                Some(parent) => cur = parent,
                None => unreachable!("root document has no spatial node"),
            }
        }
    }
}
