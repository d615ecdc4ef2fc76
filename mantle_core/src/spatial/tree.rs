// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays spatial storage with allocation, topology and bounds.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker};

use super::id::SpatialId;
use super::traverse::Children;
use crate::arena::INVALID;
use crate::dirty;
use crate::document::DocId;

/// The node's own area in its own frame.
#[inline]
pub(crate) fn local(area: Rect) -> Rect {
    Rect::from_origin_size(Point::ORIGIN, area.size())
}

/// Struct-of-arrays storage for all spatial nodes.
///
/// Nodes are addressed by [`SpatialId`] handles. Internally, each node
/// occupies a slot in parallel arrays. Destroyed nodes are recycled via a
/// free list, and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct SpatialTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,

    // -- Bounds --
    pub(crate) area: Vec<Rect>,
    pub(crate) extent: Vec<Rect>,
    pub(crate) document: Vec<Option<DocId>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) live: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) damage: Vec<Rect>,
}

impl Default for SpatialTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            area: Vec::new(),
            extent: Vec::new(),
            document: Vec::new(),
            generation: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            damage: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a detached node with an empty area and returns its handle.
    pub fn create(&mut self) -> SpatialId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.area[i] = Rect::ZERO;
            self.extent[i] = Rect::ZERO;
            self.document[i] = None;
            self.live[i] = true;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.area.push(Rect::ZERO);
            self.extent.push(Rect::ZERO);
            self.document.push(None);
            self.generation.push(0);
            self.live.push(true);
            idx
        };

        SpatialId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a node and its entire subtree.
    ///
    /// The node is unlinked from its parent first; its absolute bounds become
    /// pending damage. Returns the documents that were indexed by the
    /// destroyed nodes, in pre-order.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy(&mut self, id: SpatialId) -> Vec<DocId> {
        self.validate(id);
        let root = id.idx;
        self.damage.push(self.absolute_extent(root));
        if self.parent[root as usize] != INVALID {
            self.unlink_from_parent(root);
        }

        let mut docs = Vec::new();
        let mut stack = Vec::from([root]);
        while let Some(idx) = stack.pop() {
            let i = idx as usize;
            let mut c = self.first_child[i];
            while c != INVALID {
                stack.push(c);
                c = self.next_sibling[c as usize];
            }
            if let Some(doc) = self.document[i].take() {
                docs.push(doc);
            }
            self.dirty.remove_key(idx);
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            // Bump generation so old handles immediately fail validation.
            self.generation[i] += 1;
            self.live[i] = false;
            self.free_list.push(idx);
        }
        docs
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: SpatialId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && self.live[id.idx as usize]
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns `true` if the tree holds no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Topology API --

    /// Attaches `child` as the **first** child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn attach(&mut self, parent: SpatialId, child: SpatialId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = self.first_child[p as usize];
        self.first_child[p as usize] = c;
        self.dirty.mark(c, dirty::REDRAW);
    }

    /// Detaches `child` from its parent, keeping its subtree intact.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn detach(&mut self, child: SpatialId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "node has no parent");
        self.damage.push(self.absolute_extent(c));
        self.unlink_from_parent(c);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: SpatialId) -> Option<SpatialId> {
        self.validate(id);
        self.handle(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a node, most recently
    /// attached first.
    #[must_use]
    pub fn children(&self, id: SpatialId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns `true` if the node has at least one child.
    #[must_use]
    pub fn has_children(&self, id: SpatialId) -> bool {
        self.validate(id);
        self.first_child[id.idx as usize] != INVALID
    }

    // -- Bounds API --

    /// Returns the node's area in its parent's frame.
    #[must_use]
    pub fn area(&self, id: SpatialId) -> Rect {
        self.validate(id);
        self.area[id.idx as usize]
    }

    /// Returns the node's extent in its own frame.
    #[must_use]
    pub fn extent(&self, id: SpatialId) -> Rect {
        self.validate(id);
        self.extent[id.idx as usize]
    }

    /// Returns the document this node indexes.
    #[must_use]
    pub fn document(&self, id: SpatialId) -> Option<DocId> {
        self.validate(id);
        self.document[id.idx as usize]
    }

    /// Associates a document with this node.
    pub fn set_document(&mut self, id: SpatialId, doc: Option<DocId>) {
        self.validate(id);
        self.document[id.idx as usize] = doc;
    }

    /// Replaces the node's area.
    ///
    /// A childless node's extent is reset to its local area; a node with
    /// children keeps its extent and grows it to cover the new area.
    /// Call [`fix`](Self::fix) afterwards to restore the tree invariants.
    pub fn set_area(&mut self, id: SpatialId, area: Rect) {
        self.validate(id);
        let i = id.idx as usize;
        let old = self.area[i];
        if old == area {
            return;
        }
        self.damage.push(self.absolute_extent(id.idx));
        if self.first_child[i] == INVALID {
            self.extent[i] = local(area);
        } else {
            self.extent[i] = self.extent[i].union(local(area));
        }
        self.area[i] = area;
        self.dirty.mark(id.idx, dirty::REDRAW);
    }

    /// Grows the node's area to the union of its current area and `area`.
    pub fn merge_area(&mut self, id: SpatialId, area: Rect) {
        self.validate(id);
        let merged = self.area[id.idx as usize].union(area);
        self.set_area(id, merged);
    }

    /// Returns the absolute position of a node's frame origin.
    #[must_use]
    pub fn frame_origin(&self, id: SpatialId) -> Point {
        self.validate(id);
        self.origin_of(id.idx)
    }

    /// Returns the node's area in root coordinates.
    #[must_use]
    pub fn resolve_area(&self, id: SpatialId) -> Rect {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        let base = if p == INVALID {
            Vec2::ZERO
        } else {
            self.origin_of(p).to_vec2()
        };
        self.area[id.idx as usize] + base
    }

    /// Drains pending damage: old bounds of moved or destroyed nodes, then
    /// the current absolute extents of nodes marked on the REDRAW channel.
    pub fn take_damage(&mut self) -> Vec<Rect> {
        let mut damage = core::mem::take(&mut self.damage);
        let redraw: Vec<u32> = self
            .dirty
            .drain(dirty::REDRAW)
            .deterministic()
            .run()
            .collect();
        for idx in redraw {
            if self.live.get(idx as usize) == Some(&true) {
                damage.push(self.absolute_extent(idx));
            }
        }
        damage
    }

    // -- Internal helpers --

    /// Validates that a handle is live.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[inline]
    pub(crate) fn validate(&self, id: SpatialId) {
        assert!(
            id.idx < self.len
                && self.generation[id.idx as usize] == id.generation
                && self.live[id.idx as usize],
            "stale SpatialId {id:?}"
        );
    }

    pub(crate) fn handle(&self, idx: u32) -> Option<SpatialId> {
        (idx != INVALID).then(|| SpatialId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Absolute origin of the frame `idx`'s children are positioned in.
    pub(crate) fn origin_of(&self, idx: u32) -> Point {
        let mut origin = Point::ORIGIN;
        let mut cur = idx;
        while cur != INVALID {
            origin += self.area[cur as usize].origin().to_vec2();
            cur = self.parent[cur as usize];
        }
        origin
    }

    /// A node's extent in its parent's frame.
    #[inline]
    pub(crate) fn bounds_in_parent(&self, idx: u32) -> Rect {
        self.extent[idx as usize] + self.area[idx as usize].origin().to_vec2()
    }

    pub(crate) fn absolute_extent(&self, idx: u32) -> Rect {
        self.extent[idx as usize] + self.origin_of(idx).to_vec2()
    }

    /// Unlinks `idx` from its parent's singly linked child list.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let next = self.next_sibling[idx as usize];
        if self.first_child[p as usize] == idx {
            self.first_child[p as usize] = next;
        } else {
            let mut prev = self.first_child[p as usize];
            while prev != INVALID && self.next_sibling[prev as usize] != idx {
                prev = self.next_sibling[prev as usize];
            }
            if prev != INVALID {
                self.next_sibling[prev as usize] = next;
            }
        }
        self.parent[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
        self.dirty.mark(p, dirty::REDRAW);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut tree = SpatialTree::new();
        let a = tree.create();
        let b = tree.create();
        assert!(tree.is_alive(a));
        assert!(tree.is_alive(b));
        assert_eq!(tree.len(), 2);

        tree.destroy(a);
        assert!(!tree.is_alive(a));
        assert!(tree.is_alive(b));

        // Slot reuse: new node gets a different generation.
        let c = tree.create();
        assert_eq!(c.idx, a.idx);
        assert_ne!(c.generation, a.generation);
        assert!(!tree.is_alive(a));
        assert!(tree.is_alive(c));
    }

    #[test]
    fn attach_prepends() {
        let mut tree = SpatialTree::new();
        let root = tree.create();
        let a = tree.create();
        let b = tree.create();
        let c = tree.create();
        tree.attach(root, a);
        tree.attach(root, b);
        tree.attach(root, c);

        let children: Vec<SpatialId> = tree.children(root).collect();
        assert_eq!(children, [c, b, a]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn detach_middle_child() {
        let mut tree = SpatialTree::new();
        let root = tree.create();
        let a = tree.create();
        let b = tree.create();
        let c = tree.create();
        tree.attach(root, a);
        tree.attach(root, b);
        tree.attach(root, c);

        tree.detach(b);
        let children: Vec<SpatialId> = tree.children(root).collect();
        assert_eq!(children, [c, a]);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn destroy_takes_the_subtree() {
        let mut tree = SpatialTree::new();
        let root = tree.create();
        let a = tree.create();
        let a1 = tree.create();
        let a2 = tree.create();
        tree.attach(root, a);
        tree.attach(a, a1);
        tree.attach(a1, a2);

        tree.destroy(a);
        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(a1));
        assert!(!tree.is_alive(a2));
        assert!(!tree.has_children(root));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn childless_extent_tracks_area() {
        let mut tree = SpatialTree::new();
        let n = tree.create();
        tree.set_area(n, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(tree.extent(n), Rect::new(0.0, 0.0, 30.0, 40.0));
        tree.set_area(n, Rect::new(10.0, 20.0, 20.0, 30.0));
        assert_eq!(tree.extent(n), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn merge_area_unions() {
        let mut tree = SpatialTree::new();
        let n = tree.create();
        tree.set_area(n, Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.merge_area(n, Rect::new(5.0, 5.0, 20.0, 15.0));
        assert_eq!(tree.area(n), Rect::new(0.0, 0.0, 20.0, 15.0));
    }

    #[test]
    fn resolve_area_accumulates_origins() {
        let mut tree = SpatialTree::new();
        let root = tree.create();
        let a = tree.create();
        let b = tree.create();
        tree.attach(root, a);
        tree.attach(a, b);
        tree.set_area(root, Rect::new(1.0, 1.0, 100.0, 100.0));
        tree.set_area(a, Rect::new(10.0, 10.0, 50.0, 50.0));
        tree.set_area(b, Rect::new(5.0, 5.0, 15.0, 15.0));
        assert_eq!(tree.resolve_area(b), Rect::new(16.0, 16.0, 26.0, 26.0));
        assert_eq!(tree.frame_origin(a), Point::new(11.0, 11.0));
    }

    #[test]
    fn damage_reports_old_and_new_bounds() {
        let mut tree = SpatialTree::new();
        let root = tree.create();
        let n = tree.create();
        tree.attach(root, n);
        tree.set_area(n, Rect::new(0.0, 0.0, 10.0, 10.0));
        let _ = tree.take_damage();

        tree.set_area(n, Rect::new(20.0, 0.0, 30.0, 10.0));
        let damage = tree.take_damage();
        assert!(damage.contains(&Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(damage.contains(&Rect::new(20.0, 0.0, 30.0, 10.0)));
        assert!(tree.take_damage().is_empty());
    }

    #[test]
    #[should_panic(expected = "stale SpatialId")]
    fn stale_handle_panics() {
        let mut tree = SpatialTree::new();
        let n = tree.create();
        tree.destroy(n);
        let _ = tree.area(n);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_attach_panics() {
        let mut tree = SpatialTree::new();
        let a = tree.create();
        let b = tree.create();
        let c = tree.create();
        tree.attach(a, c);
        tree.attach(b, c);
    }
}
