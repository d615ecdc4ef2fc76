// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal: child iteration, hit testing, draw order and invariant
//! checks.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use super::id::SpatialId;
use super::tree::{SpatialTree, local};
use crate::arena::INVALID;
use crate::document::DocId;

/// An iterator over the direct children of a node.
///
/// Created by [`SpatialTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a SpatialTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a SpatialTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = SpatialId;

    fn next(&mut self) -> Option<SpatialId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(SpatialId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}

/// A broken spatial invariant, as reported by [`SpatialTree::check_invariants`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Violation {
    /// A non-root node's area has a negative origin.
    NegativeOrigin(SpatialId),
    /// A node's extent does not cover its own area.
    ExtentMissesArea(SpatialId),
    /// A parent's extent does not cover a child's extent.
    ParentMissesChild {
        /// The parent.
        parent: SpatialId,
        /// The uncovered child.
        child: SpatialId,
    },
}

fn covers(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

impl SpatialTree {
    /// Returns the first document under `point` (in root coordinates).
    ///
    /// Children are searched before their parent and in sibling order, so
    /// the most recently attached child wins overlaps. Subtrees whose extent
    /// misses the point are skipped.
    #[must_use]
    pub fn hit_test(&self, root: SpatialId, point: Point) -> Option<DocId> {
        self.validate(root);
        let p = self.parent[root.idx as usize];
        let base = if p == INVALID {
            Point::ORIGIN
        } else {
            self.origin_of(p)
        };
        self.hit(root.idx, point - base.to_vec2())
    }

    fn hit(&self, idx: u32, point: Point) -> Option<DocId> {
        let i = idx as usize;
        if !self.bounds_in_parent(idx).contains(point) {
            return None;
        }
        let inner = point - self.area[i].origin().to_vec2();
        let mut c = self.first_child[i];
        while c != INVALID {
            if let Some(doc) = self.hit(c, inner) {
                return Some(doc);
            }
            c = self.next_sibling[c as usize];
        }
        if self.area[i].contains(point) {
            self.document[i]
        } else {
            None
        }
    }

    /// Lists the documents directly below `root` in draw order.
    ///
    /// Walks children pre-order. A child that indexes a document is listed
    /// and not descended into, since drawing that document draws its own
    /// subtree; grouping nodes without a document are walked through.
    #[must_use]
    pub fn draw_order(&self, root: SpatialId) -> Vec<DocId> {
        self.validate(root);
        let mut out = Vec::new();
        self.collect_documents(root.idx, &mut out);
        out
    }

    fn collect_documents(&self, idx: u32, out: &mut Vec<DocId>) {
        let mut c = self.first_child[idx as usize];
        while c != INVALID {
            match self.document[c as usize] {
                Some(doc) => out.push(doc),
                None => self.collect_documents(c, out),
            }
            c = self.next_sibling[c as usize];
        }
    }

    /// Checks every live node against the tree invariants.
    #[must_use]
    pub fn check_invariants(&self) -> Option<Violation> {
        for idx in 0..self.len {
            let i = idx as usize;
            if !self.live[i] {
                continue;
            }
            let id = SpatialId {
                idx,
                generation: self.generation[i],
            };
            let p = self.parent[i];
            if p != INVALID && (self.area[i].x0 < 0.0 || self.area[i].y0 < 0.0) {
                return Some(Violation::NegativeOrigin(id));
            }
            if !covers(self.extent[i], local(self.area[i])) {
                return Some(Violation::ExtentMissesArea(id));
            }
            if p != INVALID && !covers(self.extent[p as usize], self.bounds_in_parent(idx)) {
                return Some(Violation::ParentMissesChild {
                    parent: SpatialId {
                        idx: p,
                        generation: self.generation[p as usize],
                    },
                    child: id,
                });
            }
        }
        None
    }
}
