// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Upward repair of the containment invariants.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use super::id::SpatialId;
use super::tree::{SpatialTree, local};
use crate::arena::INVALID;
use crate::dirty;

/// One level of upward repair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepairStep {
    /// The node whose parent was adjusted.
    pub node: SpatialId,
    /// How far the node and its siblings moved right/down to clear a
    /// negative origin. Zero when only containment grew.
    pub adjust: Vec2,
    /// Whether the parent's area or extent grew right/down.
    pub grew: bool,
}

/// What a call to [`SpatialTree::fix`] changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Repair {
    /// One entry per ancestor level that needed adjusting, bottom-up.
    pub steps: Vec<RepairStep>,
}

impl Repair {
    /// Returns `true` if nothing needed repairing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl SpatialTree {
    /// Restores the tree invariants from `id` upward after its area changed.
    ///
    /// At each level, starting with `id`:
    ///
    /// 1. If the node's origin is negative, the node and all its siblings
    ///    move right/down by the overshoot and the parent's area grows
    ///    up/left by the same amount, so no absolute position changes.
    /// 2. If the node's area or extent reaches past the parent's area or
    ///    extent, the parent grows right/down to contain it.
    ///
    /// Repair continues with the parent while anything changed and stops at
    /// the root, whose area is never adjusted for a negative origin.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn fix(&mut self, id: SpatialId) -> Repair {
        self.validate(id);
        let mut repair = Repair::default();
        let mut idx = id.idx;
        self.dirty.mark(idx, dirty::REDRAW);

        loop {
            let p = self.parent[idx as usize];
            if p == INVALID {
                break;
            }
            let (i, pi) = (idx as usize, p as usize);

            let area = self.area[i];
            let adjust = Vec2::new((-area.x0).max(0.0), (-area.y0).max(0.0));
            if adjust != Vec2::ZERO {
                let mut s = self.first_child[pi];
                while s != INVALID {
                    self.area[s as usize] = self.area[s as usize] + adjust;
                    s = self.next_sibling[s as usize];
                }
                let pa = self.area[pi];
                self.area[pi] = Rect::new(pa.x0 - adjust.x, pa.y0 - adjust.y, pa.x1, pa.y1);
                self.extent[pi] = self.extent[pi] + adjust;
            }

            let mut grew = false;
            let child = self.area[i];
            let pa = self.area[pi];
            let width = pa.width().max(child.x1);
            let height = pa.height().max(child.y1);
            if width > pa.width() || height > pa.height() {
                self.area[pi] = Rect::new(pa.x0, pa.y0, pa.x0 + width, pa.y0 + height);
                grew = true;
            }

            let pe = self.extent[pi];
            let needed = pe
                .union(self.bounds_in_parent(idx))
                .union(local(self.area[pi]));
            if needed != pe {
                self.extent[pi] = needed;
                grew = true;
            }

            if adjust == Vec2::ZERO && !grew {
                break;
            }
            repair.steps.push(RepairStep {
                node: SpatialId {
                    idx,
                    generation: self.generation[i],
                },
                adjust,
                grew,
            });
            self.dirty.mark(p, dirty::REDRAW);
            idx = p;
        }
        repair
    }
}
