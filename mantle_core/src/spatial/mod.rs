// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical bounding-volume index over laid-out documents.
//!
//! Each spatial node has:
//!
//! - An identity ([`SpatialId`]), a generational handle that becomes stale
//!   when the node is destroyed.
//! - Topology: parent, first-child and next-sibling links. New children are
//!   prepended, so the first child is the most recently attached.
//! - An **area**, in the parent's frame: its origin is relative to the
//!   parent area's top-left corner.
//! - An **extent**, in the node's own frame: the bounding box of its own
//!   area and every descendant.
//! - Optionally the [`DocId`](crate::document::DocId) it indexes. Grouping
//!   nodes created by a parent to hold merged children have none.
//!
//! # Invariants
//!
//! After [`fix`](SpatialTree::fix) returns, for every non-root node:
//!
//! - `area.x0 >= 0` and `area.y0 >= 0`;
//! - `extent` contains `(0, 0, area.width, area.height)`;
//! - the parent's extent contains the node's extent offset by its area
//!   origin.
//!
//! Extents only grow; shrinking a node never shrinks its ancestors.
//! [`check_invariants`](SpatialTree::check_invariants) checks these invariants.
//!
//! # Dirty tracking
//!
//! Area changes mark the [`REDRAW`](crate::dirty::REDRAW) channel. Destroyed
//! and moved nodes leave their old bounds as pending damage.
//! [`take_damage`](SpatialTree::take_damage) drains both.

mod fix;
mod id;
mod traverse;
mod tree;

pub use fix::{Repair, RepairStep};
pub use id::SpatialId;
pub use traverse::{Children, Violation};
pub use tree::SpatialTree;
