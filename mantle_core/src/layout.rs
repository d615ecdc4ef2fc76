// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout functions and the `default` layout.
//!
//! A layout is called by its parent document's default behavior whenever a
//! child is attached or detached, and by [`Document::flush`] whenever the
//! parent's area moved. It decides the child's area and hands it to
//! [`Document::place`], which maintains the spatial tree.

use kurbo::{Rect, Vec2};

use crate::context::{Host, LayoutDef};
use crate::document::{DocId, Document, Geometry};
use crate::resolver::NullResolver;

/// Why a layout function is being called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutOp {
    /// The child was just attached.
    Add,
    /// The child is being detached.
    Remove,
    /// The parent's area changed; recompute the child.
    Reflow,
}

/// Resolves an outline's geometry against its parent's area.
///
/// Relative edges scale the parent's size and absolute edges are added on
/// top. The center pivot is then subtracted: its relative part scales the
/// node's own size, which is what makes exact centering possible. The
/// result is in the same coordinates as `parent`.
#[must_use]
pub fn resolve_area(geometry: &Geometry, parent: Rect) -> Rect {
    let w = parent.width();
    let h = parent.height();
    let rel = geometry.rel;
    let abs = geometry.abs;
    let area = Rect::new(
        rel.x0 * w + abs.x0,
        rel.y0 * h + abs.y0,
        rel.x1 * w + abs.x1,
        rel.y1 * h + abs.y1,
    );
    let offset = Vec2::new(
        geometry.center_rel.x * area.width() + geometry.center.x,
        geometry.center_rel.y * area.height() + geometry.center.y,
    );
    area - offset + parent.origin().to_vec2()
}

/// The `default` layout: every child is placed by its own geometry.
pub fn default_layout(
    doc: &mut Document,
    _host: Host<'_>,
    parent: DocId,
    child: DocId,
    op: LayoutOp,
) {
    match op {
        LayoutOp::Remove => doc.unplace(child),
        LayoutOp::Add | LayoutOp::Reflow => {
            let parent_area = doc.document(parent).area();
            let outline = doc.document(child).outline();
            let area = resolve_area(doc.outline(outline).geometry(), parent_area);
            doc.place(parent, child, area);
        }
    }
}

/// The registry entry for [`default_layout`].
#[must_use]
pub fn definition() -> LayoutDef {
    LayoutDef::new("default", default_layout, &NullResolver)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(abs: Rect, rel: Rect) -> Geometry {
        Geometry {
            abs,
            rel,
            ..Geometry::default()
        }
    }

    #[test]
    fn relative_edges_scale_the_parent() {
        let g = geometry(Rect::ZERO, Rect::new(0.0, 0.0, 1.0, 0.5));
        let area = resolve_area(&g, Rect::new(10.0, 20.0, 210.0, 120.0));
        assert_eq!(area, Rect::new(10.0, 20.0, 210.0, 70.0));
    }

    #[test]
    fn absolute_edges_add_to_relative_ones() {
        let g = geometry(
            Rect::new(5.0, 5.0, -5.0, -5.0),
            Rect::new(0.0, 0.0, 1.0, 1.0),
        );
        let area = resolve_area(&g, Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(area, Rect::new(5.0, 5.0, 95.0, 45.0));
    }

    #[test]
    fn relative_center_centers_the_node() {
        let mut g = geometry(
            Rect::new(0.0, 0.0, 20.0, 10.0),
            Rect::new(0.5, 0.5, 0.5, 0.5),
        );
        g.center_rel = Vec2::new(0.5, 0.5);
        let area = resolve_area(&g, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(area, Rect::new(40.0, 45.0, 60.0, 55.0));
    }
}
