// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON snapshots of a document's outline and spatial trees.
//!
//! Snapshots are plain [`serde_json::Value`]s, so they can be diffed in
//! tests or written out with `serde_json::to_writer_pretty`. Handles are
//! rendered as `index@generation` strings.

use kurbo::Rect;
use serde_json::{Value, json};

use mantle_core::context::Context;
use mantle_core::document::{Document, OutlineId};
use mantle_core::spatial::{SpatialId, SpatialTree};

/// Snapshots the outline tree, starting from the root outline.
///
/// Each outline lists its behavior and layout by name, its font metrics,
/// the data object it is bound to, its document's area (if it has a
/// document) and its children in creation order.
#[must_use]
pub fn outlines(doc: &Document, ctx: &Context) -> Value {
    outline(doc, ctx, doc.root())
}

/// Snapshots the spatial tree, starting from the root document's node.
///
/// Areas are relative to the parent node's frame; extents are in the
/// node's own frame. Children are listed in draw order.
#[must_use]
pub fn spatial(doc: &Document) -> Value {
    match doc.document(doc.root_document()).spatial() {
        Some(root) => spatial_node(doc.spatial(), root),
        None => Value::Null,
    }
}

fn outline(doc: &Document, ctx: &Context, id: OutlineId) -> Value {
    let node = doc.outline(id);
    let children: Vec<Value> = node
        .children()
        .iter()
        .map(|&c| outline(doc, ctx, c))
        .collect();
    json!({
        "id": format!("{}@{}", id.index(), id.generation()),
        "behavior": node.behavior().map(|b| ctx.behavior(b).name.as_str()),
        "layout": ctx.layout(node.layout()).name,
        "fontsize": node.font_size(),
        "lineheight": node.line_height(),
        "data": node.data().map(|d| d.0),
        "area": node.doc().map(|d| rect(doc.document(d).area())),
        "children": children,
    })
}

fn spatial_node(tree: &SpatialTree, id: SpatialId) -> Value {
    let mut children: Vec<SpatialId> = tree.children(id).collect();
    children.reverse();
    let children: Vec<Value> = children.into_iter().map(|c| spatial_node(tree, c)).collect();
    json!({
        "id": format!("{}@{}", id.index(), id.generation()),
        "document": tree.document(id).map(|d| d.index()),
        "area": rect(tree.area(id)),
        "extent": rect(tree.extent(id)),
        "children": children,
    })
}

fn rect(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}
