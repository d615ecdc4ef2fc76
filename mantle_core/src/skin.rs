// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Skin templates.
//!
//! A [`Skin`] is an immutable tree of [`SkinNode`]s plus a selector table.
//! Each node either binds fields to [`Calculation`]s, in which case
//! generating it produces one outline, or binds no fields at all, in which
//! case it is an expansion point: the generator reads the bound data object
//! and instantiates one template per element, choosing templates by
//! selector.
//!
//! Selectors are dotted paths of node ids (`list.items`). Every tree node is
//! registered under its path from the root; free-standing templates are
//! registered under the selector they are declared with. Lookups are ASCII
//! case-insensitive.

use alloc::borrow::ToOwned;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;

use crate::calc::{Calculation, VerifyError, verify};
use crate::context::Context;
use crate::field::FieldId;
use crate::unit::Unit;

/// Index of a node within its [`Skin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkinNodeId(u32);

impl SkinNodeId {
    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// One template node.
#[derive(Clone, Debug, Default)]
pub struct SkinNode {
    id: String,
    fields: BTreeMap<FieldId, Calculation>,
    unresolved: BTreeMap<String, Calculation>,
    children: Vec<SkinNodeId>,
}

impl SkinNode {
    /// The node's own selector segment.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fields whose names resolved when the skin was built.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<FieldId, Calculation> {
        &self.fields
    }

    /// Returns the calculation bound to `field`.
    #[must_use]
    pub fn field(&self, field: FieldId) -> Option<&Calculation> {
        self.fields.get(&field)
    }

    /// Fields whose names no registered component declares. They are kept
    /// so expansion treats the node as field-bearing, and are reported as
    /// diagnostics each time the node is generated.
    #[must_use]
    pub fn unresolved(&self) -> &BTreeMap<String, Calculation> {
        &self.unresolved
    }

    /// Child templates, in declaration order.
    #[must_use]
    pub fn children(&self) -> &[SkinNodeId] {
        &self.children
    }

    /// Returns `true` for nodes that expand over their data instead of
    /// producing an outline.
    #[must_use]
    pub fn is_expansion(&self) -> bool {
        self.fields.is_empty() && self.unresolved.is_empty()
    }
}

/// A compiled, immutable template tree.
#[derive(Clone, Debug)]
pub struct Skin {
    nodes: Vec<SkinNode>,
    selectors: BTreeMap<String, SkinNodeId>,
    paths: Vec<String>,
}

impl Skin {
    /// The unnamed root; its children are generated into the document root.
    #[must_use]
    pub const fn root(&self) -> SkinNodeId {
        SkinNodeId(0)
    }

    /// Returns a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to a different skin.
    #[must_use]
    pub fn node(&self, id: SkinNodeId) -> &SkinNode {
        &self.nodes[id.0 as usize]
    }

    /// Number of nodes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the skin holds only its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// The selector path a node is registered under; empty for the root.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to a different skin.
    #[must_use]
    pub fn path(&self, id: SkinNodeId) -> &str {
        &self.paths[id.0 as usize]
    }

    /// Looks up an exact selector.
    #[must_use]
    pub fn get(&self, selector: &str) -> Option<SkinNodeId> {
        self.selectors.get(&selector.to_ascii_lowercase()).copied()
    }

    /// Finds the template for a data element of type `type_name` found at
    /// `path`.
    ///
    /// For every suffix of `path`, from the whole path down to its last
    /// segment, `suffix.type_name` is tried before `suffix`; `type_name`
    /// alone is tried last. `exclude` (the node being expanded) never
    /// matches.
    #[must_use]
    pub fn lookup(
        &self,
        path: &str,
        type_name: &str,
        exclude: Option<SkinNodeId>,
    ) -> Option<SkinNodeId> {
        let accept = |id: Option<SkinNodeId>| id.filter(|id| Some(*id) != exclude);
        let mut suffix = path;
        while !suffix.is_empty() {
            if !type_name.is_empty() {
                let mut typed = suffix.to_owned();
                typed.push('.');
                typed.push_str(type_name);
                if let Some(id) = accept(self.get(&typed)) {
                    return Some(id);
                }
            }
            if let Some(id) = accept(self.get(suffix)) {
                return Some(id);
            }
            suffix = match suffix.find('.') {
                Some(dot) => &suffix[dot + 1..],
                None => "",
            };
        }
        if type_name.is_empty() {
            None
        } else {
            accept(self.get(type_name))
        }
    }
}

/// Why a skin failed to build.
#[derive(Clone, Debug, PartialEq)]
pub enum SkinError {
    /// A field's calculation does not verify against the field's kind.
    Verify {
        /// Selector of the offending node.
        selector: String,
        /// Field name as written.
        field: String,
        /// What verification found.
        error: VerifyError,
    },
    /// A node names a parent that is not part of this builder.
    UnknownParent {
        /// The node's id.
        id: String,
    },
}

impl fmt::Display for SkinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verify {
                selector,
                field,
                error,
            } => write!(f, "field `{field}` of `{selector}`: {error}"),
            Self::UnknownParent { id } => write!(f, "node `{id}` has an unknown parent"),
        }
    }
}

impl core::error::Error for SkinError {}

#[derive(Debug)]
struct PendingNode {
    id: String,
    parent: Option<SkinNodeId>,
    selector: Option<String>,
    fields: Vec<(String, Calculation)>,
}

/// Assembles a [`Skin`].
#[derive(Debug)]
pub struct SkinBuilder {
    nodes: Vec<PendingNode>,
}

impl Default for SkinBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SkinBuilder {
    /// A builder holding only the root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::from([PendingNode {
                id: String::new(),
                parent: None,
                selector: None,
                fields: Vec::new(),
            }]),
        }
    }

    /// The root node.
    #[must_use]
    pub const fn root(&self) -> SkinNodeId {
        SkinNodeId(0)
    }

    /// Adds a child node named `id` under `parent`.
    pub fn node(&mut self, parent: SkinNodeId, id: &str) -> SkinNodeId {
        self.push(PendingNode {
            id: id.to_owned(),
            parent: Some(parent),
            selector: None,
            fields: Vec::new(),
        })
    }

    /// Adds a free-standing template registered under `selector`.
    ///
    /// Templates are never generated directly; expansion nodes pick them
    /// for data elements.
    pub fn template(&mut self, selector: &str) -> SkinNodeId {
        let id = selector.rsplit('.').next().unwrap_or(selector);
        self.push(PendingNode {
            id: id.to_owned(),
            parent: None,
            selector: Some(selector.to_owned()),
            fields: Vec::new(),
        })
    }

    /// Binds a field by name.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this builder.
    pub fn field(&mut self, node: SkinNodeId, name: &str, calc: Calculation) -> &mut Self {
        self.nodes[node.0 as usize]
            .fields
            .push((name.to_owned(), calc));
        self
    }

    /// Binds all eight edge fields to constants.
    pub fn area(&mut self, node: SkinNodeId, abs: Rect, rel: Rect) -> &mut Self {
        let edges = [
            ("abs_left", abs.x0),
            ("abs_top", abs.y0),
            ("abs_right", abs.x1),
            ("abs_bottom", abs.y1),
            ("rel_left", rel.x0),
            ("rel_top", rel.y0),
            ("rel_right", rel.x1),
            ("rel_bottom", rel.y1),
        ];
        for (name, value) in edges {
            self.field(node, name, Calculation::float(value, Unit::Px));
        }
        self
    }

    /// Resolves field names against `ctx` and verifies every calculation.
    pub fn build(self, ctx: &Context) -> Result<Skin, SkinError> {
        let len = self.nodes.len();
        let mut nodes: Vec<SkinNode> = Vec::with_capacity(len);
        let mut selectors = BTreeMap::new();
        let mut paths: Vec<String> = Vec::with_capacity(len);

        for (i, pending) in self.nodes.iter().enumerate() {
            if let Some(parent) = pending.parent
                && parent.0 as usize >= i
            {
                return Err(SkinError::UnknownParent {
                    id: pending.id.clone(),
                });
            }
        }

        for (i, pending) in self.nodes.into_iter().enumerate() {
            let id = SkinNodeId(index(i));
            let path = match (&pending.selector, pending.parent) {
                (Some(selector), _) => selector.clone(),
                (None, Some(parent)) if parent.0 != 0 => {
                    let mut p = paths[parent.0 as usize].clone();
                    p.push('.');
                    p.push_str(&pending.id);
                    p
                }
                (None, _) => pending.id.clone(),
            };

            let mut node = SkinNode {
                id: pending.id,
                ..SkinNode::default()
            };
            for (name, calc) in pending.fields {
                match ctx.field(&name) {
                    Some(info) => {
                        verify(calc.nodes(), ctx.operators(), info.kind).map_err(|error| {
                            SkinError::Verify {
                                selector: path.clone(),
                                field: name.clone(),
                                error,
                            }
                        })?;
                        node.fields.insert(info.id, calc);
                    }
                    None => {
                        node.unresolved.insert(name.to_ascii_lowercase(), calc);
                    }
                }
            }

            if let Some(parent) = pending.parent {
                nodes[parent.0 as usize].children.push(id);
            }
            if i != 0 {
                selectors.entry(path.to_ascii_lowercase()).or_insert(id);
            }
            nodes.push(node);
            paths.push(path);
        }

        Ok(Skin {
            nodes,
            selectors,
            paths,
        })
    }

    fn push(&mut self, node: PendingNode) -> SkinNodeId {
        let id = SkinNodeId(index(self.nodes.len()));
        self.nodes.push(node);
        id
    }
}

#[expect(clippy::cast_possible_truncation, reason = "skins hold few nodes")]
const fn index(i: usize) -> u32 {
    i as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::CalcKind;
    use crate::context::ContextBuilder;

    fn ctx() -> Context {
        ContextBuilder::standard().build()
    }

    #[test]
    fn fields_resolve_through_the_context() {
        let mut b = SkinBuilder::new();
        let panel = b.node(b.root(), "panel");
        b.field(panel, "behavior", Calculation::string("box"))
            .field(panel, "FillColor", Calculation::int(7))
            .field(panel, "mystery", Calculation::int(1));
        let skin = b.build(&ctx()).unwrap();

        let node = skin.node(panel);
        assert_eq!(node.id(), "panel");
        assert!(node.field(FieldId::BEHAVIOR).is_some());
        assert!(node.field(FieldId::FILL_COLOR).is_some());
        assert!(node.unresolved().contains_key("mystery"));
        assert_eq!(skin.node(skin.root()).children(), &[panel]);
    }

    #[test]
    fn build_rejects_mistyped_fields() {
        let mut b = SkinBuilder::new();
        let panel = b.node(b.root(), "panel");
        b.field(panel, "abs_left", Calculation::string("wide"));
        let err = b.build(&ctx()).unwrap_err();
        assert_eq!(
            err,
            SkinError::Verify {
                selector: "panel".into(),
                field: "abs_left".into(),
                error: VerifyError::ResultType {
                    expected: CalcKind::Float,
                    found: CalcKind::Str,
                },
            }
        );
    }

    #[test]
    fn build_rejects_foreign_parents() {
        let mut b = SkinBuilder::new();
        b.node(SkinNodeId(40), "orphan");
        assert_eq!(
            b.build(&ctx()).unwrap_err(),
            SkinError::UnknownParent {
                id: "orphan".into()
            }
        );
    }

    #[test]
    fn area_binds_eight_edges() {
        let mut b = SkinBuilder::new();
        let n = b.node(b.root(), "n");
        b.area(n, Rect::ZERO, Rect::new(0.0, 0.0, 1.0, 1.0));
        let skin = b.build(&ctx()).unwrap();
        assert_eq!(skin.node(n).fields().len(), 8);
        assert!(!skin.node(n).is_expansion());
    }

    #[test]
    fn lookup_prefers_typed_and_longer_selectors() {
        let mut b = SkinBuilder::new();
        let list = b.node(b.root(), "list");
        b.field(list, "behavior", Calculation::string("box"));
        let items = b.node(list, "items");
        let specific = b.template("list.items.label");
        let generic = b.template("items");
        let by_type = b.template("button");
        for t in [specific, generic, by_type] {
            b.field(t, "behavior", Calculation::string("text"));
        }
        let skin = b.build(&ctx()).unwrap();

        assert_eq!(skin.get("LIST.ITEMS"), Some(items));
        assert_eq!(skin.lookup("list.items", "label", Some(items)), Some(specific));
        assert_eq!(
            skin.lookup("list.items", "image", Some(items)),
            Some(generic),
            "falls back to the untyped suffix"
        );
        assert_eq!(skin.lookup("other.path", "button", None), Some(by_type));
        assert_eq!(skin.lookup("other.path", "image", None), None);
    }

    #[test]
    fn lookup_never_returns_the_excluded_node() {
        let mut b = SkinBuilder::new();
        let items = b.node(b.root(), "items");
        let skin = b.build(&ctx()).unwrap();
        assert!(skin.node(items).is_expansion());
        assert_eq!(skin.lookup("items", "", Some(items)), None);
        assert_eq!(skin.lookup("items", "", None), Some(items));
    }
}
