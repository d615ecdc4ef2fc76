// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The application-wide component registry.
//!
//! A [`Context`] holds everything documents look up by name: operators,
//! behaviors, layouts and the global field-name table. It is assembled once
//! through a [`ContextBuilder`] and is read-only afterwards; every document
//! operation borrows it through a [`Host`].

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::calc::{CalcKind, OperatorDef, OperatorTable};
use crate::component;
use crate::data::DataAccessor;
use crate::document::{DocId, Document};
use crate::field::{FieldId, FieldInfo, STANDARD_FIELDS};
use crate::layout::{self, LayoutOp};
use crate::message::{Message, MessageResult};
use crate::resolver::Resolver;

/// Handles a message sent to a document whose outline uses this behavior.
///
/// Returning [`MessageResult::Unhandled`] falls through to the default
/// behavior.
pub type DispatchFn = fn(&mut Document, Host<'_>, DocId, &mut Message<'_>) -> MessageResult;

/// Positions `child` inside `parent`.
pub type LayoutFn = fn(&mut Document, Host<'_>, DocId, DocId, LayoutOp);

/// Allocates fresh component state.
pub type StateFn = fn() -> Box<dyn Any>;

/// The read-only environment a document operation runs in.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    /// The component registry.
    pub ctx: &'a Context,
    /// The application data graph.
    pub data: &'a dyn DataAccessor,
}

impl<'a> Host<'a> {
    /// Bundles a context with a data graph.
    #[must_use]
    pub fn new(ctx: &'a Context, data: &'a dyn DataAccessor) -> Self {
        Self { ctx, data }
    }
}

impl fmt::Debug for Host<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("ctx", self.ctx)
            .finish_non_exhaustive()
    }
}

/// A registered behavior.
pub struct BehaviorDef {
    /// Name used by the `behavior` field.
    pub name: String,
    /// Message handler.
    pub dispatch: DispatchFn,
    /// Field table and accessors for the behavior's state.
    pub resolver: &'static dyn Resolver,
    /// Allocates the behavior's state on construction.
    pub new_state: StateFn,
}

impl BehaviorDef {
    /// Declares a behavior.
    #[must_use]
    pub fn new(
        name: &str,
        dispatch: DispatchFn,
        resolver: &'static dyn Resolver,
        new_state: StateFn,
    ) -> Self {
        Self {
            name: name.to_owned(),
            dispatch,
            resolver,
            new_state,
        }
    }
}

impl fmt::Debug for BehaviorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorDef")
            .field("name", &self.name)
            .field("fields", &self.resolver.fields().len())
            .finish_non_exhaustive()
    }
}

/// A registered layout function.
pub struct LayoutDef {
    /// Name used by the `layout` field.
    pub name: String,
    /// Places children.
    pub layout: LayoutFn,
    /// Field table and accessors for the layout's auxiliary state.
    pub resolver: &'static dyn Resolver,
    /// Allocates auxiliary state, if the layout keeps any.
    pub new_state: Option<StateFn>,
}

impl LayoutDef {
    /// Declares a stateless layout.
    #[must_use]
    pub fn new(name: &str, layout: LayoutFn, resolver: &'static dyn Resolver) -> Self {
        Self {
            name: name.to_owned(),
            layout,
            resolver,
            new_state: None,
        }
    }

    /// Gives the layout per-document auxiliary state.
    #[must_use]
    pub fn with_state(mut self, new_state: StateFn) -> Self {
        self.new_state = Some(new_state);
        self
    }
}

impl fmt::Debug for LayoutDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutDef")
            .field("name", &self.name)
            .field("fields", &self.resolver.fields().len())
            .field("stateful", &self.new_state.is_some())
            .finish_non_exhaustive()
    }
}

/// Index of a behavior in its [`Context`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorId(u32);

/// Index of a layout in its [`Context`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutId(u32);

impl BehaviorId {
    /// Returns the registry index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl LayoutId {
    /// Returns the registry index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Behaviors, layouts, operators and field names shared by every document.
pub struct Context {
    operators: OperatorTable,
    behaviors: Vec<BehaviorDef>,
    behavior_names: BTreeMap<String, BehaviorId>,
    layouts: Vec<LayoutDef>,
    layout_names: BTreeMap<String, LayoutId>,
    fields: BTreeMap<String, FieldInfo>,
    default_layout: LayoutId,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("operators", &self.operators.len())
            .field("behaviors", &self.behavior_names.keys().collect::<Vec<_>>())
            .field("layouts", &self.layout_names.keys().collect::<Vec<_>>())
            .field("fields", &self.fields.len())
            .field("default_layout", &self.default_layout)
            .finish()
    }
}

impl Context {
    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// The operator table calculations are verified against.
    #[must_use]
    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    /// Looks up a behavior by name (ASCII case-insensitive).
    #[must_use]
    pub fn behavior_id(&self, name: &str) -> Option<BehaviorId> {
        self.behavior_names.get(&name.to_ascii_lowercase()).copied()
    }

    /// Returns a behavior definition.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different context.
    #[must_use]
    pub fn behavior(&self, id: BehaviorId) -> &BehaviorDef {
        &self.behaviors[id.0 as usize]
    }

    /// Looks up a layout by name (ASCII case-insensitive).
    #[must_use]
    pub fn layout_id(&self, name: &str) -> Option<LayoutId> {
        self.layout_names.get(&name.to_ascii_lowercase()).copied()
    }

    /// Returns a layout definition.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different context.
    #[must_use]
    pub fn layout(&self, id: LayoutId) -> &LayoutDef {
        &self.layouts[id.0 as usize]
    }

    /// The layout outlines use when they do not name one.
    #[must_use]
    pub const fn default_layout(&self) -> LayoutId {
        self.default_layout
    }

    /// Resolves a field name through the global field table.
    ///
    /// Standard fields shadow behavior fields, which shadow layout fields;
    /// within each group the first registration wins.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldInfo> {
        self.fields.get(&name.to_ascii_lowercase()).copied()
    }

    /// Returns the declared kind of a field id.
    #[must_use]
    pub fn field_kind(&self, id: FieldId) -> Option<CalcKind> {
        self.fields.values().find(|f| f.id == id).map(|f| f.kind)
    }

    /// Iterates the global field table in name order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldInfo> + '_ {
        self.fields.values()
    }
}

/// Assembles a [`Context`].
#[derive(Debug, Default)]
pub struct ContextBuilder {
    operators: OperatorTable,
    behaviors: Vec<BehaviorDef>,
    layouts: Vec<LayoutDef>,
}

impl ContextBuilder {
    /// A builder with nothing registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder preloaded with the standard operators, the `box` and
    /// `text` behaviors and the `default` layout.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            operators: OperatorTable::standard(),
            behaviors: Vec::new(),
            layouts: Vec::new(),
        }
        .behavior(component::boxes::definition())
        .behavior(component::text::definition())
        .layout(layout::definition())
    }

    /// Registers an operator. The first registration of a name wins.
    #[must_use]
    pub fn operator(mut self, def: OperatorDef) -> Self {
        self.operators.register(def);
        self
    }

    /// Registers a behavior. The first registration of a name wins.
    #[must_use]
    pub fn behavior(mut self, def: BehaviorDef) -> Self {
        self.behaviors.push(def);
        self
    }

    /// Registers a layout. The first registration of a name wins.
    #[must_use]
    pub fn layout(mut self, def: LayoutDef) -> Self {
        self.layouts.push(def);
        self
    }

    /// Freezes the registry.
    ///
    /// A `default` layout is added if none was registered.
    #[must_use]
    pub fn build(self) -> Context {
        let Self {
            operators,
            behaviors,
            mut layouts,
        } = self;

        if !layouts.iter().any(|l| l.name.eq_ignore_ascii_case("default")) {
            layouts.push(layout::definition());
        }

        let mut behavior_names = BTreeMap::new();
        for (i, def) in behaviors.iter().enumerate() {
            behavior_names
                .entry(def.name.to_ascii_lowercase())
                .or_insert(BehaviorId(index(i)));
        }
        let mut layout_names = BTreeMap::new();
        for (i, def) in layouts.iter().enumerate() {
            layout_names
                .entry(def.name.to_ascii_lowercase())
                .or_insert(LayoutId(index(i)));
        }

        let mut fields = BTreeMap::new();
        let declared = STANDARD_FIELDS
            .iter()
            .chain(behaviors.iter().flat_map(|b| b.resolver.fields()))
            .chain(layouts.iter().flat_map(|l| l.resolver.fields()));
        for info in declared {
            fields.entry(info.name.to_ascii_lowercase()).or_insert(*info);
        }

        let default_layout = layout_names
            .get("default")
            .copied()
            .unwrap_or(LayoutId(0));

        Context {
            operators,
            behaviors,
            behavior_names,
            layouts,
            layout_names,
            fields,
            default_layout,
        }
    }
}

#[expect(clippy::cast_possible_truncation, reason = "registries hold few entries")]
const fn index(i: usize) -> u32 {
    i as u32
}
