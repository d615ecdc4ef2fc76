// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data-driven UI trees: skins, reactive field evaluation and spatial
//! indexing.
//!
//! `mantle_core` turns a declarative template tree (a *skin*) plus an
//! application data graph into a live tree of components. Every templated
//! field is a small stack-machine calculation whose inputs are data fields,
//! other components' state or constants; when an input changes only the
//! fields that read it are recomputed. Resolved areas are indexed in an
//! R-tree for draw ordering and hit testing. It is `no_std` compatible (with
//! `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   SkinBuilder ──build(ctx)──► Skin
//!                                 │
//!                                 ▼
//!   DataAccessor ──► Document::generate() ──► outlines + documents
//!        ▲                  │                       │
//!        │                  ▼                       ▼
//!   set_data() ──► DependencyRegistry::fire() ──► regenerate(field)
//!                                                   │
//!                  ┌────────────────────────────────┘
//!                  ▼
//!   layout(AddChild / Reflow) ──► Document::place() ──► SpatialTree
//!                                                          │
//!   Document::flush() ◄── RELAYOUT marks ◄─────────────────┘
//!        │
//!        ▼
//!   DocumentChanges { reflowed, damage } ──► Document::draw(canvas)
//! ```
//!
//! **[`calc`]**: Typed postfix calculations, their verifier and evaluator.
//!
//! **[`data`]**: The [`DataAccessor`](data::DataAccessor) trait, key paths,
//! value coercion and an in-memory graph for tests and demos.
//!
//! **[`skin`]**: Template trees and selector lookup.
//!
//! **[`context`]**: The registry of operators, behaviors, layouts and field
//! names a document is driven with.
//!
//! **[`document`]**: Outlines, documents, generation, field propagation and
//! deferred relayout.
//!
//! **[`event`]**: Reference-counted dependency edges.
//!
//! **[`spatial`]**: Document areas in a parent-relative R-tree.
//!
//! **[`message`]**: Message dispatch and the default behavior.
//!
//! **[`layout`]**: Layout functions and the `default` layout.
//!
//! **[`component`]**: The built-in `box` and `text` behaviors.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! instrumentation, with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod arena;

pub mod calc;
pub mod component;
pub mod context;
pub mod data;
pub mod dirty;
pub mod document;
pub mod event;
pub mod field;
pub mod layout;
pub mod message;
pub mod resolver;
pub mod skin;
pub mod spatial;
pub mod trace;
pub mod unit;
