// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for outline generation and change propagation.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`Document`](crate::document::Document) calls as it generates outlines,
//! links dependency edges, fires changes and repairs the spatial tree. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and installed sinks
//! are dropped. When **on**, each method performs a single `Option` branch
//! before dispatching.
//!
//! Diagnostics are the one event a skin author usually wants: a field name
//! nothing declares, an unknown behavior, a missing template. Generation
//! never fails on these; it reports them here and carries on.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use alloc::boxed::Box;

use kurbo::Vec2;

use crate::document::{DocId, OutlineId, SwapPhase};
use crate::event::{EventId, EventSource, EventTuple};
use crate::field::FieldId;
use crate::spatial::{RepairStep, SpatialId};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What happened to an outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutlineEventKind {
    /// The outline was created from a skin node.
    Created,
    /// The outline and its document were destroyed.
    Destroyed,
}

/// Which component of a document is being swapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapTarget {
    /// The behavior and its state.
    Behavior,
    /// The layout and its auxiliary state.
    Layout,
}

/// What happened to a dependency edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeEventKind {
    /// A new edge was linked.
    Registered,
    /// An identical edge existed and its count went up.
    Shared,
    /// The edge's count went down but it stays linked.
    Released,
    /// The edge was unlinked.
    Unlinked,
}

/// The class of a [`DiagnosticEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A skin field name that no behavior, layout or standard field declares.
    UnresolvedField,
    /// A `behavior` field named a behavior that is not registered.
    UnknownBehavior,
    /// A `layout` field named a layout that is not registered.
    UnknownLayout,
    /// A binding whose key is computed, so no dependency edge could be made.
    DynamicKey,
    /// An array element had no matching template.
    MissingTemplate,
    /// Template expansion nested deeper than the generator allows.
    DepthExceeded,
    /// A swap was requested while another one was in progress.
    SwapInProgress,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an outline is created or destroyed.
#[derive(Clone, Copy, Debug)]
pub struct OutlineEvent {
    /// The outline.
    pub outline: OutlineId,
    /// Its parent, if any.
    pub parent: Option<OutlineId>,
    /// What happened.
    pub kind: OutlineEventKind,
}

/// Emitted when evaluation changed a field's stored value.
#[derive(Clone, Copy, Debug)]
pub struct FieldChangeEvent {
    /// The outline whose field changed.
    pub outline: OutlineId,
    /// The field.
    pub field: FieldId,
    /// The propagation pass the change happened in.
    pub pass: u64,
}

/// Emitted at each phase of a behavior or layout swap.
#[derive(Clone, Copy, Debug)]
pub struct SwapEvent {
    /// The outline being swapped.
    pub outline: OutlineId,
    /// Which component.
    pub target: SwapTarget,
    /// The phase being entered.
    pub phase: SwapPhase,
}

/// Emitted when a dependency edge is linked, shared or released.
#[derive(Clone, Copy, Debug)]
pub struct EdgeEvent {
    /// The edge.
    pub edge: EventId,
    /// Its identity.
    pub tuple: EventTuple,
    /// What happened.
    pub kind: EdgeEventKind,
}

/// Emitted when a source field fires.
#[derive(Clone, Copy, Debug)]
pub struct FireEvent {
    /// The source.
    pub source: EventSource,
    /// The source field.
    pub field: u32,
    /// Number of edges notified.
    pub deliveries: usize,
    /// The propagation pass.
    pub pass: u64,
}

/// Emitted for each level of spatial-tree repair.
#[derive(Clone, Copy, Debug)]
pub struct RepairEvent {
    /// The node whose parent was adjusted.
    pub node: SpatialId,
    /// How far the node and its siblings moved.
    pub adjust: Vec2,
    /// Whether the parent grew right or down.
    pub grew: bool,
}

impl From<&RepairStep> for RepairEvent {
    fn from(step: &RepairStep) -> Self {
        Self {
            node: step.node,
            adjust: step.adjust,
            grew: step.grew,
        }
    }
}

/// Emitted at the end of [`Document::flush`](crate::document::Document::flush).
#[derive(Clone, Copy, Debug)]
pub struct FlushEvent {
    /// Number of drain passes that found work.
    pub passes: u32,
    /// Number of documents re-laid out.
    pub reflowed: usize,
    /// Number of damage rectangles reported.
    pub damage: usize,
}

/// A recoverable problem found while generating or updating outlines.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticEvent<'a> {
    /// The outline concerned, if any.
    pub outline: Option<OutlineId>,
    /// The document concerned, if any.
    pub document: Option<DocId>,
    /// The class of problem.
    pub kind: DiagnosticKind,
    /// The offending name, key or selector.
    pub detail: &'a str,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a document.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when an outline is created or destroyed.
    fn on_outline(&mut self, e: &OutlineEvent) {
        _ = e;
    }

    /// Called when a field's stored value changes.
    fn on_field_change(&mut self, e: &FieldChangeEvent) {
        _ = e;
    }

    /// Called at each swap phase.
    fn on_swap(&mut self, e: &SwapEvent) {
        _ = e;
    }

    /// Called when a dependency edge changes.
    fn on_edge(&mut self, e: &EdgeEvent) {
        _ = e;
    }

    /// Called when a source field fires.
    fn on_fire(&mut self, e: &FireEvent) {
        _ = e;
    }

    /// Called for each spatial repair step.
    fn on_repair(&mut self, e: &RepairEvent) {
        _ = e;
    }

    /// Called when a flush completes.
    fn on_flush(&mut self, e: &FlushEvent) {
        _ = e;
    }

    /// Called with a recoverable diagnostic.
    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional owned [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self::none()
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Removes and returns the installed sink.
    ///
    /// Always `None` when the `trace` feature is off.
    #[inline]
    pub fn take(&mut self) -> Option<Box<dyn TraceSink>> {
        #[cfg(feature = "trace")]
        {
            self.sink.take()
        }
        #[cfg(not(feature = "trace"))]
        {
            None
        }
    }

    /// Emits an [`OutlineEvent`].
    #[inline]
    pub fn outline(&mut self, e: &OutlineEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_outline(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FieldChangeEvent`].
    #[inline]
    pub fn field_change(&mut self, e: &FieldChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_field_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SwapEvent`].
    #[inline]
    pub fn swap(&mut self, e: &SwapEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_swap(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`EdgeEvent`].
    #[inline]
    pub fn edge(&mut self, e: &EdgeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_edge(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FireEvent`].
    #[inline]
    pub fn fire(&mut self, e: &FireEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_fire(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RepairEvent`].
    #[inline]
    pub fn repair(&mut self, e: &RepairEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_repair(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FlushEvent`].
    #[inline]
    pub fn flush(&mut self, e: &FlushEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_flush(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DiagnosticEvent`].
    #[inline]
    pub fn diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_diagnostic(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_diagnostic(&DiagnosticEvent {
            outline: None,
            document: None,
            kind: DiagnosticKind::UnknownBehavior,
            detail: "nope",
        });
        sink.on_flush(&FlushEvent {
            passes: 1,
            reflowed: 0,
            damage: 0,
        });
    }

    #[test]
    fn tracer_none_is_silent() {
        let mut t = Tracer::none();
        t.flush(&FlushEvent {
            passes: 0,
            reflowed: 0,
            damage: 0,
        });
        assert!(t.take().is_none());
    }

    #[test]
    fn repair_event_copies_the_step() {
        let step = RepairStep {
            node: SpatialId { idx: 3, generation: 1 },
            adjust: Vec2::new(2.0, 0.0),
            grew: true,
        };
        let e = RepairEvent::from(&step);
        assert_eq!(e.node, step.node);
        assert_eq!(e.adjust, Vec2::new(2.0, 0.0));
        assert!(e.grew);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::rc::Rc;
        use alloc::vec::Vec;
        use core::cell::RefCell;

        struct Recorder(Rc<RefCell<Vec<DiagnosticKind>>>);
        impl TraceSink for Recorder {
            fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
                self.0.borrow_mut().push(e.kind);
            }
        }

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut t = Tracer::new(Box::new(Recorder(Rc::clone(&seen))));
        t.diagnostic(&DiagnosticEvent {
            outline: None,
            document: None,
            kind: DiagnosticKind::MissingTemplate,
            detail: "list.item",
        });
        assert_eq!(*seen.borrow(), [DiagnosticKind::MissingTemplate]);
        assert!(t.take().is_some());
        assert!(t.take().is_none());
    }
}
