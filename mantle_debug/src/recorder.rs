// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends every event, as an
//! owned [`RecordedEvent`], to a buffer it shares with a [`Recording`]
//! handle. The document takes ownership of its sink, so the handle is how
//! the recorded events are read back while the document is still alive.

use std::cell::RefCell;
use std::rc::Rc;

use mantle_core::document::{DocId, OutlineId};
use mantle_core::trace::{
    DiagnosticEvent, DiagnosticKind, EdgeEvent, FieldChangeEvent, FireEvent, FlushEvent,
    OutlineEvent, RepairEvent, SwapEvent, TraceSink,
};

/// A trace event with owned data.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// An outline was created or destroyed.
    Outline(OutlineEvent),
    /// A field's stored value changed.
    FieldChange(FieldChangeEvent),
    /// A swap entered a phase.
    Swap(SwapEvent),
    /// A dependency edge was linked, shared or released.
    Edge(EdgeEvent),
    /// A source field fired.
    Fire(FireEvent),
    /// The spatial tree repaired one level.
    Repair(RepairEvent),
    /// A flush completed.
    Flush(FlushEvent),
    /// A recoverable diagnostic.
    Diagnostic {
        /// The outline concerned, if any.
        outline: Option<OutlineId>,
        /// The document concerned, if any.
        document: Option<DocId>,
        /// The class of problem.
        kind: DiagnosticKind,
        /// The offending name, key or selector.
        detail: String,
    },
}

impl RecordedEvent {
    /// Short lowercase name of the event's variant.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Outline(_) => "outline",
            Self::FieldChange(_) => "field_change",
            Self::Swap(_) => "swap",
            Self::Edge(_) => "edge",
            Self::Fire(_) => "fire",
            Self::Repair(_) => "repair",
            Self::Flush(_) => "flush",
            Self::Diagnostic { .. } => "diagnostic",
        }
    }
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

/// A shared view of the events a [`RecorderSink`] has captured.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl Recording {
    /// Returns a copy of the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Removes and returns the recorded events.
    pub fn take(&self) -> Vec<RecordedEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// The recorded diagnostics as `(kind, detail)` pairs.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<(DiagnosticKind, String)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::Diagnostic { kind, detail, .. } => Some((*kind, detail.clone())),
                _ => None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that records events for later inspection or export.
#[derive(Debug, Default)]
pub struct RecorderSink {
    recording: Recording,
}

impl RecorderSink {
    /// Creates a sink and the handle its events can be read through.
    #[must_use]
    pub fn new() -> (Self, Recording) {
        let sink = Self::default();
        let recording = sink.recording.clone();
        (sink, recording)
    }

    fn push(&self, event: RecordedEvent) {
        self.recording.events.borrow_mut().push(event);
    }
}

impl TraceSink for RecorderSink {
    fn on_outline(&mut self, e: &OutlineEvent) {
        self.push(RecordedEvent::Outline(*e));
    }

    fn on_field_change(&mut self, e: &FieldChangeEvent) {
        self.push(RecordedEvent::FieldChange(*e));
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        self.push(RecordedEvent::Swap(*e));
    }

    fn on_edge(&mut self, e: &EdgeEvent) {
        self.push(RecordedEvent::Edge(*e));
    }

    fn on_fire(&mut self, e: &FireEvent) {
        self.push(RecordedEvent::Fire(*e));
    }

    fn on_repair(&mut self, e: &RepairEvent) {
        self.push(RecordedEvent::Repair(*e));
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.push(RecordedEvent::Flush(*e));
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        self.push(RecordedEvent::Diagnostic {
            outline: e.outline,
            document: e.document,
            kind: e.kind,
            detail: e.detail.to_owned(),
        });
    }
}
