// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Field ids
//! are printed by their standard name where they have one.

use std::io::Write;

use mantle_core::event::EventSource;
use mantle_core::field::{FieldId, standard_name};
use mantle_core::trace::{
    DiagnosticEvent, EdgeEvent, FieldChangeEvent, FireEvent, FlushEvent, OutlineEvent,
    OutlineEventKind, RepairEvent, SwapEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    /// Whether to print edge bookkeeping and fires, which dominate output.
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            verbose: false,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }

    /// Also prints edge and fire events.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Formats a field id by standard name, falling back to the number.
pub(crate) fn field_label(field: FieldId) -> String {
    match standard_name(field) {
        Some(name) => name.to_owned(),
        None => format!("#{}", field.0),
    }
}

pub(crate) fn source_label(source: EventSource) -> String {
    match source {
        EventSource::Outline(o) => format!("outline {}", o.index()),
        EventSource::Data(d) => format!("data {}", d.0),
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_outline(&mut self, e: &OutlineEvent) {
        let verb = match e.kind {
            OutlineEventKind::Created => "created",
            OutlineEventKind::Destroyed => "destroyed",
        };
        let _ = writeln!(
            self.writer,
            "[outline] {verb} {} parent={}",
            e.outline.index(),
            e.parent.map_or_else(|| "-".to_owned(), |p| p.index().to_string()),
        );
    }

    fn on_field_change(&mut self, e: &FieldChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[field] outline={} {} pass={}",
            e.outline.index(),
            field_label(e.field),
            e.pass,
        );
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        let _ = writeln!(
            self.writer,
            "[swap] outline={} {:?} -> {:?}",
            e.outline.index(),
            e.target,
            e.phase,
        );
    }

    fn on_edge(&mut self, e: &EdgeEvent) {
        if !self.verbose {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[edge] {:?} {} #{} -> outline={} {}",
            e.kind,
            source_label(e.tuple.source),
            e.tuple.source_field,
            e.tuple.dest.index(),
            field_label(e.tuple.dest_field),
        );
    }

    fn on_fire(&mut self, e: &FireEvent) {
        if !self.verbose {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[fire] {} #{} deliveries={} pass={}",
            source_label(e.source),
            e.field,
            e.deliveries,
            e.pass,
        );
    }

    fn on_repair(&mut self, e: &RepairEvent) {
        let _ = writeln!(
            self.writer,
            "[repair] node={} adjust=({:.1}, {:.1}) grew={}",
            e.node.index(),
            e.adjust.x,
            e.adjust.y,
            e.grew,
        );
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        let _ = writeln!(
            self.writer,
            "[flush] passes={} reflowed={} damage={}",
            e.passes, e.reflowed, e.damage,
        );
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[diag] {:?} outline={} detail={:?}",
            e.kind,
            e.outline
                .map_or_else(|| "-".to_owned(), |o| o.index().to_string()),
            e.detail,
        );
    }
}
