// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads events captured by a
//! [`RecorderSink`](super::recorder::RecorderSink) and writes
//! [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Documents carry no clock, so each event's timestamp is its position in
//! the recording, in microseconds. Outline-scoped events use the outline's
//! slot index as the thread id, which puts each outline on its own track.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::collections::HashMap;
use std::io::{self, Write};

use serde_json::{Value, json};

use mantle_core::document::SwapPhase;

use crate::pretty::{field_label, source_label};
use crate::recorder::RecordedEvent;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Swaps become duration slices: each phase begins a slice named after it
/// and the return to [`SwapPhase::Idle`] closes the last one.
pub fn export(recorded: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut open_swaps: HashMap<u32, SwapPhase> = HashMap::new();

    for (ts, recorded) in recorded.iter().enumerate() {
        match recorded {
            RecordedEvent::Outline(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.kind),
                    "cat": "Outline",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.outline.index(),
                    "s": "t",
                    "args": {
                        "parent": e.parent.map(|p| p.index()),
                    }
                }));
            }
            RecordedEvent::FieldChange(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": field_label(e.field),
                    "cat": "Field",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.outline.index(),
                    "s": "t",
                    "args": {
                        "pass": e.pass,
                    }
                }));
            }
            RecordedEvent::Swap(e) => {
                let tid = e.outline.index();
                if let Some(open) = open_swaps.remove(&tid) {
                    events.push(json!({
                        "ph": "E",
                        "name": format!("{open:?}"),
                        "cat": "Swap",
                        "ts": ts,
                        "pid": 0,
                        "tid": tid,
                    }));
                }
                if e.phase != SwapPhase::Idle {
                    open_swaps.insert(tid, e.phase);
                    events.push(json!({
                        "ph": "B",
                        "name": format!("{:?}", e.phase),
                        "cat": "Swap",
                        "ts": ts,
                        "pid": 0,
                        "tid": tid,
                        "args": {
                            "target": format!("{:?}", e.target),
                        }
                    }));
                }
            }
            RecordedEvent::Edge(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.kind),
                    "cat": "Edge",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.tuple.dest.index(),
                    "s": "t",
                    "args": {
                        "edge": e.edge.index(),
                        "source": source_label(e.tuple.source),
                        "source_field": e.tuple.source_field,
                        "dest_field": field_label(e.tuple.dest_field),
                    }
                }));
            }
            RecordedEvent::Fire(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Fire",
                    "cat": "Edge",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "source": source_label(e.source),
                        "field": e.field,
                        "deliveries": e.deliveries,
                        "pass": e.pass,
                    }
                }));
            }
            RecordedEvent::Repair(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Repair",
                    "cat": "Spatial",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "node": e.node.index(),
                        "adjust": [e.adjust.x, e.adjust.y],
                        "grew": e.grew,
                    }
                }));
            }
            RecordedEvent::Flush(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Flush",
                    "cat": "Layout",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "passes": e.passes,
                        "reflowed": e.reflowed,
                        "damage": e.damage,
                    }
                }));
            }
            RecordedEvent::Diagnostic {
                outline,
                kind,
                detail,
                ..
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{kind:?}"),
                    "cat": "Diagnostic",
                    "ts": ts,
                    "pid": 0,
                    "tid": outline.map_or(0, |o| o.index()),
                    "s": "t",
                    "args": {
                        "detail": detail,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
