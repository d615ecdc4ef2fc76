// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, snapshots and Chrome trace export for mantle
//! diagnostics.
//!
//! This crate provides [`TraceSink`](mantle_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: in-memory recording, read back through a
//!   shared [`recorder::Recording`] handle.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   events.
//!
//! [`snapshot`] renders a document's outline and spatial trees as JSON.

pub mod chrome;
pub mod pretty;
pub mod recorder;
pub mod snapshot;
