// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Mantle uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! defer geometry work until a [`Document::flush`](crate::document::Document::flush).
//! Each channel represents an independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`RELAYOUT`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) over dependency edges
//!   from each attached document to its parent document. When a document's
//!   area changes, every descendant's area must be re-resolved against it.
//!
//! - **Local-only**: [`REDRAW`] is marked on spatial nodes whose area or
//!   extent changed. Only the marked node's bounds are reported as damage.
//!
//! Field reevaluation does not go through these channels: it is driven
//! synchronously by the event registry when a source fires.

use understory_dirty::Channel;

/// A document's resolved area may be stale and must be recomputed against
/// its parent.
pub const RELAYOUT: Channel = Channel::new(0);

/// A spatial node's bounds changed and must be repainted.
pub const REDRAW: Channel = Channel::new(1);
