// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outline and document identity.

use crate::arena::handle;

handle! {
    /// A handle to an outline: the instantiated form of one skin node.
    ///
    /// Contains both a slot index and a generation counter so that stale
    /// handles can be detected after the outline is destroyed and the slot is
    /// reused.
    OutlineId
}

handle! {
    /// A handle to the document bound to an outline.
    DocId
}
