// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial node identity.

use core::fmt;

/// A handle to a node in a [`SpatialTree`](super::SpatialTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a node is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpatialId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter, must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl SpatialId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SpatialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpatialId({}@gen{})", self.idx, self.generation)
    }
}
