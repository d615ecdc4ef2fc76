// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot storage shared by the outline, document and edge stores.

use alloc::vec::Vec;

/// Sentinel value indicating "no node" in index fields.
pub(crate) const INVALID: u32 = u32::MAX;

/// Declares a generational handle type.
///
/// The generated type carries a slot index and the generation the slot had
/// when the handle was issued, so a handle kept past its node's destruction
/// is detected rather than silently aliasing the slot's next occupant.
macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            pub(crate) idx: u32,
            pub(crate) generation: u32,
        }

        impl $name {
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

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!(stringify!($name), "({}@gen{})"), self.idx, self.generation)
            }
        }
    };
}

pub(crate) use handle;

/// Slot storage with a free list and per-slot generation counters.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Stores `value` and returns its `(index, generation)` pair.
    pub(crate) fn insert(&mut self, value: T) -> (u32, u32) {
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize] = Some(value);
            (idx, self.generation[idx as usize])
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(INVALID);
            assert!(idx != INVALID, "arena exhausted");
            self.slots.push(Some(value));
            self.generation.push(0);
            (idx, 0)
        }
    }

    /// Removes the value in slot `idx` if `generation` still matches.
    pub(crate) fn remove(&mut self, idx: u32, generation: u32) -> Option<T> {
        if !self.contains(idx, generation) {
            return None;
        }
        let value = self.slots[idx as usize].take();
        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] = self.generation[idx as usize].wrapping_add(1);
        self.free_list.push(idx);
        value
    }

    pub(crate) fn contains(&self, idx: u32, generation: u32) -> bool {
        self.generation.get(idx as usize) == Some(&generation)
            && self.slots[idx as usize].is_some()
    }

    pub(crate) fn get(&self, idx: u32, generation: u32) -> Option<&T> {
        if self.contains(idx, generation) {
            self.slots[idx as usize].as_ref()
        } else {
            None
        }
    }

    pub(crate) fn get_mut(&mut self, idx: u32, generation: u32) -> Option<&mut T> {
        if self.contains(idx, generation) {
            self.slots[idx as usize].as_mut()
        } else {
            None
        }
    }

    /// Returns the current generation of a live slot.
    pub(crate) fn live_generation(&self, idx: u32) -> Option<u32> {
        match self.slots.get(idx as usize) {
            Some(Some(_)) => Some(self.generation[idx as usize]),
            _ => None,
        }
    }

    /// Number of live values.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Iterates `(index, generation, value)` over live slots in index order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            let value = slot.as_ref()?;
            #[expect(
                clippy::cast_possible_truncation,
                reason = "insert never hands out indices beyond u32"
            )]
            let idx = idx as u32;
            Some((idx, self.generation[idx as usize], value))
        })
    }
}
