// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deduplicated dependency edges between change sources and the fields that
//! read them.
//!
//! An edge is identified by its [`EventTuple`]: a source (an outline or a
//! data object), the source field that changes, the destination outline and
//! the destination field to re-evaluate. Registering the same tuple twice
//! shares one edge and bumps its reference count; the edge is unlinked when
//! the count returns to zero or when either endpoint is destroyed.
//!
//! Each edge sits on two intrusive lists: the per-`(source, field)` list that
//! [`fire`](DependencyRegistry::fire) walks, and the per-destination list
//! used to release everything an outline listens to. New edges are
//! prepended, so deliveries run most-recently-registered first.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::arena::{Arena, INVALID, handle};
use crate::data::DataRef;
use crate::document::OutlineId;
use crate::field::FieldId;

handle! {
    /// A handle to a live dependency edge.
    EventId
}

/// Something whose fields can change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventSource {
    /// An outline's standard or behavior fields.
    Outline(OutlineId),
    /// A data-graph object's named fields.
    Data(DataRef),
}

/// The identity of a dependency edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventTuple {
    /// Where the change happens.
    pub source: EventSource,
    /// Which field of the source changes. Outline sources use [`FieldId`]
    /// values; data sources use interned field-name keys.
    pub source_field: u32,
    /// The outline that reads the source field.
    pub dest: OutlineId,
    /// The destination field to re-evaluate.
    pub dest_field: FieldId,
}

/// Outcome of [`DependencyRegistry::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// A new edge was linked.
    New(EventId),
    /// An identical edge existed; its reference count was incremented.
    Shared(EventId),
}

impl Registration {
    /// The edge handle, new or shared.
    #[must_use]
    pub const fn id(self) -> EventId {
        match self {
            Self::New(id) | Self::Shared(id) => id,
        }
    }
}

/// One pending notification produced by [`DependencyRegistry::fire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// The edge being notified.
    pub edge: EventId,
    /// The edge's identity.
    pub tuple: EventTuple,
}

struct Edge<L> {
    tuple: EventTuple,
    count: u32,
    listener: L,
    // Per-(source, field) list.
    prev: u32,
    next: u32,
    // Per-destination list.
    dest_prev: u32,
    dest_next: u32,
}

/// Registry of dependency edges, each carrying a listener of type `L`.
pub struct DependencyRegistry<L> {
    edges: Arena<Edge<L>>,
    dedup: BTreeMap<EventTuple, EventId>,
    heads: BTreeMap<(EventSource, u32), u32>,
    dest_heads: BTreeMap<OutlineId, u32>,
}

impl<L> core::fmt::Debug for DependencyRegistry<L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DependencyRegistry")
            .field("edges", &self.edges.len())
            .field("dedup", &self.dedup)
            .finish_non_exhaustive()
    }
}

impl<L: Copy> Default for DependencyRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Copy> DependencyRegistry<L> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            edges: Arena::new(),
            dedup: BTreeMap::new(),
            heads: BTreeMap::new(),
            dest_heads: BTreeMap::new(),
        }
    }

    /// Links an edge for `tuple`, or shares the existing one.
    ///
    /// A shared edge keeps its original listener.
    pub fn register(&mut self, tuple: EventTuple, listener: L) -> Registration {
        if let Some(&id) = self.dedup.get(&tuple) {
            if let Some(edge) = self.edges.get_mut(id.idx, id.generation) {
                edge.count += 1;
                return Registration::Shared(id);
            }
        }

        let key = (tuple.source, tuple.source_field);
        let next = self.heads.get(&key).copied().unwrap_or(INVALID);
        let dest_next = self.dest_heads.get(&tuple.dest).copied().unwrap_or(INVALID);
        let (idx, generation) = self.edges.insert(Edge {
            tuple,
            count: 1,
            listener,
            prev: INVALID,
            next,
            dest_prev: INVALID,
            dest_next,
        });
        if next != INVALID {
            self.edge_at_mut(next).prev = idx;
        }
        if dest_next != INVALID {
            self.edge_at_mut(dest_next).dest_prev = idx;
        }
        self.heads.insert(key, idx);
        self.dest_heads.insert(tuple.dest, idx);

        let id = EventId { idx, generation };
        self.dedup.insert(tuple, id);
        Registration::New(id)
    }

    /// Drops one reference to an edge.
    ///
    /// Returns `true` if this was the last reference and the edge was
    /// unlinked. Releasing a stale handle does nothing and returns `false`.
    pub fn release(&mut self, id: EventId) -> bool {
        let Some(edge) = self.edges.get_mut(id.idx, id.generation) else {
            return false;
        };
        edge.count -= 1;
        if edge.count > 0 {
            return false;
        }
        self.unlink(id);
        true
    }

    /// Unlinks every edge whose destination is `dest`, regardless of count.
    ///
    /// Returns the number of edges removed.
    pub fn release_all_for_dest(&mut self, dest: OutlineId) -> usize {
        let mut removed = 0;
        while let Some(&idx) = self.dest_heads.get(&dest) {
            let Some(generation) = self.edges.live_generation(idx) else {
                break;
            };
            self.unlink(EventId { idx, generation });
            removed += 1;
        }
        removed
    }

    /// Unlinks every edge whose source is `source`, regardless of count.
    ///
    /// Returns the number of edges removed.
    pub fn release_all_for_source(&mut self, source: EventSource) -> usize {
        let ids: Vec<EventId> = self
            .dedup
            .range(Self::source_range(source))
            .map(|(_, id)| *id)
            .collect();
        for id in &ids {
            self.unlink(*id);
        }
        ids.len()
    }

    /// Collects the edges listening to `(source, field)`, most recent first.
    ///
    /// The returned deliveries are a snapshot: listeners may register or
    /// release edges while they run without disturbing the walk.
    #[must_use]
    pub fn fire(&self, source: EventSource, field: u32) -> Vec<(Delivery, L)> {
        let mut out = Vec::new();
        let mut cur = self.heads.get(&(source, field)).copied().unwrap_or(INVALID);
        while cur != INVALID {
            let Some(generation) = self.edges.live_generation(cur) else {
                break;
            };
            let edge = self.edge_at(cur);
            out.push((
                Delivery {
                    edge: EventId {
                        idx: cur,
                        generation,
                    },
                    tuple: edge.tuple,
                },
                edge.listener,
            ));
            cur = edge.next;
        }
        out
    }

    /// Lists the source fields of `source` that have listeners.
    #[must_use]
    pub fn fields_of(&self, source: EventSource) -> Vec<u32> {
        let mut fields: Vec<u32> = self
            .heads
            .range((source, 0)..=(source, u32::MAX))
            .map(|(&(_, field), _)| field)
            .collect();
        fields.dedup();
        fields
    }

    /// Lists the edges whose destination is `dest`, most recent first.
    #[must_use]
    pub fn incoming(&self, dest: OutlineId) -> Vec<EventTuple> {
        let mut out = Vec::new();
        let mut cur = self.dest_heads.get(&dest).copied().unwrap_or(INVALID);
        while cur != INVALID {
            let edge = self.edge_at(cur);
            out.push(edge.tuple);
            cur = edge.dest_next;
        }
        out
    }

    /// Reference count of the edge for `tuple`, or zero if none exists.
    #[must_use]
    pub fn count(&self, tuple: &EventTuple) -> u32 {
        self.dedup
            .get(tuple)
            .and_then(|id| self.edges.get(id.idx, id.generation))
            .map_or(0, |edge| edge.count)
    }

    /// Returns whether `id` refers to a live edge.
    #[must_use]
    pub fn is_alive(&self, id: EventId) -> bool {
        self.edges.contains(id.idx, id.generation)
    }

    /// Number of live edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if no edges are linked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.len() == 0
    }

    // -- Internal helpers --

    fn source_range(source: EventSource) -> core::ops::RangeInclusive<EventTuple> {
        let lo = EventTuple {
            source,
            source_field: 0,
            dest: OutlineId {
                idx: 0,
                generation: 0,
            },
            dest_field: FieldId(0),
        };
        let hi = EventTuple {
            source,
            source_field: u32::MAX,
            dest: OutlineId {
                idx: u32::MAX,
                generation: u32::MAX,
            },
            dest_field: FieldId(u32::MAX),
        };
        lo..=hi
    }

    fn edge_at(&self, idx: u32) -> &Edge<L> {
        let generation = self.edges.live_generation(idx);
        match generation.and_then(|g| self.edges.get(idx, g)) {
            Some(edge) => edge,
            None => unreachable!("edge list links a free slot {idx}"),
        }
    }

    fn edge_at_mut(&mut self, idx: u32) -> &mut Edge<L> {
        let generation = self.edges.live_generation(idx);
        match generation.and_then(|g| self.edges.get_mut(idx, g)) {
            Some(edge) => edge,
            None => unreachable!("edge list links a free slot {idx}"),
        }
    }

    /// Removes an edge from both lists, the dedup table and the arena.
    fn unlink(&mut self, id: EventId) {
        let Some(edge) = self.edges.remove(id.idx, id.generation) else {
            return;
        };
        let key = (edge.tuple.source, edge.tuple.source_field);

        if edge.prev == INVALID {
            if edge.next == INVALID {
                self.heads.remove(&key);
            } else {
                self.heads.insert(key, edge.next);
            }
        } else {
            self.edge_at_mut(edge.prev).next = edge.next;
        }
        if edge.next != INVALID {
            self.edge_at_mut(edge.next).prev = edge.prev;
        }

        if edge.dest_prev == INVALID {
            if edge.dest_next == INVALID {
                self.dest_heads.remove(&edge.tuple.dest);
            } else {
                self.dest_heads.insert(edge.tuple.dest, edge.dest_next);
            }
        } else {
            self.edge_at_mut(edge.dest_prev).dest_next = edge.dest_next;
        }
        if edge.dest_next != INVALID {
            self.edge_at_mut(edge.dest_next).dest_prev = edge.dest_prev;
        }

        self.dedup.remove(&edge.tuple);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn outline(idx: u32) -> OutlineId {
        OutlineId { idx, generation: 0 }
    }

    fn tuple(source: EventSource, field: u32, dest: u32, dest_field: u32) -> EventTuple {
        EventTuple {
            source,
            source_field: field,
            dest: outline(dest),
            dest_field: FieldId(dest_field),
        }
    }

    #[test]
    fn duplicate_registration_shares_one_edge() {
        let mut reg = DependencyRegistry::<u8>::new();
        let t = tuple(EventSource::Data(DataRef(1)), 3, 7, 10);
        let first = reg.register(t, 0);
        let second = reg.register(t, 1);
        assert!(matches!(first, Registration::New(_)));
        assert_eq!(second, Registration::Shared(first.id()));
        assert_eq!(reg.count(&t), 2);
        assert_eq!(reg.len(), 1);

        // The original listener is kept.
        let fired = reg.fire(EventSource::Data(DataRef(1)), 3);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, 0);
    }

    #[test]
    fn balanced_release_leaves_no_trace() {
        let mut reg = DependencyRegistry::<()>::new();
        let src = EventSource::Data(DataRef(4));
        let t = tuple(src, 1, 2, 3);
        let id = reg.register(t, ()).id();
        reg.register(t, ());
        reg.register(t, ());

        assert!(!reg.release(id));
        assert!(!reg.release(id));
        assert!(reg.release(id));

        assert_eq!(reg.count(&t), 0);
        assert!(reg.is_empty());
        assert!(reg.fire(src, 1).is_empty());
        assert!(reg.incoming(outline(2)).is_empty());
        assert!(reg.fields_of(src).is_empty());
        assert!(!reg.release(id), "stale handle is ignored");
    }

    #[test]
    fn fire_walks_most_recent_first() {
        let mut reg = DependencyRegistry::<u32>::new();
        let src = EventSource::Outline(outline(0));
        for dest in 1..=3 {
            reg.register(tuple(src, 5, dest, 9), dest);
        }
        reg.register(tuple(src, 6, 4, 9), 4);

        let order: Vec<u32> = reg.fire(src, 5).iter().map(|(_, l)| *l).collect();
        assert_eq!(order, [3, 2, 1]);
        assert_eq!(reg.fields_of(src), [5, 6]);
    }

    #[test]
    fn releasing_the_middle_keeps_lists_intact() {
        let mut reg = DependencyRegistry::<u32>::new();
        let src = EventSource::Outline(outline(0));
        let ids: Vec<EventId> = (1..=3)
            .map(|dest| reg.register(tuple(src, 5, dest, 9), dest).id())
            .collect();
        assert!(reg.release(ids[1]));
        let order: Vec<u32> = reg.fire(src, 5).iter().map(|(_, l)| *l).collect();
        assert_eq!(order, [3, 1]);
    }

    #[test]
    fn destroying_an_endpoint_drops_all_its_edges() {
        let mut reg = DependencyRegistry::<()>::new();
        let data = EventSource::Data(DataRef(1));
        let owner = EventSource::Outline(outline(9));
        reg.register(tuple(data, 1, 5, 1), ());
        reg.register(tuple(data, 2, 5, 2), ());
        reg.register(tuple(data, 2, 5, 2), ());
        reg.register(tuple(owner, 1, 5, 3), ());
        reg.register(tuple(owner, 1, 6, 3), ());

        assert_eq!(reg.release_all_for_dest(outline(5)), 3);
        assert!(reg.incoming(outline(5)).is_empty());
        assert_eq!(reg.len(), 1);
        assert!(reg.fire(data, 2).is_empty());

        assert_eq!(reg.release_all_for_source(owner), 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn incoming_lists_by_destination() {
        let mut reg = DependencyRegistry::<()>::new();
        let a = tuple(EventSource::Data(DataRef(1)), 1, 5, 1);
        let b = tuple(EventSource::Outline(outline(2)), 4, 5, 2);
        reg.register(a, ());
        reg.register(b, ());
        assert_eq!(reg.incoming(outline(5)), [b, a]);
    }
}
