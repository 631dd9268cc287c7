//! Generational slot storage for document nodes.

use std::fmt;

use crate::types::Payload;

/// A stable handle to a document node.
///
/// It combines a slot index with a generation count. A node keeps its handle
/// for as long as it exists, no matter how its siblings or ancestors are
/// edited, and across undo and redo. When a node is finally discarded its
/// slot's generation is incremented, so an old `NodeId` can never resolve to
/// whatever node later reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// The slot index of the node.
    pub fn index(self) -> u32 {
        self.index
    }

    /// The generation of the slot when this handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    live: bool,
    payload: Payload,
}

/// Owner of every node of a document, attached or detached.
///
/// Detached nodes (removed children, replaced container contents) stay in
/// the store while the undo history may still restore them. [`sweep`]
/// reclaims whatever is no longer reachable.
///
/// [`sweep`]: NodeStore::sweep
#[derive(Debug, Default)]
pub(crate) struct NodeStore {
    slots: Vec<Slot>,
    /// Slot indices available for reuse.
    free: Vec<u32>,
}

impl NodeStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocates a new or recycled slot holding `payload`.
    pub(crate) fn alloc(&mut self, payload: Payload) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.live = true;
            slot.payload = payload;
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                live: true,
                payload,
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Whether `id` refers to a node that still exists.
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.live && slot.generation == id.generation)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Payload> {
        if self.contains(id) {
            Some(&mut self.slots[id.index as usize].payload)
        } else {
            None
        }
    }

    /// Payload of a node the caller has already validated with [`contains`].
    ///
    /// [`contains`]: NodeStore::contains
    pub(crate) fn payload(&self, id: NodeId) -> &Payload {
        debug_assert!(self.contains(id), "unchecked access to stale node {id}");
        &self.slots[id.index as usize].payload
    }

    /// Mutable counterpart of [`payload`](NodeStore::payload).
    pub(crate) fn payload_mut(&mut self, id: NodeId) -> &mut Payload {
        debug_assert!(self.contains(id), "unchecked access to stale node {id}");
        &mut self.slots[id.index as usize].payload
    }

    /// Number of nodes currently alive, attached or not.
    pub(crate) fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Frees every node not reachable from `roots` and returns how many were
    /// freed. Roots that are already stale are ignored.
    pub(crate) fn sweep(&mut self, roots: impl IntoIterator<Item = NodeId>) -> usize {
        let mut marked = vec![false; self.slots.len()];
        let mut stack: Vec<NodeId> = roots.into_iter().collect();

        while let Some(id) = stack.pop() {
            if !self.contains(id) || marked[id.index as usize] {
                continue;
            }
            marked[id.index as usize] = true;
            stack.extend(self.payload(id).children());
        }

        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.live && !marked[index] {
                slot.live = false;
                slot.generation = slot.generation.wrapping_add(1);
                slot.payload = Payload::Null;
                self.free.push(index as u32);
                freed += 1;
            }
        }
        freed
    }
}
