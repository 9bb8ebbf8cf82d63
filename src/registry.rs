//! # Ordered Registry
//!
//! A doubly-linked sequence of owned payloads, stored in a fixed-capacity
//! arena instead of individually allocated nodes.
//!
//! ## Layout
//!
//! ```text
//!   entries: [ slot 0 | slot 1 | slot 2 | slot 3 | ... ]   (heapless::Vec, capacity N)
//!
//!   head ──► slot 2 ◄──► slot 0 ◄──► slot 3 ◄── tail      (links are slot indices)
//!   free ──► slot 1 ──► ...                               (vacant slots, singly linked)
//! ```
//!
//! Nodes are addressed by [`NodeId`]: a slot index plus the slot's generation.
//! Removing a node bumps its slot generation before the slot is reused, so an
//! id or [`Cursor`] that outlived its node resolves to nothing instead of
//! aliasing a newer payload.
//!
//! Insertion order is the iteration order. Any number of cursors may walk the
//! registry concurrently; each stores only the id of the next node it will
//! visit.

use heapless::Vec;

/// Stable identifier of a registry node.
///
/// The generation wraps after 2^32 removals from the same slot; only an id
/// held across that many reuses can alias a newer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeId {
    index: u16,
    generation: u32,
}

impl NodeId {
    /// Arena slot of the node.
    #[inline]
    pub const fn index(&self) -> u16 {
        self.index
    }

    /// Generation of the slot at the time the node was inserted.
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// External iteration position over a [`Registry`].
///
/// Obtained from [`Registry::cursor`] and moved with [`Registry::advance`].
/// Cursors are plain values: advancing one never affects another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    next: Option<NodeId>,
}

impl Cursor {
    /// True once the cursor has walked past the last node.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}

struct Node<T> {
    prev: Option<u16>,
    next: Option<u16>,
    value: T,
}

enum Slot<T> {
    Occupied(Node<T>),
    Vacant { next_free: Option<u16> },
}

struct Entry<T> {
    generation: u32,
    slot: Slot<T>,
}

/// Ordered container of up to `N` payloads.
pub struct Registry<T, const N: usize> {
    entries: Vec<Entry<T>, N>,
    free: Option<u16>,
    head: Option<u16>,
    tail: Option<u16>,
}

impl<T, const N: usize> Registry<T, N> {
    const INDEX_FITS: () = assert!(N <= u16::MAX as usize, "registry capacity exceeds u16 slots");

    /// Create an empty registry.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::INDEX_FITS;
        Self {
            entries: Vec::new(),
            free: None,
            head: None,
            tail: None,
        }
    }

    /// Maximum number of live nodes.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Append `value` at the tail.
    ///
    /// Reuses a vacant slot when one exists. When the arena is full the value
    /// is handed back and the registry is left untouched.
    pub fn add(&mut self, value: T) -> Result<NodeId, T> {
        let index = match self.free {
            Some(index) => index,
            None => {
                let index = self.entries.len() as u16;
                let vacant = Entry {
                    generation: 0,
                    slot: Slot::Vacant { next_free: None },
                };
                if self.entries.push(vacant).is_err() {
                    return Err(value);
                }
                index
            }
        };

        let tail = self.tail;
        let Some(entry) = self.entries.get_mut(index as usize) else {
            return Err(value);
        };
        if let Slot::Vacant { next_free } = entry.slot {
            self.free = next_free;
        }
        entry.slot = Slot::Occupied(Node {
            prev: tail,
            next: None,
            value,
        });

        match self.tail {
            Some(tail) => {
                if let Some(tail_node) = self.node_at_mut(tail) {
                    tail_node.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        self.tail = Some(index);

        Ok(self.id_at(index))
    }

    /// Remove the node at 0-based `position` and return its payload.
    pub fn remove(&mut self, position: usize) -> Option<T> {
        let index = self.slots().nth(position)?;
        self.unlink(index)
    }

    /// Remove the node identified by `id` and return its payload.
    pub fn remove_node(&mut self, id: NodeId) -> Option<T> {
        self.resolve(id)?;
        self.unlink(id.index)
    }

    /// Payload at 0-based `position`.
    pub fn get(&self, position: usize) -> Option<&T> {
        let index = self.slots().nth(position)?;
        self.node_at(index).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut T> {
        let index = self.slots().nth(position)?;
        self.node_at_mut(index).map(|node| &mut node.value)
    }

    pub fn first(&self) -> Option<&T> {
        self.head
            .and_then(|index| self.node_at(index))
            .map(|node| &node.value)
    }

    pub fn last(&self) -> Option<&T> {
        self.tail
            .and_then(|index| self.node_at(index))
            .map(|node| &node.value)
    }

    /// Payload of a live node.
    pub fn get_node(&self, id: NodeId) -> Option<&T> {
        self.resolve(id).map(|node| &node.value)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        match &mut entry.slot {
            Slot::Occupied(node) => Some(&mut node.value),
            Slot::Vacant { .. } => None,
        }
    }

    /// True if `id` refers to a live node.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_some()
    }

    /// First payload, in registry order, for which `predicate` holds.
    pub fn find<P>(&self, mut predicate: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().find(|value| predicate(value))
    }

    /// Id of the first node whose payload satisfies `predicate`.
    pub fn find_id<P>(&self, mut predicate: P) -> Option<NodeId>
    where
        P: FnMut(&T) -> bool,
    {
        self.slots()
            .find(|&index| self.node_at(index).is_some_and(|node| predicate(&node.value)))
            .map(|index| self.id_at(index))
    }

    /// 0-based position of a live node.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.resolve(id)?;
        self.slots().position(|index| index == id.index)
    }

    /// Number of live nodes, counted by walking the chain.
    pub fn count(&self) -> usize {
        self.slots().count()
    }

    /// New cursor positioned at the head.
    pub fn cursor(&self) -> Cursor {
        Cursor {
            next: self.head.map(|index| self.id_at(index)),
        }
    }

    /// Return the id under `cursor` and move it to the following node.
    ///
    /// Returns `None` and exhausts the cursor at the end of the chain or when
    /// the node under the cursor has been removed since it was reached.
    pub fn advance_id(&self, cursor: &mut Cursor) -> Option<NodeId> {
        let id = cursor.next?;
        match self.resolve(id) {
            Some(node) => {
                cursor.next = node.next.map(|index| self.id_at(index));
                Some(id)
            }
            None => {
                cursor.next = None;
                None
            }
        }
    }

    /// Return the payload under `cursor` and move it to the following node.
    pub fn advance(&self, cursor: &mut Cursor) -> Option<&T> {
        let id = self.advance_id(cursor)?;
        self.get_node(id)
    }

    /// Iterate payloads in registry order.
    pub fn iter(&self) -> Iter<'_, T, N> {
        Iter {
            registry: self,
            cursor: self.cursor(),
        }
    }

    fn slots(&self) -> impl Iterator<Item = u16> + '_ {
        core::iter::successors(self.head, move |&index| {
            self.node_at(index).and_then(|node| node.next)
        })
    }

    fn resolve(&self, id: NodeId) -> Option<&Node<T>> {
        let entry = self.entries.get(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        match &entry.slot {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant { .. } => None,
        }
    }

    fn node_at(&self, index: u16) -> Option<&Node<T>> {
        match self.entries.get(index as usize).map(|entry| &entry.slot) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    fn node_at_mut(&mut self, index: u16) -> Option<&mut Node<T>> {
        match self.entries.get_mut(index as usize).map(|entry| &mut entry.slot) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    fn id_at(&self, index: u16) -> NodeId {
        let generation = self
            .entries
            .get(index as usize)
            .map_or(0, |entry| entry.generation);
        NodeId { index, generation }
    }

    fn unlink(&mut self, index: u16) -> Option<T> {
        let free = self.free;
        let entry = self.entries.get_mut(index as usize)?;
        if !matches!(entry.slot, Slot::Occupied(_)) {
            return None;
        }
        let Slot::Occupied(node) =
            core::mem::replace(&mut entry.slot, Slot::Vacant { next_free: free })
        else {
            return None;
        };
        entry.generation = entry.generation.wrapping_add(1);
        self.free = Some(index);

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.node_at_mut(prev) {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next_node) = self.node_at_mut(next) {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        Some(node.value)
    }
}

impl<T, const N: usize> Default for Registry<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: core::fmt::Debug, const N: usize> core::fmt::Debug for Registry<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over a [`Registry`], built on a [`Cursor`].
pub struct Iter<'r, T, const N: usize> {
    registry: &'r Registry<T, N>,
    cursor: Cursor,
}

impl<'r, T, const N: usize> Iterator for Iter<'r, T, N> {
    type Item = &'r T;

    fn next(&mut self) -> Option<Self::Item> {
        self.registry.advance(&mut self.cursor)
    }
}

impl<'r, T, const N: usize> IntoIterator for &'r Registry<T, N> {
    type Item = &'r T;
    type IntoIter = Iter<'r, T, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
