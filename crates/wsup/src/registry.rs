//! Socket registry.
//!
//! Connections live in a slot arena owned by the server value. Slots are
//! recycled through a free list, and every recycle bumps the slot's
//! generation, so a [`SocketId`] held across a disconnect can never alias a
//! newer connection in the same slot: lookups with a stale id simply miss.
//!
//! Insertion order is tracked separately so iteration (broadcast, listing)
//! walks sockets oldest-first regardless of slot reuse.

use std::mem;

/// Stable handle to a registered socket.
///
/// Ids stay valid until the socket is removed and are safe to hold, copy,
/// and use afterwards; operations on a stale id fail cleanly instead of
/// touching whichever socket now occupies the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId {
    index: u32,
    generation: u32,
}

enum Slot<T> {
    Occupied { value: T, generation: u32 },
    Vacant { next_free: Option<u32>, generation: u32 },
}

pub(crate) struct Registry<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    /// Live ids in insertion order.
    order: Vec<SocketId>,
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            order: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, value: T) -> SocketId {
        self.insert_with(|_| value)
    }

    /// Insert a value built from the id it will live under, so the value can
    /// carry its own handle from birth.
    pub(crate) fn insert_with<F>(&mut self, build: F) -> SocketId
    where
        F: FnOnce(SocketId) -> T,
    {
        let id = match self.free_head {
            Some(index) => {
                let (next_free, generation) = match &self.slots[index as usize] {
                    Slot::Vacant {
                        next_free,
                        generation,
                    } => (*next_free, *generation),
                    Slot::Occupied { .. } => unreachable!("free list entry occupied"),
                };
                let id = SocketId { index, generation };
                self.slots[index as usize] = Slot::Occupied {
                    value: build(id),
                    generation,
                };
                self.free_head = next_free;
                id
            }
            None => {
                let id = SocketId {
                    index: self.slots.len() as u32,
                    generation: 0,
                };
                self.slots.push(Slot::Occupied {
                    value: build(id),
                    generation: 0,
                });
                id
            }
        };
        self.order.push(id);
        id
    }

    pub(crate) fn get(&self, id: SocketId) -> Option<&T> {
        match self.slots.get(id.index as usize) {
            Some(Slot::Occupied { value, generation }) if *generation == id.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, id: SocketId) -> Option<&mut T> {
        match self.slots.get_mut(id.index as usize) {
            Some(Slot::Occupied { value, generation }) if *generation == id.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Remove a socket, returning its value. The slot goes on the free list
    /// with a bumped generation, so `id` is dead from here on.
    pub(crate) fn remove(&mut self, id: SocketId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == id.generation => {
                let vacant = Slot::Vacant {
                    next_free: self.free_head,
                    generation: id.generation.wrapping_add(1),
                };
                let Slot::Occupied { value, .. } = mem::replace(slot, vacant) else {
                    unreachable!()
                };
                self.free_head = Some(id.index);
                self.order.retain(|live| *live != id);
                Some(value)
            }
            _ => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Live ids in insertion order, detached from the registry so the caller
    /// may mutate it while walking the list.
    pub(crate) fn snapshot(&self) -> Vec<SocketId> {
        self.order.clone()
    }
}
