//! Typed index arena.
//!
//! An [`Arena<T>`] is an append-only vector of `T`; allocation hands back an
//! [`Id<T>`] that stays valid for the life of the arena. Ids are 32-bit so
//! that graphs with many small nodes stay compact, and they are typed so an
//! id into the type arena cannot be used to index the function arena.
//!
//! Slots can be *reserved* ahead of their contents with [`Arena::reserve`]
//! and filled later with [`Arena::fill`]. Readers that reconstruct a graph
//! in which nodes refer forward to nodes not yet decoded use this to hand out
//! ids before the node itself exists.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A handle to a value stored in an [`Arena<T>`].
pub struct Id<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Creates an id from a raw slot index.
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Id {
            index,
            _marker: PhantomData,
        }
    }

    /// Returns the raw slot index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.index
    }

    /// Returns the slot index as a `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

// Manual impls: derives would demand `T: Clone` and friends.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Append-only storage addressed by [`Id`].
///
/// # Examples
///
/// ```
/// use pea_mem::Arena;
///
/// let mut arena = Arena::new();
/// let slot = arena.reserve();
/// let other = arena.alloc(7u32);
///
/// assert!(!arena.is_filled(slot));
/// arena.fill(slot, 3);
/// assert_eq!(arena[slot] + arena[other], 10);
/// ```
pub struct Arena<T> {
    slots: Vec<Option<T>>,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Arena { slots: Vec::new() }
    }

    /// Stores `value` and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if the arena already holds `u32::MAX` slots.
    pub fn alloc(&mut self, value: T) -> Id<T> {
        let id = self.next_id();
        self.slots.push(Some(value));
        id
    }

    /// Reserves a slot whose value will be provided later by [`Arena::fill`].
    ///
    /// Reading a reserved slot before it is filled panics.
    pub fn reserve(&mut self) -> Id<T> {
        let id = self.next_id();
        self.slots.push(None);
        id
    }

    /// Provides the value for a previously reserved slot.
    pub fn fill(&mut self, id: Id<T>, value: T) {
        debug_assert!(self.slots[id.index()].is_none(), "slot {id:?} filled twice");
        self.slots[id.index()] = Some(value);
    }

    /// Returns `true` once the slot holds a value.
    #[must_use]
    pub fn is_filled(&self, id: Id<T>) -> bool {
        self.slots.get(id.index()).is_some_and(Option::is_some)
    }

    /// Returns the value at `id`, or `None` for a reserved or foreign id.
    #[must_use]
    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable counterpart of [`Arena::get`].
    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Number of slots, filled or reserved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drops every slot from `len` on, filled or reserved. Ids at or past
    /// `len` become foreign.
    pub fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
    }

    /// Iterates over the filled slots in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref().map(|value| (Id::from_raw(i as u32), value))
        })
    }

    fn next_id(&self) -> Id<T> {
        let index = u32::try_from(self.slots.len()).expect("arena index space exhausted");
        Id::from_raw(index)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T> Index<Id<T>> for Arena<T> {
    type Output = T;

    fn index(&self, id: Id<T>) -> &T {
        match self.slots[id.index()] {
            Some(ref value) => value,
            None => panic!("read of reserved slot {id:?}"),
        }
    }
}

impl<T> IndexMut<Id<T>> for Arena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        match self.slots[id.index()] {
            Some(ref mut value) => value,
            None => panic!("write to reserved slot {id:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_index() {
        let mut arena = Arena::new();
        let a = arena.alloc(String::from("a"));
        let b = arena.alloc(String::from("b"));

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena[a], "a");

        arena[b].push('!');
        assert_eq!(arena[b], "b!");
    }

    #[test]
    fn test_reserve_then_fill() {
        let mut arena = Arena::new();
        let slot = arena.reserve();
        let after = arena.alloc(2);

        assert!(!arena.is_filled(slot));
        assert!(arena.get(slot).is_none());
        assert_eq!(arena.iter().count(), 1);

        arena.fill(slot, 1);
        assert!(arena.is_filled(slot));
        assert_eq!(arena[slot], 1);
        assert_eq!(arena[after], 2);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_foreign_id_is_none() {
        let arena: Arena<u8> = Arena::new();
        assert!(arena.get(Id::from_raw(3)).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_ids_hash_and_order() {
        use std::collections::HashSet;

        let mut arena = Arena::new();
        let ids: Vec<Id<u8>> = (0..4).map(|i| arena.alloc(i)).collect();
        let set: HashSet<_> = ids.iter().copied().collect();

        assert_eq!(set.len(), 4);
        assert!(ids[0] < ids[3]);
        assert_eq!(format!("{:?}", ids[2]), "#2");
    }

    #[test]
    fn test_truncate_forgets_later_slots() {
        let mut arena = Arena::new();
        let kept = arena.alloc(1u8);
        let mark = arena.len();
        let reserved = arena.reserve();
        let filled = arena.alloc(3);

        arena.truncate(mark);
        assert_eq!(arena.len(), 1);
        assert!(arena.get(reserved).is_none());
        assert!(arena.get(filled).is_none());
        assert_eq!(arena[kept], 1);
        assert_eq!(arena.alloc(4), reserved);
    }

    #[test]
    #[should_panic(expected = "read of reserved slot")]
    fn test_reserved_read_panics() {
        let mut arena: Arena<u8> = Arena::new();
        let slot = arena.reserve();
        let _ = arena[slot];
    }
}
