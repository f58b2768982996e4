//! A LIFO of fixed-width, integer-keyed records that never gives memory back.
//!
//! The profiler keeps every open span, every aggregated measure and every leak count in one of
//! these. Records live in a backing vector of slots addressed by a 1-based index; index `0` is
//! a permanent sentinel, so a valid index is never `0` and `0` can mean "absent". Removing a
//! record only tombstones its slot (the key is set to `0`) and the slot is reused by the next
//! push at that position. Once a stack has grown to its high-water mark, pushing and popping
//! performs no allocation at all, which is what keeps profiling from provoking allocator
//! pauses in the code being measured.
//!
//! Two implementations share the [`RecordStack`] contract:
//! - [`PooledStack`], the plain one.
//! - [`StrictStack`], a validating view over the same storage that panics on contract
//!   violations. It is selected with the `strict` cargo feature through the [`Stack`] alias.

mod pooled;
mod strict;

pub use pooled::PooledStack;
pub use strict::StrictStack;

/// Key of a record. `0` marks a tombstoned slot.
pub type Key = u32;

/// The non-key part of a record. Fresh slots and keys created by [`RecordStack::grant`] start
/// with `Default::default()`, which must be the all-zero payload.
pub trait Payload: Copy + Default + 'static {
    /// Number of numeric fields carried next to the key.
    const FIELDS: usize;
}

/// One record: an immutable key and a mutable payload.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Slot<P> {
    key: Key,
    pub payload: P,
}

impl<P> Slot<P> {
    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub(crate) fn is_live(&self) -> bool {
        self.key != 0
    }
}

/// The stack contract shared by the plain and the strict implementations.
pub trait RecordStack<P: Payload>: Default {
    /// Writes a record into the slot above the current top and returns its index.
    fn push(&mut self, key: Key, payload: P) -> usize;

    /// The live record at `index`, if any.
    fn at(&self, index: usize) -> Option<&Slot<P>>;

    /// Mutable access to the payload of the live record at `index`. Keys can't be changed.
    fn payload_mut(&mut self, index: usize) -> Option<&mut P>;

    /// Tombstones the top record and returns the new size. Returns `0` when already empty.
    fn delete(&mut self) -> usize;

    /// Index of the topmost record with `key`, or `0`.
    fn index_of(&self, key: Key) -> usize;

    /// Index of the record with `key`, pushing a zero-payload record if there is none.
    fn grant(&mut self, key: Key) -> usize;

    /// Tombstones every record. Capacity is retained.
    fn clear(&mut self);

    /// Live records, bottom to top.
    fn iter(&self) -> impl DoubleEndedIterator<Item = &Slot<P>>;

    /// Number of live records; always equal to [`RecordStack::top_index`].
    fn size(&self) -> usize;

    fn top_index(&self) -> usize;

    /// Number of slots ever allocated.
    fn capacity(&self) -> usize;

    fn top(&self) -> Option<&Slot<P>> {
        self.at(self.top_index())
    }

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn width(&self) -> usize {
        1 + P::FIELDS
    }
}

/// The stack implementation used by the profiler.
#[cfg(not(feature = "strict"))]
pub type Stack<P> = PooledStack<P>;

/// The stack implementation used by the profiler.
#[cfg(feature = "strict")]
pub type Stack<P> = StrictStack<P>;
