use std::fmt::Debug;

use super::{Key, Payload, PooledStack, RecordStack, Slot};

/// A [`RecordStack`] that checks every call against the stack contract and panics with a
/// message naming the operation and its arguments when a caller breaks it.
///
/// The checks are:
/// - keys passed to `push` and `grant` are positive;
/// - a pushed key is not already present on the stack;
/// - `at` and `payload_mut` address a live record.
#[derive(Debug, Clone)]
pub struct StrictStack<P> {
    inner: PooledStack<P>,
}

impl<P: Payload> Default for StrictStack<P> {
    fn default() -> Self {
        StrictStack {
            inner: PooledStack::default(),
        }
    }
}

impl<P: Payload> StrictStack<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        StrictStack {
            inner: PooledStack::with_capacity(capacity),
        }
    }
}

#[track_caller]
fn complain(locus: impl Debug, msg: &str) -> ! {
    panic!("StrictStack.{locus:?}: {msg}")
}

impl<P: Payload + Debug> RecordStack<P> for StrictStack<P> {
    #[track_caller]
    fn push(&mut self, key: Key, payload: P) -> usize {
        if key == 0 {
            complain(("push", key, payload), "the key must be a positive integer");
        }
        if self.inner.index_of(key) != 0 {
            complain(("push", key, payload), "key value must be unique");
        }
        self.inner.push(key, payload)
    }

    #[track_caller]
    fn at(&self, index: usize) -> Option<&Slot<P>> {
        match self.inner.at(index) {
            None => complain(("at", index), "bad index value"),
            slot => slot,
        }
    }

    #[track_caller]
    fn payload_mut(&mut self, index: usize) -> Option<&mut P> {
        if self.inner.at(index).is_none() {
            complain(("payload_mut", index), "bad index value");
        }
        self.inner.payload_mut(index)
    }

    fn delete(&mut self) -> usize {
        self.inner.delete()
    }

    fn index_of(&self, key: Key) -> usize {
        self.inner.index_of(key)
    }

    #[track_caller]
    fn grant(&mut self, key: Key) -> usize {
        if key == 0 {
            complain(("grant", key), "argument must be >= 1");
        }
        self.inner.grant(key)
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = &Slot<P>> {
        self.inner.iter()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn top_index(&self) -> usize {
        self.inner.top_index()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    // The provided `top` would route an empty stack through the checked `at`.
    fn top(&self) -> Option<&Slot<P>> {
        self.inner.top()
    }
}
