use super::{Key, Payload, RecordStack, Slot};

/// The plain [`RecordStack`]. See the [module documentation](super) for the storage model.
#[derive(Debug, Clone)]
pub struct PooledStack<P> {
    // `slots[0]` is the sentinel; the active region is `slots[1..=top]`.
    slots: Vec<Slot<P>>,
    top: usize,
}

impl<P: Payload> Default for PooledStack<P> {
    fn default() -> Self {
        PooledStack {
            slots: vec![Slot::default()],
            top: 0,
        }
    }
}

impl<P: Payload> PooledStack<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stack with `capacity` slots already allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity + 1);
        slots.resize(capacity + 1, Slot::default());
        PooledStack { slots, top: 0 }
    }

    // Stores into the slot above the top, growing the pool by one slot if needed.
    #[inline]
    fn store_above_top(&mut self, key: Key, payload: P) -> usize {
        let index = self.top + 1;
        let slot = Slot { key, payload };
        if index == self.slots.len() {
            self.slots.push(slot);
        } else {
            self.slots[index] = slot;
        }
        self.top = index;
        index
    }
}

impl<P: Payload> RecordStack<P> for PooledStack<P> {
    #[inline]
    fn push(&mut self, key: Key, payload: P) -> usize {
        self.store_above_top(key, payload)
    }

    #[inline]
    fn at(&self, index: usize) -> Option<&Slot<P>> {
        if index == 0 || index > self.top {
            return None;
        }
        self.slots.get(index).filter(|slot| slot.is_live())
    }

    #[inline]
    fn payload_mut(&mut self, index: usize) -> Option<&mut P> {
        if index == 0 || index > self.top {
            return None;
        }
        self.slots
            .get_mut(index)
            .filter(|slot| slot.is_live())
            .map(|slot| &mut slot.payload)
    }

    #[inline]
    fn delete(&mut self) -> usize {
        if self.top > 0 {
            self.slots[self.top].key = 0;
            self.top -= 1;
        }
        self.top
    }

    #[inline]
    fn index_of(&self, key: Key) -> usize {
        let mut index = self.top;
        while index != 0 && self.slots[index].key != key {
            index -= 1;
        }
        index
    }

    fn grant(&mut self, key: Key) -> usize {
        match self.index_of(key) {
            0 => self.store_above_top(key, P::default()),
            index => index,
        }
    }

    fn clear(&mut self) {
        for slot in &mut self.slots[1..=self.top] {
            slot.key = 0;
        }
        self.top = 0;
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = &Slot<P>> {
        self.slots[1..=self.top].iter()
    }

    #[inline]
    fn size(&self) -> usize {
        self.top
    }

    #[inline]
    fn top_index(&self) -> usize {
        self.top
    }

    fn capacity(&self) -> usize {
        self.slots.len() - 1
    }
}
