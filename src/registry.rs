//! Bookkeeping for the logical contexts spans are opened in.
//!
//! There is always a main context. Secondary contexts are keyed by a caller-supplied
//! [`ContextId`]; they are not OS threads, just independent call stacks. A secondary context is
//! created on first use and, once its stack runs empty, is reset and parked on an idle list so
//! the next new id can reuse its stack without allocating.

use crate::hashing::{HashMap, HashMapExt};
use crate::pooled_stack::{Payload, RecordStack, Stack};
use crate::time::TimeValue;

/// Caller-supplied identifier of a secondary context.
pub type ContextId = u64;

/// An open span as stored on a context stack. The record key is the interned span name.
///
/// `measure` caches the index of the name's row in the measure table. Draining results
/// reclaims that table, so the cache is checked against the name before use.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpenSpan<T> {
    pub measure: usize,
    pub start: T,
    /// Total durations of the closed children of this span.
    pub children: T,
}

impl<T: TimeValue> Payload for OpenSpan<T> {
    const FIELDS: usize = 3;
}

/// One logical call stack.
#[derive(Debug, Default)]
pub struct SpanContext<T: TimeValue> {
    pub(crate) stack: Stack<OpenSpan<T>>,
    /// Set after leak recovery leaves spans open; new spans are refused until the context
    /// drains.
    pub(crate) locked: bool,
}

impl<T: TimeValue> SpanContext<T> {
    pub fn depth(&self) -> usize {
        self.stack.size()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn reset(&mut self) {
        self.stack.clear();
        self.locked = false;
    }
}

#[derive(Debug, Default)]
pub struct ContextRegistry<T: TimeValue> {
    main: SpanContext<T>,
    secondary: HashMap<ContextId, SpanContext<T>>,
    idle: Vec<SpanContext<T>>,
}

impl<T: TimeValue> ContextRegistry<T> {
    pub fn new() -> Self {
        ContextRegistry {
            main: SpanContext::default(),
            secondary: HashMap::new(),
            idle: Vec::new(),
        }
    }

    pub fn main(&self) -> &SpanContext<T> {
        &self.main
    }

    /// The main context for `None`, otherwise the registered secondary context, if any.
    pub fn get_mut(&mut self, id: Option<ContextId>) -> Option<&mut SpanContext<T>> {
        match id {
            None => Some(&mut self.main),
            Some(id) => self.secondary.get_mut(&id),
        }
    }

    /// Like [`ContextRegistry::get_mut`], registering a secondary context for an unknown id.
    /// The new context comes from the idle list when one is available.
    pub fn resolve_or_create(&mut self, id: Option<ContextId>) -> &mut SpanContext<T> {
        match id {
            None => &mut self.main,
            Some(id) => {
                let idle = &mut self.idle;
                self.secondary
                    .entry(id)
                    .or_insert_with(|| idle.pop().unwrap_or_default())
            }
        }
    }

    /// Deregisters a secondary context and parks its stack on the idle list. Does nothing for
    /// the main context or an unknown id.
    pub fn retire(&mut self, id: Option<ContextId>) {
        let Some(id) = id else {
            return;
        };
        if let Some(mut context) = self.secondary.remove(&id) {
            context.reset();
            self.idle.push(context);
        }
    }

    pub fn secondary_count(&self) -> usize {
        self.secondary.len()
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// `(id, depth)` of every registered secondary context, ordered by id.
    pub fn secondary_sizes(&self) -> Vec<(ContextId, usize)> {
        let mut sizes: Vec<_> = self
            .secondary
            .iter()
            .map(|(id, context)| (*id, context.depth()))
            .collect();
        sizes.sort_unstable();
        sizes
    }

    /// Open spans across all contexts.
    pub fn open_span_count(&self) -> usize {
        self.main.depth() + self.secondary.values().map(SpanContext::depth).sum::<usize>()
    }

    /// Forgets every secondary context and empties the main one. Idle stacks are kept.
    pub fn clear(&mut self) {
        self.main.reset();
        for (_, mut context) in self.secondary.drain() {
            context.reset();
            self.idle.push(context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(context: &mut SpanContext<u64>, key: u32) -> usize {
        context.stack.push(
            key,
            OpenSpan {
                measure: 1,
                start: 1,
                children: 0,
            },
        )
    }

    #[test]
    fn main_context_always_exists() {
        let mut registry = ContextRegistry::<u64>::new();
        assert!(registry.get_mut(None).is_some());
        assert_eq!(registry.secondary_count(), 0);
        assert_eq!(registry.open_span_count(), 0);
    }

    #[test]
    fn secondary_contexts_are_created_on_demand() {
        let mut registry = ContextRegistry::<u64>::new();
        assert!(registry.get_mut(Some(10)).is_none());
        open(registry.resolve_or_create(Some(10)), 1);
        open(registry.resolve_or_create(Some(12)), 1);
        open(registry.resolve_or_create(Some(10)), 2);

        assert_eq!(registry.secondary_count(), 2);
        assert_eq!(registry.secondary_sizes(), [(10, 2), (12, 1)]);
        assert_eq!(registry.open_span_count(), 3);
    }

    #[test]
    fn retired_contexts_are_reused_clean() {
        let mut registry = ContextRegistry::<u64>::new();
        let context = registry.resolve_or_create(Some(1));
        open(context, 4);
        open(context, 5);
        context.locked = true;
        let capacity = context.stack.capacity();

        registry.retire(Some(1));
        assert_eq!(registry.secondary_count(), 0);
        assert_eq!(registry.idle_count(), 1);

        let reused = registry.resolve_or_create(Some(2));
        assert_eq!(reused.depth(), 0);
        assert!(!reused.is_locked());
        assert!(reused.stack.top().is_none());
        assert_eq!(reused.stack.capacity(), capacity);
        assert_eq!(registry.idle_count(), 0);
    }

    #[test]
    fn retire_ignores_main_and_unknown_ids() {
        let mut registry = ContextRegistry::<u64>::new();
        open(registry.resolve_or_create(None), 1);
        registry.retire(None);
        registry.retire(Some(99));
        assert_eq!(registry.main().depth(), 1);
        assert_eq!(registry.idle_count(), 0);
    }

    #[test]
    fn clear_parks_secondary_contexts() {
        let mut registry = ContextRegistry::<u64>::new();
        open(registry.resolve_or_create(None), 1);
        open(registry.resolve_or_create(Some(3)), 1);
        registry.clear();
        assert_eq!(registry.open_span_count(), 0);
        assert_eq!(registry.secondary_count(), 0);
        assert_eq!(registry.idle_count(), 1);
    }
}
