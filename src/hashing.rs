//! This module provides the hash-based collections used throughout the crate. They all use the
//! `FxHasher` from `rustc-hash`: it is deterministic and much faster than the standard library's
//! randomly seeded SipHash for the short keys we hash (span names and context ids).
//!
//! The standard library `HashMap` has a `new` method, but `HashMap<K, V, S>` does not have a `new`
//! method by default. Use `HashMap::default()` instead to create a new hashmap with the default
//! hasher. If you really need to keep the API the same across implementations, we provide the
//! `HashMapExt` trait extension. The trait need only be in scope.

use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;

pub type FxBuildHasher = BuildHasherDefault<FxHasher>;
pub type HashMap<K, V> = std::collections::HashMap<K, V, FxBuildHasher>;
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;
pub type IndexSet<T> = indexmap::IndexSet<T, FxBuildHasher>;

/// Provides `new` and `with_capacity` for the `Fx` flavored collections.
pub trait HashMapExt {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

impl<K, V> HashMapExt for HashMap<K, V> {
    fn new() -> Self {
        HashMap::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, FxBuildHasher::default())
    }
}

impl<K, V> HashMapExt for IndexMap<K, V> {
    fn new() -> Self {
        IndexMap::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        IndexMap::with_capacity_and_hasher(capacity, FxBuildHasher::default())
    }
}
