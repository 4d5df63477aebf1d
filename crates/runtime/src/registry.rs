//! String-keyed allocator registries.

use std::collections::BTreeMap;
use std::fmt;

/// Immutable map from a wire discriminator to an allocator function.
///
/// Generated modules build one inside a `LazyLock` static. It is never
/// mutated after construction, so lookups from many threads need no locking.
pub struct AllocatorMap<F> {
    entries: BTreeMap<&'static str, F>,
}

impl<F: Copy> AllocatorMap<F> {
    /// Build the map from `(discriminator, allocator)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (&'static str, F)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Look up the allocator registered for `key`.
    pub fn get(&self, key: &str) -> Option<F> {
        self.entries.get(key).copied()
    }

    /// Whether `key` is a known discriminator.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered discriminators in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F> fmt::Debug for AllocatorMap<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
