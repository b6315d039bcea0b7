use std::collections::HashSet;

use moka::sync::Cache;

/// Per-address record of transaction hashes that were already evaluated.
///
/// The unbounded variant never forgets a hash. The bounded variant caps
/// memory at `capacity` entries; an evicted hash can be evaluated again if a
/// source keeps returning it.
pub enum DedupSet {
    Unbounded(HashSet<String>),
    Bounded(Cache<String, ()>),
}

impl DedupSet {
    pub fn unbounded() -> Self {
        DedupSet::Unbounded(HashSet::new())
    }

    pub fn bounded(capacity: u64) -> Self {
        DedupSet::Bounded(Cache::builder().max_capacity(capacity.max(1)).build())
    }

    pub fn from_capacity(capacity: Option<u64>) -> Self {
        match capacity {
            Some(capacity) => Self::bounded(capacity),
            None => Self::unbounded(),
        }
    }

    /// Checks and marks `key` in one step. Returns `true` when the key had not
    /// been seen before.
    pub fn mark(&mut self, key: &str) -> bool {
        match self {
            DedupSet::Unbounded(seen) => seen.insert(key.to_string()),
            DedupSet::Bounded(cache) => cache.entry(key.to_string()).or_insert(()).is_fresh(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match self {
            DedupSet::Unbounded(seen) => seen.contains(key),
            DedupSet::Bounded(cache) => cache.contains_key(key),
        }
    }

    /// Approximate for the bounded variant; moka updates its counters lazily.
    pub fn len(&self) -> u64 {
        match self {
            DedupSet::Unbounded(seen) => seen.len() as u64,
            DedupSet::Bounded(cache) => cache.entry_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DedupSet {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl std::fmt::Debug for DedupSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            DedupSet::Unbounded(_) => "unbounded",
            DedupSet::Bounded(_) => "bounded",
        };
        f.debug_struct("DedupSet")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_set_marks_each_key_once() {
        let mut set = DedupSet::unbounded();
        assert!(set.mark("0xabc"));
        assert!(!set.mark("0xabc"));
        assert!(set.mark("0xdef"));
        assert!(set.contains("0xabc"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn bounded_set_rejects_repeats() {
        let mut set = DedupSet::from_capacity(Some(16));
        assert!(set.mark("tx1"));
        assert!(!set.mark("tx1"));
        assert!(set.contains("tx1"));
        assert!(!set.contains("tx2"));
    }
}
