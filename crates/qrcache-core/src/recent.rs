//! Bounded, insertion-ordered history of the queries a session ran recently.

use indexmap::IndexMap;
use qrcache_types::{QueryKey, QuerySignature};

/// Number of query keys remembered per session.
pub const DEFAULT_RECENT_QUERY_CAPACITY: usize = 10;

/// Insertion-ordered map from query key to the last signature saved under it.
///
/// Replacing the signature of a known key keeps the key's position. Adding a
/// new key to a full history evicts the eldest key.
#[derive(Debug, Clone)]
pub struct RecentQueries {
    entries: IndexMap<QueryKey, QuerySignature>,
    capacity: usize,
}

impl Default for RecentQueries {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_QUERY_CAPACITY)
    }
}

impl RecentQueries {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: IndexMap::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Store `signature` under `key`, returning the signature it replaced.
    pub fn record(&mut self, key: QueryKey, signature: QuerySignature) -> Option<QuerySignature> {
        let previous = self.entries.insert(key, signature);
        while self.entries.len() > self.capacity {
            self.entries.shift_remove_index(0);
        }
        previous
    }

    /// Record `signature` and report whether it equals the one already held for `key`.
    pub fn record_is_repeat(&mut self, key: QueryKey, signature: &QuerySignature) -> bool {
        self.record(key, signature.clone())
            .is_some_and(|previous| previous == *signature)
    }

    pub fn remove(&mut self, key: QueryKey) -> Option<QuerySignature> {
        self.entries.shift_remove(&key)
    }

    pub fn get(&self, key: QueryKey) -> Option<&QuerySignature> {
        self.entries.get(&key)
    }

    /// Keys from eldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = QueryKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sig(text: &str) -> QuerySignature {
        QuerySignature::new(text)
    }

    #[test]
    fn test_record_returns_previous() {
        let mut recent = RecentQueries::default();
        assert_eq!(recent.record(1, sig("a")), None);
        assert_eq!(recent.record(1, sig("b")), Some(sig("a")));
        assert_eq!(recent.get(1), Some(&sig("b")));
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_repeat_detection() {
        let mut recent = RecentQueries::default();
        let query = sig("select * from orders");
        assert!(!recent.record_is_repeat(7, &query));
        assert!(recent.record_is_repeat(7, &query));
        assert!(!recent.record_is_repeat(7, &sig("select * from orders o")));
    }

    #[test]
    fn test_eleventh_key_evicts_eldest() {
        let mut recent = RecentQueries::default();
        for key in 0..11 {
            recent.record(key, sig("q"));
        }
        assert_eq!(recent.len(), 10);
        assert!(recent.get(0).is_none());
        assert_eq!(recent.keys().collect::<Vec<_>>(), (1..11).collect::<Vec<_>>());
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut recent = RecentQueries::new(3);
        recent.record(1, sig("a"));
        recent.record(2, sig("b"));
        recent.record(3, sig("c"));
        recent.record(1, sig("a2"));
        recent.record(4, sig("d"));
        // key 1 is still the eldest, so it is the one evicted
        assert_eq!(recent.keys().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_remove() {
        let mut recent = RecentQueries::default();
        recent.record(5, sig("a"));
        assert_eq!(recent.remove(5), Some(sig("a")));
        assert!(recent.is_empty());
        assert_eq!(recent.remove(5), None);
    }

    #[test]
    fn test_remove_keeps_order_of_the_rest() {
        let mut recent = RecentQueries::new(3);
        recent.record(1, sig("a"));
        recent.record(2, sig("b"));
        recent.record(3, sig("c"));
        recent.remove(2);
        recent.record(4, sig("d"));
        recent.record(5, sig("e"));
        assert_eq!(recent.keys().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(keys in proptest::collection::vec(0i32..50, 0..200)) {
            let mut recent = RecentQueries::default();
            for key in &keys {
                recent.record(*key, sig("q"));
                prop_assert!(recent.len() <= DEFAULT_RECENT_QUERY_CAPACITY);
            }
            if let Some(last) = keys.last() {
                prop_assert!(recent.get(*last).is_some());
            }
        }
    }
}
