//! Bi-indexed relation store mapping content keys to host addresses.
//!
//! The store tracks tuples of `(content key, host address)` meaning
//! "this host claims to hold this content". Two hash indices cover the
//! only access patterns on the request path: bulk replace by host (on
//! inventory ingest) and point lookup by key (on where queries).

use locator_types::{ContentKey, HostAddress};
use std::collections::HashMap;

/// In-memory bi-indexed mapping between content keys and host addresses.
///
/// Tuples are never mutated in place: they are created by inserts and
/// destroyed only when a host re-registers (which supersedes all of that
/// host's prior tuples) or the store is dropped. Duplicate tuples within
/// one registration may coexist; they are not deduplicated.
#[derive(Debug, Default)]
pub struct RelationStore {
    /// content key → hosts claiming it, in insertion order.
    by_key: HashMap<ContentKey, Vec<HostAddress>>,
    /// host → keys it currently claims, in insertion order.
    by_host: HashMap<HostAddress, Vec<ContentKey>>,
}

impl RelationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one tuple to both indices.
    pub fn insert(&mut self, key: ContentKey, host: HostAddress) {
        self.by_key.entry(key.clone()).or_default().push(host);
        self.by_host.entry(host).or_default().push(key);
    }

    /// Atomically replace everything `host` claims with `keys`.
    ///
    /// Models "this host now holds exactly these contents, and nothing
    /// else". An empty `keys` list is an intentional full deregistration.
    /// The single `&mut self` borrow is what makes the delete + insert
    /// indivisible relative to concurrent `select` calls.
    pub fn replace_host(&mut self, host: HostAddress, keys: Vec<ContentKey>) {
        if let Some(old_keys) = self.by_host.remove(&host) {
            for key in old_keys {
                if let Some(hosts) = self.by_key.get_mut(&key) {
                    // One occurrence per tuple; duplicates shrink one at a time.
                    if let Some(pos) = hosts.iter().position(|h| *h == host) {
                        hosts.remove(pos);
                    }
                    if hosts.is_empty() {
                        self.by_key.remove(&key);
                    }
                }
            }
        }

        for key in keys {
            self.insert(key, host);
        }
    }

    /// All hosts currently claiming `key`.
    ///
    /// Returns an empty vec (not an error) for unknown keys. Order is
    /// insertion order; callers must not rely on it.
    pub fn select(&self, key: &ContentKey) -> Vec<HostAddress> {
        self.by_key.get(key).cloned().unwrap_or_default()
    }

    /// Keys currently claimed by `host`.
    pub fn keys_of(&self, host: &HostAddress) -> Vec<ContentKey> {
        self.by_host.get(host).cloned().unwrap_or_default()
    }

    /// Number of distinct hosts with at least one registration.
    pub fn host_count(&self) -> usize {
        self.by_host.len()
    }

    /// Total number of tuples in the store.
    pub fn tuple_count(&self) -> usize {
        self.by_host.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> ContentKey {
        ContentKey::new(s).unwrap()
    }

    fn host(s: &str) -> HostAddress {
        s.parse().unwrap()
    }

    #[test]
    fn select_unknown_key_is_empty() {
        let store = RelationStore::new();
        assert!(store.select(&key("never-registered")).is_empty());
    }

    #[test]
    fn insert_then_select() {
        let mut store = RelationStore::new();
        store.insert(key("a.txt"), host("10.0.0.5:9000"));
        store.insert(key("a.txt"), host("10.0.0.6:9000"));

        let hosts = store.select(&key("a.txt"));
        assert_eq!(hosts.len(), 2);
        assert!(hosts.contains(&host("10.0.0.5:9000")));
        assert!(hosts.contains(&host("10.0.0.6:9000")));
    }

    #[test]
    fn replace_supersedes_prior_registration() {
        let mut store = RelationStore::new();
        let h = host("10.0.0.5:9000");

        store.replace_host(h, vec![key("a.txt"), key("b.txt")]);
        store.replace_host(h, vec![key("b.txt"), key("c.txt")]);

        // Only the second batch is visible, never a mix.
        assert!(store.select(&key("a.txt")).is_empty());
        assert_eq!(store.select(&key("b.txt")), vec![h]);
        assert_eq!(store.select(&key("c.txt")), vec![h]);
    }

    #[test]
    fn replace_does_not_touch_other_hosts() {
        let mut store = RelationStore::new();
        let h1 = host("10.0.0.5:9000");
        let h2 = host("10.0.0.6:9000");

        store.replace_host(h1, vec![key("a.txt")]);
        store.replace_host(h2, vec![key("a.txt")]);
        store.replace_host(h1, vec![key("b.txt")]);

        assert_eq!(store.select(&key("a.txt")), vec![h2]);
        assert_eq!(store.select(&key("b.txt")), vec![h1]);
    }

    #[test]
    fn empty_replace_clears_all_prior_keys() {
        let mut store = RelationStore::new();
        let h = host("10.0.0.5:9000");

        store.replace_host(h, vec![key("a.txt"), key("b.txt")]);
        store.replace_host(h, Vec::new());

        assert!(store.select(&key("a.txt")).is_empty());
        assert!(store.select(&key("b.txt")).is_empty());
        assert_eq!(store.host_count(), 0);
        assert_eq!(store.tuple_count(), 0);
    }

    #[test]
    fn identical_repush_is_idempotent() {
        let mut store = RelationStore::new();
        let h = host("10.0.0.5:9000");
        let inventory = vec![key("a.txt"), key("b.txt")];

        store.replace_host(h, inventory.clone());
        let once = store.select(&key("a.txt"));

        store.replace_host(h, inventory);
        let twice = store.select(&key("a.txt"));

        assert_eq!(once, twice);
        assert_eq!(store.tuple_count(), 2);
    }

    #[test]
    fn duplicate_tuples_within_a_batch_coexist() {
        let mut store = RelationStore::new();
        let h = host("10.0.0.5:9000");

        store.replace_host(h, vec![key("a.txt"), key("a.txt")]);
        assert_eq!(store.select(&key("a.txt")).len(), 2);

        // The next replace still removes both occurrences.
        store.replace_host(h, Vec::new());
        assert!(store.select(&key("a.txt")).is_empty());
    }

    #[test]
    fn keys_of_reflects_current_batch() {
        let mut store = RelationStore::new();
        let h = host("10.0.0.5:9000");

        store.replace_host(h, vec![key("a.txt")]);
        store.replace_host(h, vec![key("b.txt")]);

        assert_eq!(store.keys_of(&h), vec![key("b.txt")]);
    }
}
