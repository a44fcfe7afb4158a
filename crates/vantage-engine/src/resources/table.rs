use std::collections::HashMap;
use std::hash::Hash;

use anyhow::Result;
use slotmap::{Key, SecondaryMap};

use super::stats::ResourceStats;

struct Entry<D, I> {
    desc: D,
    refs: u32,
    info: I,
}

/// Outcome of [`SharedTable::release`].
#[derive(Debug, PartialEq, Eq)]
pub enum Release<D> {
    /// Other holders remain.
    Retained,
    /// Last holder gone; the caller destroys the device object.
    Destroy(D),
    /// Key was never acquired or is already destroyed.
    Unknown,
}

/// Cache of shared resources keyed by their construction parameters.
///
/// Identical descriptors resolve to one key. Each `acquire` takes a reference,
/// each `release` drops one, and the device object is destroyed only when the
/// last reference goes away.
pub struct SharedTable<K: Key, D, I = ()> {
    entries: SecondaryMap<K, Entry<D, I>>,
    by_desc: HashMap<D, K>,
    stats: ResourceStats,
}

impl<K: Key, D: Clone + Eq + Hash, I> SharedTable<K, D, I> {
    pub fn new() -> Self {
        Self {
            entries: SecondaryMap::new(),
            by_desc: HashMap::new(),
            stats: ResourceStats::default(),
        }
    }

    /// Returns the cached key for `desc`, or runs `create` on a miss.
    ///
    /// `create` returns the device key plus per-entry info kept alongside it.
    /// Nothing is recorded when `create` fails.
    pub fn acquire(&mut self, desc: &D, create: impl FnOnce(&D) -> Result<(K, I)>) -> Result<K> {
        if let Some(&key) = self.by_desc.get(desc) {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.refs += 1;
                self.stats.acquired += 1;
                return Ok(key);
            }
        }

        let (key, info) = create(desc)?;
        self.entries.insert(key, Entry { desc: desc.clone(), refs: 1, info });
        self.by_desc.insert(desc.clone(), key);
        self.stats.acquired += 1;
        self.stats.created += 1;
        Ok(key)
    }

    pub fn release(&mut self, key: K) -> Release<D> {
        let Some(entry) = self.entries.get_mut(key) else {
            return Release::Unknown;
        };
        entry.refs -= 1;
        if entry.refs > 0 {
            return Release::Retained;
        }

        let Some(entry) = self.entries.remove(key) else {
            return Release::Unknown;
        };
        self.by_desc.remove(&entry.desc);
        self.stats.destroyed += 1;
        Release::Destroy(entry.desc)
    }

    #[inline]
    pub fn info(&self, key: K) -> Option<&I> {
        self.entries.get(key).map(|e| &e.info)
    }

    /// Current holder count; zero for unknown keys.
    #[inline]
    pub fn refs(&self, key: K) -> u32 {
        self.entries.get(key).map_or(0, |e| e.refs)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> ResourceStats {
        self.stats
    }
}

impl<K: Key, D: Clone + Eq + Hash, I> Default for SharedTable<K, D, I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resources with exactly one owner (framebuffers). Tracks descriptors and
/// counters only.
pub struct OwnedTable<K: Key, D> {
    entries: SecondaryMap<K, D>,
    stats: ResourceStats,
}

impl<K: Key, D> OwnedTable<K, D> {
    pub fn new() -> Self {
        Self {
            entries: SecondaryMap::new(),
            stats: ResourceStats::default(),
        }
    }

    pub fn insert(&mut self, key: K, desc: D) {
        self.entries.insert(key, desc);
        self.stats.acquired += 1;
        self.stats.created += 1;
    }

    /// Returns the descriptor when `key` was live.
    pub fn remove(&mut self, key: K) -> Option<D> {
        let desc = self.entries.remove(key)?;
        self.stats.destroyed += 1;
        Some(desc)
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&D> {
        self.entries.get(key)
    }

    #[inline]
    pub fn stats(&self) -> ResourceStats {
        self.stats
    }
}

impl<K: Key, D> Default for OwnedTable<K, D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    slotmap::new_key_type! { struct TestId; }

    fn device() -> SlotMap<TestId, &'static str> {
        SlotMap::with_key()
    }

    // ── shared ──────────────────────────────────────────────────────────────

    #[test]
    fn identical_descriptors_share_one_key() {
        let mut dev = device();
        let mut table: SharedTable<TestId, &str> = SharedTable::new();

        let a = table.acquire(&"quad", |d| Ok((dev.insert(*d), ()))).unwrap();
        let b = table.acquire(&"quad", |_| panic!("cache hit must not create")).unwrap();

        assert_eq!(a, b);
        assert_eq!(table.refs(a), 2);
        assert_eq!(table.stats(), ResourceStats { acquired: 2, created: 1, destroyed: 0 });
    }

    #[test]
    fn destroy_only_on_last_release() {
        let mut dev = device();
        let mut table: SharedTable<TestId, &str> = SharedTable::new();
        let key = table.acquire(&"grid", |d| Ok((dev.insert(*d), ()))).unwrap();
        table.acquire(&"grid", |d| Ok((dev.insert(*d), ()))).unwrap();

        assert_eq!(table.release(key), Release::Retained);
        assert_eq!(table.release(key), Release::Destroy("grid"));
        assert_eq!(table.release(key), Release::Unknown);
        assert!(table.is_empty());
        assert_eq!(table.stats().live(), 0);
    }

    #[test]
    fn reacquire_after_destroy_creates_again() {
        let mut dev = device();
        let mut table: SharedTable<TestId, &str> = SharedTable::new();
        let first = table.acquire(&"atlas", |d| Ok((dev.insert(*d), ()))).unwrap();
        table.release(first);
        dev.remove(first);

        let second = table.acquire(&"atlas", |d| Ok((dev.insert(*d), ()))).unwrap();
        assert_ne!(first, second);
        assert_eq!(table.stats().created, 2);
    }

    #[test]
    fn failed_creation_records_nothing() {
        let mut table: SharedTable<TestId, &str> = SharedTable::new();
        let res = table.acquire(&"broken", |_| anyhow::bail!("out of memory"));
        assert!(res.is_err());
        assert_eq!(table.stats(), ResourceStats::default());
    }

    #[test]
    fn info_travels_with_the_entry() {
        let mut dev = device();
        let mut table: SharedTable<TestId, &str, u32> = SharedTable::new();
        let key = table.acquire(&"atlas", |d| Ok((dev.insert(*d), 7))).unwrap();
        assert_eq!(table.info(key), Some(&7));
    }

    // ── owned ───────────────────────────────────────────────────────────────

    #[test]
    fn owned_remove_is_single_shot() {
        let mut dev = device();
        let mut table: OwnedTable<TestId, (u32, u32)> = OwnedTable::new();
        let key = dev.insert("fb");
        table.insert(key, (64, 64));

        assert_eq!(table.remove(key), Some((64, 64)));
        assert_eq!(table.remove(key), None);
        assert_eq!(table.stats(), ResourceStats { acquired: 1, created: 1, destroyed: 1 });
    }
}
