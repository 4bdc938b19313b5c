use std::collections::{BTreeMap, BTreeSet};

/// Per-element state of a tracked membership set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracked {
    Added,
    Unchanged,
    Deleted,
}

/// A membership set (associated IMPUs or IMPIs of an IRS) that reconciles
/// against a replacement list instead of overwriting it, so the CAS engine
/// knows exactly which sub-records need an add, a delete, or nothing.
#[derive(Debug, Clone, Default)]
pub struct TrackedSet {
    entries: BTreeMap<String, Tracked>,
    /// Keys permanently excluded from this set, e.g. an associated-IMPU
    /// claim lost to a collision. A banned key is never reinstated by
    /// `merge_union` even if a stale store read still lists it, since that
    /// stale read is often our own earlier write of the same failed claim.
    banned: BTreeSet<String>,
}

impl TrackedSet {
    /// All entries already present in a decoded store record.
    pub fn from_existing(items: impl IntoIterator<Item = String>) -> Self {
        let entries = items.into_iter().map(|k| (k, Tracked::Unchanged)).collect();
        Self {
            entries,
            banned: BTreeSet::new(),
        }
    }

    /// A set built fresh (e.g. from an HSS answer for an IRS that didn't
    /// exist in the store yet): every member still needs writing.
    pub fn from_fresh(items: impl IntoIterator<Item = String>) -> Self {
        let entries = items.into_iter().map(|k| (k, Tracked::Added)).collect();
        Self {
            entries,
            banned: BTreeSet::new(),
        }
    }

    /// Replace the membership list, reconciling rather than overwriting:
    /// entries no longer present become DELETED (or are dropped if they were
    /// still pending ADDED), new entries become ADDED, entries present in
    /// both stay UNCHANGED.
    pub fn reconcile(&mut self, new_list: &[String]) {
        let new_set: BTreeSet<&str> = new_list
            .iter()
            .map(String::as_str)
            .filter(|k| !self.banned.contains(*k))
            .collect();
        let mut next = BTreeMap::new();

        for key in new_list {
            if self.banned.contains(key.as_str()) {
                continue;
            }
            let state = match self.entries.get(key.as_str()) {
                Some(Tracked::Added) => Tracked::Added,
                Some(Tracked::Unchanged) => Tracked::Unchanged,
                Some(Tracked::Deleted) => Tracked::Unchanged,
                None => Tracked::Added,
            };
            next.insert(key.clone(), state);
        }

        for (key, state) in &self.entries {
            if new_set.contains(key.as_str()) {
                continue;
            }
            match state {
                Tracked::Added => {} // never written, just drop the claim
                Tracked::Unchanged | Tracked::Deleted => {
                    next.insert(key.clone(), Tracked::Deleted);
                }
            }
        }

        self.entries = next;
    }

    /// Remove an entry's pending ADDED claim entirely, e.g. after an IMPU
    /// collision where we never actually own the key.
    pub fn drop_pending(&mut self, key: &str) {
        if matches!(self.entries.get(key), Some(Tracked::Added)) {
            self.entries.remove(key);
        }
    }

    /// Drop a pending claim and permanently exclude it from this set: unlike
    /// `drop_pending`, a banned key is never reinstated by a later
    /// `merge_union` against a store read that still lists it (the read is
    /// typically our own earlier write of the same failed claim).
    pub fn ban(&mut self, key: &str) {
        self.entries.remove(key);
        self.banned.insert(key.to_string());
    }

    pub fn added(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, s)| matches!(s, Tracked::Added))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, s)| matches!(s, Tracked::Deleted))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Current membership: ADDED + UNCHANGED, i.e. what a fresh record write
    /// should contain.
    pub fn current(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, s)| !matches!(s, Tracked::Deleted))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Merge rule on a default-IMPU CAS conflict: union of (store set) and
    /// (in-memory ADDED), minus (in-memory DELETED) — concurrent additions by
    /// two writers both survive.
    pub fn merge_union(&mut self, store_values: &[String]) {
        let deleted: BTreeSet<String> = self.deleted().into_iter().collect();
        let added = self.added();

        let mut next = BTreeMap::new();
        for value in store_values {
            if deleted.contains(value) || self.banned.contains(value) {
                continue;
            }
            next.insert(value.clone(), Tracked::Unchanged);
        }
        for value in added {
            if deleted.contains(&value) || self.banned.contains(&value) {
                continue;
            }
            next.entry(value).or_insert(Tracked::Added);
        }
        self.entries = next;
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }
}
