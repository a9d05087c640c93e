//! Ordered one-to-many association storage
//!
//! Keys keep first-insertion order; each key owns an ordered sequence of
//! values in which duplicates are allowed. A key with no values left is
//! removed, so "has an entry" always means "has at least one value".

use std::hash::Hash;

use indexmap::IndexMap;

/// Key → ordered values, insertion ordered on both levels.
#[derive(Debug, Clone)]
pub(crate) struct AssociationMap<K, V> {
    entries: IndexMap<K, Vec<V>>,
}

impl<K, V> Default for AssociationMap<K, V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<K, V> AssociationMap<K, V>
where
    K: Hash + Eq,
    V: PartialEq + Clone,
{
    /// Appends `value` to the sequence of `key`, creating the entry on first use.
    /// Returns `true` if the entry was created.
    pub(crate) fn push(&mut self, key: K, value: V) -> bool {
        let created = !self.entries.contains_key(&key);
        self.entries.entry(key).or_default().push(value);
        created
    }

    /// Snapshot of the values associated with `key`.
    pub(crate) fn get(&self, key: &K) -> Vec<V> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// Snapshot of the values of the first key matching `pred`.
    pub(crate) fn find(&self, pred: impl Fn(&K) -> bool) -> Vec<V> {
        self.entries
            .iter()
            .find(|(key, _)| pred(key))
            .map(|(_, values)| values.clone())
            .unwrap_or_default()
    }

    /// Removes the whole entry for `key`.
    pub(crate) fn remove_key(&mut self, key: &K) -> Option<Vec<V>> {
        self.entries.shift_remove(key)
    }

    /// Removes the first occurrence of `value` under `key`.
    ///
    /// Returns `Some(emptied)` if an occurrence was removed, where `emptied`
    /// tells whether the key lost its last value (and therefore its entry).
    pub(crate) fn remove_one(&mut self, key: &K, value: &V) -> Option<bool> {
        let values = self.entries.get_mut(key)?;
        let index = values.iter().position(|v| v == value)?;
        values.remove(index);
        let emptied = values.is_empty();
        if emptied {
            self.entries.shift_remove(key);
        }
        Some(emptied)
    }

    /// Removes every occurrence of `value` under every key.
    ///
    /// Returns the keys whose sequences became empty (their entries are gone),
    /// in map order.
    pub(crate) fn remove_value_everywhere(&mut self, value: &V) -> Vec<K>
    where
        K: Clone,
    {
        let mut emptied = Vec::new();
        self.entries.retain(|key, values| {
            let before = values.len();
            values.retain(|v| v != value);
            if values.is_empty() && before > 0 {
                emptied.push(key.clone());
                false
            } else {
                true
            }
        });
        emptied
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Takes every entry out, leaving the map empty.
    pub(crate) fn take(&mut self) -> Vec<(K, Vec<V>)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }
}
