//! Indexed property slots: the storage behind every to-many node property.
//!
//! A slot is an ordered value sequence with up to two lazily built secondary
//! indexes over it:
//!
//! - a **unique-key index** (`key -> value`), answering
//!   [`value_by_unique_key`](IndexedPropertySlot::value_by_unique_key)
//! - a **general index** (`key -> values`), answering
//!   [`values_by_key`](IndexedPropertySlot::values_by_key)
//!
//! ## Representation policy
//!
//! Small slots never index: key queries scan the sequence. An index is built
//! on the first key query once the slot holds more than
//! [`SLOT_INDEX_UPPER_THRESHOLD`] values and is dropped again only when the
//! slot shrinks below [`SLOT_INDEX_LOWER_THRESHOLD`]. The representation is
//! invisible to callers: scans and index lookups return the same results for
//! the same sequence.
//!
//! ## Key changes
//!
//! Keys are read from other nodes, which may change after an index was built.
//! Every index records the [`key_generation`](IndexKeySource::key_generation)
//! it was built at; an index from an older generation is discarded before it
//! is consulted or updated, and rebuilt by the next key query.
//!
//! ## Conflicts
//!
//! A unique-key query fails with [`SlotError::Conflict`] when two distinct
//! values share the queried key. Adding a value whose key collides with an
//! indexed one never fails; it discards the unique index alone, and the next
//! unique query rebuilds it (or scans, while the collision persists).
//!
//! ## Concurrency
//!
//! One mutex per slot guards the sequence and both indexes. Readers of the
//! plain sequence get an immutable `Arc<[NodeId]>` snapshot that is created
//! on the first read after a mutation and shared by every read until the
//! next one.

use crate::error::SlotError;
use crate::index_spec::{IndexKey, IndexKeySource, IndexSpec};
use crate::node::NodeId;
use metagraph_common::limits::{SLOT_INDEX_LOWER_THRESHOLD, SLOT_INDEX_UPPER_THRESHOLD};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

type Bucket = SmallVec<[NodeId; 2]>;

#[derive(Clone, Debug)]
struct UniqueIndex {
    spec: IndexSpec,
    generation: u64,
    map: FxHashMap<IndexKey, NodeId>,
}

impl UniqueIndex {
    /// Build over `values`, or return the first colliding key.
    fn build(
        keys: &dyn IndexKeySource,
        spec: IndexSpec,
        values: &[NodeId],
    ) -> Result<Self, IndexKey> {
        let generation = keys.key_generation();
        let mut map = FxHashMap::default();
        map.reserve(values.len());
        for &value in values {
            let key = keys.index_key(spec, value);
            if key.is_absent() {
                continue;
            }
            match map.entry(key) {
                Entry::Vacant(entry) => {
                    entry.insert(value);
                }
                Entry::Occupied(entry) => {
                    if *entry.get() != value {
                        return Err(key);
                    }
                }
            }
        }
        Ok(Self {
            spec,
            generation,
            map,
        })
    }
}

#[derive(Clone, Debug)]
struct GeneralIndex {
    spec: IndexSpec,
    generation: u64,
    map: FxHashMap<IndexKey, Bucket>,
}

impl GeneralIndex {
    fn build(keys: &dyn IndexKeySource, spec: IndexSpec, values: &[NodeId]) -> Self {
        let generation = keys.key_generation();
        let mut map: FxHashMap<IndexKey, Bucket> = FxHashMap::default();
        for &value in values {
            let key = keys.index_key(spec, value);
            if !key.is_absent() {
                map.entry(key).or_default().push(value);
            }
        }
        Self {
            spec,
            generation,
            map,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct SlotState {
    values: Vec<NodeId>,
    /// Immutable view of `values`, shared by readers until the next mutation.
    snapshot: Option<Arc<[NodeId]>>,
    unique: Option<UniqueIndex>,
    general: Option<GeneralIndex>,
}

impl SlotState {
    fn invalidate_snapshot(&mut self) {
        self.snapshot = None;
    }

    fn drop_indexes(&mut self) {
        if self.unique.is_some() || self.general.is_some() {
            trace!(len = self.values.len(), "slot dropping secondary indexes");
        }
        self.unique = None;
        self.general = None;
    }

    /// Drop indexes built before the keys last changed.
    fn discard_stale(&mut self, keys: &dyn IndexKeySource) {
        let generation = keys.key_generation();
        if self.unique.as_ref().is_some_and(|u| u.generation != generation) {
            trace!(generation, "slot discarding stale unique index");
            self.unique = None;
        }
        if self.general.as_ref().is_some_and(|g| g.generation != generation) {
            trace!(generation, "slot discarding stale general index");
            self.general = None;
        }
    }

    fn index_added(&mut self, keys: &dyn IndexKeySource, value: NodeId) {
        let mut collided = false;
        if let Some(unique) = &mut self.unique {
            let key = keys.index_key(unique.spec, value);
            if !key.is_absent() {
                match unique.map.entry(key) {
                    Entry::Vacant(entry) => {
                        entry.insert(value);
                    }
                    Entry::Occupied(entry) => {
                        if *entry.get() != value {
                            debug!(
                                spec = ?unique.spec,
                                %key,
                                existing = %entry.get(),
                                added = %value,
                                "unique key collision on add; discarding unique index"
                            );
                            collided = true;
                        }
                    }
                }
            }
        }
        if collided {
            self.unique = None;
        }
        if let Some(general) = &mut self.general {
            let key = keys.index_key(general.spec, value);
            if !key.is_absent() {
                general.map.entry(key).or_default().push(value);
            }
        }
    }

    /// Update indexes after the first occurrence of `value` left `values`.
    fn index_removed(&mut self, keys: &dyn IndexKeySource, value: NodeId) {
        if self.values.len() < SLOT_INDEX_LOWER_THRESHOLD {
            self.drop_indexes();
            return;
        }
        let still_present = self.values.contains(&value);
        if let Some(unique) = &mut self.unique {
            if !still_present {
                let key = keys.index_key(unique.spec, value);
                if unique.map.get(&key) == Some(&value) {
                    unique.map.remove(&key);
                }
            }
        }
        if let Some(general) = &mut self.general {
            let key = keys.index_key(general.spec, value);
            if let Some(bucket) = general.map.get_mut(&key) {
                if let Some(pos) = bucket.iter().position(|&v| v == value) {
                    bucket.remove(pos);
                }
                if bucket.is_empty() {
                    general.map.remove(&key);
                }
            }
        }
    }

    fn remove_first(&mut self, keys: &dyn IndexKeySource, value: NodeId) -> bool {
        let Some(pos) = self.values.iter().position(|&v| v == value) else {
            return false;
        };
        self.values.remove(pos);
        self.index_removed(keys, value);
        true
    }

    fn scan_unique(
        &self,
        keys: &dyn IndexKeySource,
        spec: IndexSpec,
        key: IndexKey,
    ) -> Result<Option<NodeId>, SlotError> {
        let mut found = None;
        for &value in &self.values {
            if keys.index_key(spec, value) != key {
                continue;
            }
            match found {
                Some(existing) if existing != value => {
                    return Err(SlotError::Conflict { spec, key });
                }
                _ => found = Some(value),
            }
        }
        Ok(found)
    }
}

/// Ordered values of one to-many property of one node.
#[derive(Debug, Default)]
pub struct IndexedPropertySlot {
    state: Mutex<SlotState>,
}

impl IndexedPropertySlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot holding `values` in order.
    pub fn from_values(values: Vec<NodeId>) -> Self {
        Self {
            state: Mutex::new(SlotState {
                values,
                ..SlotState::default()
            }),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // Every mutation completes before its guard is released, so a
        // poisoned slot still holds a consistent sequence.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current value sequence. Never fails; an empty slot yields an
    /// empty sequence.
    pub fn values(&self) -> Arc<[NodeId]> {
        let mut state = self.lock();
        if let Some(snapshot) = &state.snapshot {
            return Arc::clone(snapshot);
        }
        let snapshot: Arc<[NodeId]> = Arc::from(state.values.as_slice());
        state.snapshot = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().values.is_empty()
    }

    pub fn contains(&self, value: NodeId) -> bool {
        self.lock().values.contains(&value)
    }

    /// Append `value`, keeping any cached index current.
    pub fn add(&self, keys: &dyn IndexKeySource, value: NodeId) {
        let mut state = self.lock();
        state.discard_stale(keys);
        state.values.push(value);
        state.invalidate_snapshot();
        state.index_added(keys, value);
    }

    /// Append every value of `values` in order.
    pub fn add_all(&self, keys: &dyn IndexKeySource, values: &[NodeId]) {
        if values.is_empty() {
            return;
        }
        let mut state = self.lock();
        state.discard_stale(keys);
        state.values.reserve(values.len());
        for &value in values {
            state.values.push(value);
            state.index_added(keys, value);
        }
        state.invalidate_snapshot();
    }

    /// Remove the first occurrence of `value`. Returns whether it was present.
    pub fn remove_value(&self, keys: &dyn IndexKeySource, value: NodeId) -> bool {
        let mut state = self.lock();
        state.discard_stale(keys);
        let removed = state.remove_first(keys, value);
        if removed {
            state.invalidate_snapshot();
        }
        removed
    }

    /// Remove the first occurrence of each of `values`. Returns how many
    /// values were removed.
    pub fn remove_all(&self, keys: &dyn IndexKeySource, values: &[NodeId]) -> usize {
        let mut state = self.lock();
        state.discard_stale(keys);
        let mut removed = 0;
        for &value in values {
            if state.remove_first(keys, value) {
                removed += 1;
            }
        }
        if removed > 0 {
            state.invalidate_snapshot();
        }
        removed
    }

    /// Replace the whole sequence. Cached indexes are dropped.
    pub fn set_values(&self, values: Vec<NodeId>) {
        let mut state = self.lock();
        state.values = values;
        state.invalidate_snapshot();
        state.drop_indexes();
    }

    /// Replace the value at `offset`, returning the previous value, or `None`
    /// when `offset` is out of bounds. Cached indexes are dropped.
    pub fn set_value_at(&self, offset: usize, value: NodeId) -> Option<NodeId> {
        let mut state = self.lock();
        let slot = state.values.get_mut(offset)?;
        let previous = std::mem::replace(slot, value);
        state.invalidate_snapshot();
        state.drop_indexes();
        Some(previous)
    }

    /// An independent slot with the same values and indexes.
    pub fn copy(&self) -> Self {
        let mut state = self.lock().clone();
        state.snapshot = None;
        Self {
            state: Mutex::new(state),
        }
    }

    /// The single value whose `spec` key equals `key`.
    ///
    /// Fails with [`SlotError::Conflict`] when two distinct values share `key`.
    pub fn value_by_unique_key(
        &self,
        keys: &dyn IndexKeySource,
        spec: IndexSpec,
        key: IndexKey,
    ) -> Result<Option<NodeId>, SlotError> {
        if key.is_absent() {
            return Ok(None);
        }
        let mut state = self.lock();
        state.discard_stale(keys);

        if let Some(unique) = state.unique.as_ref().filter(|u| u.spec == spec) {
            return Ok(unique.map.get(&key).copied());
        }

        if state.values.len() > SLOT_INDEX_UPPER_THRESHOLD {
            match UniqueIndex::build(keys, spec, &state.values) {
                Ok(unique) => {
                    trace!(?spec, len = state.values.len(), "slot built unique index");
                    let found = unique.map.get(&key).copied();
                    state.unique = Some(unique);
                    return Ok(found);
                }
                Err(colliding) => {
                    debug!(?spec, key = %colliding, "unique index build hit a key collision");
                }
            }
        }

        state.scan_unique(keys, spec, key)
    }

    /// Every value whose `spec` key equals `key`, in sequence order.
    pub fn values_by_key(
        &self,
        keys: &dyn IndexKeySource,
        spec: IndexSpec,
        key: IndexKey,
    ) -> Vec<NodeId> {
        if key.is_absent() {
            return Vec::new();
        }
        let mut state = self.lock();
        state.discard_stale(keys);

        if state.general.as_ref().is_none_or(|g| g.spec != spec)
            && state.values.len() > SLOT_INDEX_UPPER_THRESHOLD
        {
            trace!(?spec, len = state.values.len(), "slot built general index");
            state.general = Some(GeneralIndex::build(keys, spec, &state.values));
        }

        match state.general.as_ref().filter(|g| g.spec == spec) {
            Some(general) => general
                .map
                .get(&key)
                .map(|bucket| bucket.to_vec())
                .unwrap_or_default(),
            None => state
                .values
                .iter()
                .copied()
                .filter(|&value| keys.index_key(spec, value) == key)
                .collect(),
        }
    }

    /// Whether a unique-key index is currently cached.
    pub fn has_unique_index(&self) -> bool {
        self.lock().unique.is_some()
    }

    /// Whether a general index is currently cached.
    pub fn has_general_index(&self) -> bool {
        self.lock().general.is_some()
    }
}

#[cfg(test)]
#[path = "../tests/slot_tests.rs"]
mod tests;
