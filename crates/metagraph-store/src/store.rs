//! The node store: owner of every node in one repository.
//!
//! Nodes live in a concurrent map keyed by synthetic id. To-one properties are
//! stored inline; to-many properties are `Arc`-shared
//! [`IndexedPropertySlot`]s, so slot operations run under the slot's own lock
//! and never while a map guard is held.
//!
//! Lock discipline: map guards are never held across a slot operation, and
//! key extraction (which runs under a slot lock) only takes short-lived map
//! read guards, one at a time.
//!
//! Slot indexes key their values by classifier and by inline to-one
//! properties. Mutators of either advance the store's key generation, which
//! makes every index built before the change stale.

use crate::error::{SlotError, StoreError};
use crate::index_spec::{IndexKey, IndexKeySource, IndexSpec};
use crate::key_index::{KeyIndex, RealKey};
use crate::node::{Node, NodeFlags, NodeId, PropertyValue, SourceInformation};
use crate::slot::IndexedPropertySlot;
use dashmap::DashMap;
use metagraph_common::{Atom, ShardedInterner};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Global counter for assigning unique instance IDs to `NodeStore` instances.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Thread-safe arena of graph nodes.
///
/// ## Usage
///
/// ```ignore
/// let store = NodeStore::new();
/// let class = store.new_node("Class", None);
/// let dog = store.new_node("Dog", Some(class));
/// store.add_value(dog, store.intern("properties"), legs)?;
/// ```
pub struct NodeStore {
    /// Unique instance ID for debugging (tracks which store instance this is)
    instance_id: u64,
    interner: Arc<ShardedInterner>,
    nodes: DashMap<NodeId, Node>,
    /// Classifier -> key index for instances of that classifier.
    key_indexes: DashMap<NodeId, Arc<KeyIndex>>,
    /// Advanced after every change to data that index keys are read from.
    key_generation: AtomicU64,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    pub fn new() -> Self {
        Self::with_interner(Arc::new(ShardedInterner::with_common()))
    }

    /// Create a store sharing an existing interner.
    pub fn with_interner(interner: Arc<ShardedInterner>) -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        trace!(instance_id, "NodeStore::new - creating new instance");
        Self {
            instance_id,
            interner,
            nodes: DashMap::new(),
            key_indexes: DashMap::new(),
            key_generation: AtomicU64::new(0),
        }
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn interner(&self) -> &Arc<ShardedInterner> {
        &self.interner
    }

    #[inline]
    pub fn intern(&self, s: &str) -> Atom {
        self.interner.intern(s)
    }

    #[inline]
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.interner.resolve(atom)
    }

    // -------------------------------------------------------------------------
    // Node lifecycle
    // -------------------------------------------------------------------------

    /// Allocate a node with a fresh synthetic id.
    pub fn new_node(&self, name: &str, classifier: Option<NodeId>) -> NodeId {
        let id = NodeId::allocate();
        let name = self.intern(name);
        trace!(
            instance_id = self.instance_id,
            node = %id,
            name = name.0,
            classifier = ?classifier,
            "NodeStore::new_node"
        );
        self.nodes.insert(id, Node::new(id, name, classifier));
        id
    }

    /// Allocate a node that records where it was declared.
    pub fn new_node_with_source(
        &self,
        name: &str,
        classifier: Option<NodeId>,
        source: SourceInformation,
    ) -> NodeId {
        let id = self.new_node(name, classifier);
        if let Some(mut node) = self.nodes.get_mut(&id) {
            node.source = Some(source);
        }
        id
    }

    /// Copy a node under a fresh id. To-many slots are copied, so later
    /// mutation of either node does not affect the other.
    pub fn copy_node(&self, id: NodeId) -> Result<NodeId, StoreError> {
        let (name, classifier, source, flags, properties) = self
            .with_node(id, |node| {
                (
                    node.name,
                    node.classifier,
                    node.source.clone(),
                    node.flags,
                    node.properties.clone(),
                )
            })
            .ok_or(StoreError::UnknownNode(id))?;

        let mut copy = Node::new(NodeId::allocate(), name, classifier);
        copy.source = source;
        copy.flags = flags;
        copy.properties = properties
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    PropertyValue::One(v) => PropertyValue::One(v),
                    PropertyValue::Many(slot) => PropertyValue::Many(Arc::new(slot.copy())),
                };
                (key, value)
            })
            .collect();
        let copy_id = copy.id;
        trace!(instance_id = self.instance_id, from = %id, to = %copy_id, "NodeStore::copy_node");
        self.nodes.insert(copy_id, copy);
        Ok(copy_id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Run `f` against a node. The map guard is released before returning.
    pub fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> Option<R> {
        self.nodes.get(&id).map(|node| f(&node))
    }

    /// Current key generation; see [`IndexKeySource::key_generation`].
    pub fn key_generation(&self) -> u64 {
        self.key_generation.load(Ordering::Acquire)
    }

    fn advance_key_generation(&self) {
        let generation = self.key_generation.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(instance_id = self.instance_id, generation, "NodeStore key generation advanced");
    }

    fn with_node_mut<R>(
        &self,
        id: NodeId,
        f: impl FnOnce(&mut Node) -> R,
    ) -> Result<R, StoreError> {
        self.nodes
            .get_mut(&id)
            .map(|mut node| f(&mut node))
            .ok_or(StoreError::UnknownNode(id))
    }

    // -------------------------------------------------------------------------
    // Node attributes
    // -------------------------------------------------------------------------

    pub fn name_of(&self, id: NodeId) -> Option<Atom> {
        self.with_node(id, |node| node.name)
    }

    /// Node name as a string; empty for unknown nodes.
    pub fn name_string(&self, id: NodeId) -> Arc<str> {
        self.name_of(id)
            .map(|atom| self.resolve(atom))
            .unwrap_or_else(|| Arc::from(""))
    }

    pub fn classifier_of(&self, id: NodeId) -> Option<NodeId> {
        self.with_node(id, |node| node.classifier).flatten()
    }

    /// Reclassify a node. Used while bootstrapping self-describing
    /// metaclasses, whose classifier does not exist when they are created.
    pub fn set_classifier(&self, id: NodeId, classifier: Option<NodeId>) -> Result<(), StoreError> {
        self.with_node_mut(id, |node| node.classifier = classifier)?;
        self.advance_key_generation();
        Ok(())
    }

    pub fn source_of(&self, id: NodeId) -> Option<SourceInformation> {
        self.with_node(id, |node| node.source.clone()).flatten()
    }

    pub fn flags_of(&self, id: NodeId) -> NodeFlags {
        self.with_node(id, |node| node.flags).unwrap_or_default()
    }

    pub fn set_flags(&self, id: NodeId, flags: NodeFlags, enabled: bool) -> Result<(), StoreError> {
        self.with_node_mut(id, |node| node.flags.set(flags, enabled))
    }

    /// Property keys of a node, in unspecified order.
    pub fn property_names(&self, id: NodeId) -> Vec<Atom> {
        self.with_node(id, |node| node.property_keys().collect())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // To-one properties
    // -------------------------------------------------------------------------

    /// The single value of a property.
    ///
    /// A to-many property holding at most one value reads as to-one; one
    /// holding several is a [`StoreError::NotToOne`]. Index keys built from
    /// [`IndexSpec::PropertyValue`] see inline to-one values only.
    pub fn value_to_one(&self, id: NodeId, key: Atom) -> Result<Option<NodeId>, StoreError> {
        let value = self
            .with_node(id, |node| node.properties.get(&key).cloned())
            .ok_or(StoreError::UnknownNode(id))?;
        match value {
            None => Ok(None),
            Some(PropertyValue::One(v)) => Ok(Some(v)),
            Some(PropertyValue::Many(slot)) => {
                let values = slot.values();
                match &*values {
                    [] => Ok(None),
                    [single] => Ok(Some(*single)),
                    _ => Err(StoreError::NotToOne {
                        owner: id,
                        property: self.resolve(key).to_string(),
                    }),
                }
            }
        }
    }

    pub fn set_value_to_one(&self, id: NodeId, key: Atom, value: NodeId) -> Result<(), StoreError> {
        self.with_node_mut(id, |node| {
            node.properties.insert(key, PropertyValue::One(value));
        })?;
        self.advance_key_generation();
        Ok(())
    }

    /// Remove a property entirely. Returns whether it was set.
    pub fn remove_property(&self, id: NodeId, key: Atom) -> Result<bool, StoreError> {
        let removed = self.with_node_mut(id, |node| node.properties.remove(&key).is_some())?;
        if removed {
            self.advance_key_generation();
        }
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // To-many properties
    // -------------------------------------------------------------------------

    /// All values of a property. Never fails: unknown nodes and unset
    /// properties read as empty, a to-one property as a single value.
    pub fn values_of(&self, id: NodeId, key: Atom) -> Arc<[NodeId]> {
        let value = self
            .with_node(id, |node| node.properties.get(&key).cloned())
            .flatten();
        match value {
            None => Arc::from(Vec::new()),
            Some(PropertyValue::One(v)) => Arc::from(vec![v]),
            Some(PropertyValue::Many(slot)) => slot.values(),
        }
    }

    /// The slot backing a to-many property, created empty on first access.
    pub fn slot(&self, id: NodeId, key: Atom) -> Result<Arc<IndexedPropertySlot>, StoreError> {
        let mut node = self.nodes.get_mut(&id).ok_or(StoreError::UnknownNode(id))?;
        let value = node
            .properties
            .entry(key)
            .or_insert_with(|| PropertyValue::Many(Arc::new(IndexedPropertySlot::new())));
        match value {
            PropertyValue::Many(slot) => Ok(Arc::clone(slot)),
            PropertyValue::One(_) => Err(StoreError::NotToMany {
                owner: id,
                property: self.resolve(key).to_string(),
            }),
        }
    }

    /// The slot backing a property if one exists, without creating it.
    fn existing_slot(&self, id: NodeId, key: Atom) -> Option<Arc<IndexedPropertySlot>> {
        self.with_node(id, |node| match node.properties.get(&key) {
            Some(PropertyValue::Many(slot)) => Some(Arc::clone(slot)),
            _ => None,
        })
        .flatten()
    }

    pub fn add_value(&self, id: NodeId, key: Atom, value: NodeId) -> Result<(), StoreError> {
        self.slot(id, key)?.add(self, value);
        Ok(())
    }

    pub fn add_values(&self, id: NodeId, key: Atom, values: &[NodeId]) -> Result<(), StoreError> {
        self.slot(id, key)?.add_all(self, values);
        Ok(())
    }

    /// Remove the first occurrence of `value`. Returns whether it was present.
    pub fn remove_value(&self, id: NodeId, key: Atom, value: NodeId) -> Result<bool, StoreError> {
        if !self.contains(id) {
            return Err(StoreError::UnknownNode(id));
        }
        Ok(self
            .existing_slot(id, key)
            .is_some_and(|slot| slot.remove_value(self, value)))
    }

    pub fn remove_values(
        &self,
        id: NodeId,
        key: Atom,
        values: &[NodeId],
    ) -> Result<usize, StoreError> {
        if !self.contains(id) {
            return Err(StoreError::UnknownNode(id));
        }
        Ok(self
            .existing_slot(id, key)
            .map_or(0, |slot| slot.remove_all(self, values)))
    }

    pub fn set_values(&self, id: NodeId, key: Atom, values: Vec<NodeId>) -> Result<(), StoreError> {
        self.slot(id, key)?.set_values(values);
        Ok(())
    }

    /// Replace the value at `offset`, returning the previous one.
    pub fn set_value_at(
        &self,
        id: NodeId,
        key: Atom,
        offset: usize,
        value: NodeId,
    ) -> Result<NodeId, StoreError> {
        let slot = self.slot(id, key)?;
        slot.set_value_at(offset, value)
            .ok_or_else(|| StoreError::OffsetOutOfBounds {
                owner: id,
                property: self.resolve(key).to_string(),
                offset,
                len: slot.len(),
            })
    }

    // -------------------------------------------------------------------------
    // Key queries
    // -------------------------------------------------------------------------

    /// The single value of a to-many property whose `spec` key is `key`.
    pub fn value_by_key(
        &self,
        id: NodeId,
        property: Atom,
        spec: IndexSpec,
        key: IndexKey,
    ) -> Result<Option<NodeId>, StoreError> {
        if !self.contains(id) {
            return Err(StoreError::UnknownNode(id));
        }
        let Some(slot) = self.existing_slot(id, property) else {
            return self.one_value_by_key(id, property, spec, key);
        };
        slot.value_by_unique_key(self, spec, key)
            .map_err(|err| self.conflict_error(id, property, err))
    }

    /// Shorthand for a unique lookup by value name.
    pub fn value_by_name(
        &self,
        id: NodeId,
        property: Atom,
        name: &str,
    ) -> Result<Option<NodeId>, StoreError> {
        match self.interner.lookup(name) {
            Some(atom) => self.value_by_key(id, property, IndexSpec::Name, IndexKey::Name(atom)),
            None => Ok(None),
        }
    }

    /// Every value of a property whose `spec` key is `key`. Never fails.
    pub fn values_by_key(
        &self,
        id: NodeId,
        property: Atom,
        spec: IndexSpec,
        key: IndexKey,
    ) -> Vec<NodeId> {
        match self.existing_slot(id, property) {
            Some(slot) => slot.values_by_key(self, spec, key),
            None => self
                .one_value_by_key(id, property, spec, key)
                .ok()
                .flatten()
                .into_iter()
                .collect(),
        }
    }

    fn one_value_by_key(
        &self,
        id: NodeId,
        property: Atom,
        spec: IndexSpec,
        key: IndexKey,
    ) -> Result<Option<NodeId>, StoreError> {
        if key.is_absent() {
            return Ok(None);
        }
        Ok(self
            .value_to_one(id, property)?
            .filter(|&value| self.index_key(spec, value) == key))
    }

    fn conflict_error(&self, owner: NodeId, property: Atom, err: SlotError) -> StoreError {
        let SlotError::Conflict { key, .. } = err;
        let key = match key {
            IndexKey::Name(atom) => self.resolve(atom).to_string(),
            IndexKey::Node(node) => format!("{} ({node})", self.name_string(node)),
            IndexKey::Absent => key.to_string(),
        };
        StoreError::IndexConflict {
            owner,
            owner_name: self.name_string(owner).to_string(),
            property: self.resolve(property).to_string(),
            key,
        }
    }

    // -------------------------------------------------------------------------
    // Key indexes
    // -------------------------------------------------------------------------

    /// Register the key index used for instances of `classifier`.
    pub fn register_key_index(&self, classifier: NodeId, index: KeyIndex) {
        self.key_indexes.insert(classifier, Arc::new(index));
    }

    pub fn key_index_for(&self, classifier: NodeId) -> Option<Arc<KeyIndex>> {
        self.key_indexes.get(&classifier).map(|r| Arc::clone(&r))
    }

    /// Structural path of a node's logical property `name`, resolved through
    /// its classifier's key index.
    pub fn real_key_for(&self, id: NodeId, name: &str) -> Result<RealKey, StoreError> {
        if !self.contains(id) {
            return Err(StoreError::UnknownNode(id));
        }
        let index = self
            .classifier_of(id)
            .and_then(|classifier| self.key_index_for(classifier))
            .ok_or(StoreError::MissingKeyIndex(id))?;
        Ok(index.real_key_for(name)?.clone())
    }

    // -------------------------------------------------------------------------
    // Literals
    // -------------------------------------------------------------------------

    // A primitive literal is a node named by its literal text and classified
    // by its primitive type.

    pub fn new_integer(&self, value: i64, classifier: Option<NodeId>) -> NodeId {
        self.new_node(&value.to_string(), classifier)
    }

    pub fn new_boolean(&self, value: bool, classifier: Option<NodeId>) -> NodeId {
        self.new_node(if value { "true" } else { "false" }, classifier)
    }

    pub fn new_string(&self, value: &str, classifier: Option<NodeId>) -> NodeId {
        self.new_node(value, classifier)
    }

    /// Integer held by a literal node (its name).
    pub fn integer_value(&self, id: NodeId) -> Option<i64> {
        self.name_of(id)
            .and_then(|atom| self.resolve(atom).parse().ok())
    }

    /// Boolean held by a literal node (its name).
    pub fn boolean_value(&self, id: NodeId) -> Option<bool> {
        self.name_of(id)
            .and_then(|atom| self.resolve(atom).parse().ok())
    }

    /// String held by a literal node (its name).
    pub fn string_value(&self, id: NodeId) -> Option<Arc<str>> {
        self.name_of(id).map(|atom| self.resolve(atom))
    }
}

impl IndexKeySource for NodeStore {
    fn index_key(&self, spec: IndexSpec, value: NodeId) -> IndexKey {
        match spec {
            IndexSpec::Name => self
                .name_of(value)
                .map_or(IndexKey::Absent, IndexKey::Name),
            IndexSpec::Classifier => self
                .classifier_of(value)
                .map_or(IndexKey::Absent, IndexKey::Node),
            IndexSpec::PropertyValue(property) => self
                .to_one_for_key(value, property)
                .map_or(IndexKey::Absent, IndexKey::Node),
            IndexSpec::PropertyName(property) => self
                .to_one_for_key(value, property)
                .and_then(|target| self.name_of(target))
                .map_or(IndexKey::Absent, IndexKey::Name),
        }
    }

    fn key_generation(&self) -> u64 {
        NodeStore::key_generation(self)
    }
}

impl NodeStore {
    /// Inline to-one value of a property. Key extraction never reads slots:
    /// slot contents change without advancing the key generation.
    fn to_one_for_key(&self, id: NodeId, property: Atom) -> Option<NodeId> {
        self.with_node(id, |node| match node.properties.get(&property) {
            Some(PropertyValue::One(v)) => Some(*v),
            _ => None,
        })
        .flatten()
    }
}

#[cfg(test)]
#[path = "../tests/store_tests.rs"]
mod tests;
