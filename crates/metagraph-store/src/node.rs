//! Graph nodes and their identifiers.

use crate::slot::IndexedPropertySlot;
use bitflags::bitflags;
use metagraph_common::Atom;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Process-wide synthetic id counter. Ids are never reused, even across
/// stores, so a `NodeId` leaking from one store into another is detectable.
static NEXT_SYNTHETIC_ID: AtomicU32 = AtomicU32::new(NodeId::FIRST_VALID);

/// Synthetic identifier of a graph node.
///
/// All property links in the graph are stored as `NodeId`s rather than
/// references, so shared and cyclic structures (a property and its owner
/// pointing at each other) need no ownership juggling.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for invalid `NodeId`.
    pub const INVALID: Self = Self(0);

    /// First valid `NodeId`.
    pub const FIRST_VALID: u32 = 1;

    /// Check if this `NodeId` is valid.
    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }

    pub(crate) fn allocate() -> Self {
        Self(NEXT_SYNTHETIC_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Lifecycle flags carried by every node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The node belongs to persisted repository content rather than a
        /// transient compilation artifact.
        const PERSISTENT = 1 << 0;
        /// Post-processing has run over the node.
        const PROCESSED = 1 << 1;
        /// Validation passes have run over the node.
        const VALIDATED = 1 << 2;
    }
}

/// Where a node was declared.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SourceInformation {
    pub source_id: Arc<str>,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceInformation {
    pub fn new(
        source_id: impl Into<Arc<str>>,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

impl fmt::Display for SourceInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.source_id, self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// Value held under one property key of a node.
#[derive(Clone, Debug)]
pub enum PropertyValue {
    /// A to-one property.
    One(NodeId),
    /// A to-many property backed by an indexed slot.
    Many(Arc<IndexedPropertySlot>),
}

/// One element of the typed object graph.
#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: Atom,
    pub(crate) classifier: Option<NodeId>,
    pub(crate) source: Option<SourceInformation>,
    pub(crate) flags: NodeFlags,
    pub(crate) properties: FxHashMap<Atom, PropertyValue>,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: Atom, classifier: Option<NodeId>) -> Self {
        Self {
            id,
            name,
            classifier,
            source: None,
            flags: NodeFlags::empty(),
            properties: FxHashMap::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Atom {
        self.name
    }

    pub fn classifier(&self) -> Option<NodeId> {
        self.classifier
    }

    pub fn source(&self) -> Option<&SourceInformation> {
        self.source.as_ref()
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_persistent(&self) -> bool {
        self.flags.contains(NodeFlags::PERSISTENT)
    }

    pub fn property(&self, key: Atom) -> Option<&PropertyValue> {
        self.properties.get(&key)
    }

    /// Property keys in unspecified order.
    pub fn property_keys(&self) -> impl Iterator<Item = Atom> + '_ {
        self.properties.keys().copied()
    }
}
