//! Index specifications: which key a slot index extracts from each value.
//!
//! A specification is a plain enumerated tag. Two indexes are the same index
//! exactly when their specifications compare equal, so slot caches key on the
//! tag itself instead of on the identity of an extraction closure.

use crate::node::NodeId;
use metagraph_common::Atom;
use serde::Serialize;
use std::fmt;

/// Key extraction rule for a slot index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IndexSpec {
    /// The value node's own name.
    Name,
    /// The value node's classifier.
    Classifier,
    /// The name of the node held in the given to-one property of the value.
    ///
    /// Only inline to-one properties are read. A property backed by a slot
    /// extracts [`IndexKey::Absent`], even when it holds a single value.
    PropertyName(Atom),
    /// The node held in the given to-one property of the value. Reads inline
    /// to-one properties only, like [`IndexSpec::PropertyName`].
    PropertyValue(Atom),
}

/// A key extracted from a value by an [`IndexSpec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IndexKey {
    Name(Atom),
    Node(NodeId),
    /// The value has nothing to extract (no classifier, property unset).
    /// Values with an absent key are never returned by key queries.
    Absent,
}

impl IndexKey {
    #[inline]
    pub fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<Atom> for IndexKey {
    fn from(atom: Atom) -> Self {
        Self::Name(atom)
    }
}

impl From<NodeId> for IndexKey {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(atom) => write!(f, "name@{}", atom.0),
            Self::Node(id) => write!(f, "{id}"),
            Self::Absent => f.write_str("<absent>"),
        }
    }
}

/// Evaluates index specifications against stored nodes.
///
/// Implemented by [`NodeStore`](crate::NodeStore); slots receive it as a
/// parameter so that a slot never needs a back-reference to its store.
pub trait IndexKeySource {
    fn index_key(&self, spec: IndexSpec, value: NodeId) -> IndexKey;

    /// Changes whenever a key previously returned by
    /// [`index_key`](Self::index_key) may have changed. Indexes built at an
    /// older generation are stale. Sources whose keys never change can keep
    /// the default.
    fn key_generation(&self) -> u64 {
        0
    }
}
