//! Errors raised by the node store, its slots and key indexes.

use crate::index_spec::{IndexKey, IndexSpec};
use crate::node::NodeId;
use thiserror::Error;

/// Failure of a slot-level key query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlotError {
    /// Two distinct values of the slot share the queried unique key.
    #[error("conflict for unique key {key} in {spec:?} index")]
    Conflict { spec: IndexSpec, key: IndexKey },
}

/// Failure of a [`KeyIndex`](crate::KeyIndex) lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyIndexError {
    #[error("Unsupported key: {key}")]
    UnsupportedKey { key: String },
}

/// Failure of a [`NodeStore`](crate::NodeStore) operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Unique-key conflict, rendered with the owning node and property.
    #[error("conflict for key '{key}' in property '{property}' of {owner_name} ({owner})")]
    IndexConflict {
        owner: NodeId,
        owner_name: String,
        property: String,
        key: String,
    },

    #[error("property '{property}' of {owner} is to-many")]
    NotToOne { owner: NodeId, property: String },

    #[error("property '{property}' of {owner} is to-one")]
    NotToMany { owner: NodeId, property: String },

    #[error("offset {offset} out of bounds for property '{property}' of {owner} (len {len})")]
    OffsetOutOfBounds {
        owner: NodeId,
        property: String,
        offset: usize,
        len: usize,
    },

    #[error("no key index registered for classifier of {0}")]
    MissingKeyIndex(NodeId),

    #[error(transparent)]
    KeyIndex(#[from] KeyIndexError),
}
