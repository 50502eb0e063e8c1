//! Typed node store for the metagraph metamodel engine.
//!
//! Every program element is a node in one in-memory graph. This crate owns
//! that graph:
//!
//! - **`NodeStore`**: synthetic ids, names, classifiers and properties
//! - **`IndexedPropertySlot`**: the storage behind to-many properties, with
//!   lazily built secondary key indexes
//! - **`KeyIndex`**: logical property names to structural storage paths
//! - **`m3`** / **`GraphBuilder`**: the core metamodel and helpers that write
//!   metamodel-shaped structures into a store
pub mod builder;
pub mod error;
pub mod index_spec;
pub mod key_index;
pub mod m3;
pub mod node;
pub mod slot;
pub mod store;

pub use builder::GraphBuilder;
pub use error::{KeyIndexError, SlotError, StoreError};
pub use index_spec::{IndexKey, IndexKeySource, IndexSpec};
pub use key_index::{KeyIndex, KeyIndexBuilder, PropertyOrigin, RealKey};
pub use m3::{CoreTypes, Vocabulary};
pub use node::{Node, NodeFlags, NodeId, PropertyValue, SourceInformation};
pub use slot::IndexedPropertySlot;
pub use store::NodeStore;
