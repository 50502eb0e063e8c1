//! Metagraph: a metamodel graph engine.
//!
//! The engine keeps model elements as nodes in a concurrent [`NodeStore`],
//! with to-many properties held in [`IndexedPropertySlot`]s that index
//! themselves once they grow large enough to make key lookups worth it. On
//! top of the store, [`TypeMatchEngine`] ranks generic type compatibility for
//! overload resolution.
//!
//! ```ignore
//! use metagraph::{CoreTypes, GraphBuilder, MatchPolicy, NodeStore, TypeMatchEngine};
//!
//! let store = NodeStore::new();
//! let core = CoreTypes::bootstrap(&store)?;
//! let b = GraphBuilder::new(&store, &core);
//! let number = b.generic_type(core.number)?;
//! let integer = b.generic_type(core.integer)?;
//! let engine = TypeMatchEngine::new(&store, &core);
//! let rank = engine.match_types(number, Some(integer), true, MatchPolicy::default())?;
//! ```

pub mod tracing_config;

pub use metagraph_common as common;
pub use metagraph_solver as solver;
pub use metagraph_store as store;

pub use metagraph_common::{Atom, ShardedInterner};
pub use metagraph_solver::overload::{Selection, select, select_most_specific};
pub use metagraph_solver::{
    BoundsMultiplicityMatcher, GenericArgumentResolver, GenericTypeMatch, GenericTypeRef,
    InheritanceResolver, MatchError, MatchPolicy, MultiplicityMatch, MultiplicityMatcher,
    NullMatchBehavior, ParameterMatchBehavior, TypeMatch, TypeMatchEngine,
};
pub use metagraph_store::{
    CoreTypes, GraphBuilder, IndexKey, IndexSpec, IndexedPropertySlot, KeyIndex, NodeId,
    NodeStore, StoreError,
};
