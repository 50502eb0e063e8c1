//! Errors raised by the type match engine.
//!
//! Incompatibility is never an error: it is `Ok(None)`. These variants are
//! reserved for inputs a [`MatchPolicy`](crate::MatchPolicy) declares
//! impossible and for graphs that break metamodel invariants.

use metagraph_store::{NodeId, StoreError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("null value matched against {target_name} ({target})")]
    NullValue { target: NodeId, target_name: String },

    #[error("non-concrete target type parameter '{parameter}' ({node})")]
    NonConcreteTarget { node: NodeId, parameter: String },

    #[error("non-concrete value type parameter '{parameter}' ({node})")]
    NonConcreteValue { node: NodeId, parameter: String },

    /// A generic type's argument count disagrees with the parameters its raw
    /// type declares.
    #[error(
        "{raw_name} ({raw}) declares {expected} {kind} parameter(s) but generic type {generic_type} has {found} argument(s)"
    )]
    ArityMismatch {
        generic_type: NodeId,
        raw: NodeId,
        raw_name: String,
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("malformed type graph at {node}: {reason}")]
    MalformedGraph { node: NodeId, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
