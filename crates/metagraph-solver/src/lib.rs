//! Generic type matching for the metagraph metamodel engine.
//!
//! - [`TypeMatchEngine`] ranks how well one generic type fits another
//! - [`hierarchy`] computes generalization resolution orders and distances
//! - [`GenericArgumentResolver`] and [`MultiplicityMatcher`] are the engine's
//!   pluggable collaborators
//! - [`overload`] picks the most specific candidates from ranked results

pub mod behavior;
pub mod error;
pub mod generic_type;
pub mod hierarchy;
pub mod matcher;
pub mod multiplicity;
pub mod overload;
mod query_trace;
pub mod recursion;
pub mod resolver;
pub mod type_match;

pub use behavior::{MatchPolicy, NullMatchBehavior, ParameterMatchBehavior};
pub use error::MatchError;
pub use generic_type::{
    Bindings, FunctionSignature, GenericTypeRef, MultiplicityRef, MultiplicityShape, TypeGraph,
    TypeParameterInfo,
};
pub use matcher::TypeMatchEngine;
pub use multiplicity::{BoundsMultiplicityMatcher, Gap, MultiplicityMatch, MultiplicityMatcher};
pub use overload::Selection;
pub use recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
pub use resolver::{GenericArgumentResolver, InheritanceResolver};
pub use type_match::{FunctionTypeMatch, GenericTypeMatch, ParameterMatch, TypeMatch};
