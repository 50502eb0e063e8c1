//! Centralized limits and thresholds for the metamodel engine.
//!
//! # Categories
//!
//! - **Slot indexing**: when an indexed property slot builds or drops its
//!   secondary key indexes
//! - **Recursion depths**: limits for recursive walks over the type graph
//!
//! Matcher recursion limits are consumed through
//! `metagraph_solver::recursion::RecursionProfile`, which reads them from here.

// =============================================================================
// Slot Indexing Thresholds
// =============================================================================

/// A slot builds a secondary index on the first key query only when it holds
/// more than this many values. At or below it, key queries scan linearly.
///
/// Most to-many properties in a metamodel graph (type arguments, parameters,
/// generalizations) hold a handful of values, where a scan beats hashing.
/// Package children and class property lists are the long tail this serves.
pub const SLOT_INDEX_UPPER_THRESHOLD: usize = 10;

/// An existing index is dropped once the slot shrinks below this many values.
///
/// Together with [`SLOT_INDEX_UPPER_THRESHOLD`] this forms a hysteresis band
/// (6..=10) in which a slot keeps whatever representation it already has, so
/// alternating add/remove around a single size does not rebuild indexes.
pub const SLOT_INDEX_LOWER_THRESHOLD: usize = 6;

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting depth of a single generic type match.
///
/// Each level is one type argument, multiplicity argument or function
/// parameter/return step. Well-formed models nest a few levels deep
/// (`Map<String, List<Pair<A, B>>>`); anything near this limit is a malformed
/// or cyclic generic type structure.
pub const MAX_MATCH_DEPTH: u32 = 100;

/// Total recursive match steps allowed within one top-level match call.
pub const MAX_MATCH_ITERATIONS: u32 = 100_000;

/// Maximum depth when walking a generalization (supertype) hierarchy.
pub const MAX_GENERALIZATION_DEPTH: u32 = 256;

/// Total classes visited when computing one resolution order.
pub const MAX_GENERALIZATION_ITERATIONS: u32 = 10_000;

/// Maximum depth for structural identity checks between generic types.
pub const MAX_IDENTITY_DEPTH: u32 = 64;
