//! String interner for node names and property keys.
//!
//! Every node name and every property key in the graph is interned into a
//! shared pool and handled as a `u32` [`Atom`]. Property lookups on a node are
//! then integer-keyed hash lookups, and name comparisons in key indexes are
//! integer comparisons.
//!
//! The interner is sharded so that graph construction running on several
//! threads does not serialize on a single lock.

use rustc_hash::{FxHashMap, FxHasher};
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

/// An interned string identifier.
///
/// Atoms are cheap to copy (just a u32) and can be compared with == in O(1).
/// To get the actual string, use [`ShardedInterner::resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// A sentinel value representing no atom / empty string.
    pub const NONE: Atom = Atom(0);

    /// Check if this is the empty/none atom.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Get the raw index value.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

const SHARD_BITS: u32 = 6;
const SHARD_COUNT: usize = 1 << SHARD_BITS;
const SHARD_MASK: u32 = (SHARD_COUNT as u32) - 1;

/// Metamodel vocabulary interned up front so the hot property keys land in
/// the first slots of their shards.
const COMMON_STRINGS: &[&str] = &[
    "Root",
    "children",
    "package",
    "name",
    "classifierGenericType",
    "properties",
    "propertiesFromAssociations",
    "qualifiedProperties",
    "generalizations",
    "specializations",
    "general",
    "specific",
    "rawType",
    "typeArguments",
    "multiplicityArguments",
    "typeParameter",
    "typeParameters",
    "multiplicityParameters",
    "multiplicityParameter",
    "contravariant",
    "parameters",
    "returnType",
    "returnMultiplicity",
    "genericType",
    "multiplicity",
    "lowerBound",
    "upperBound",
    "value",
    "owner",
    "Any",
    "Nil",
    "Boolean",
    "Integer",
    "Float",
    "Number",
    "String",
];

#[derive(Default)]
struct ShardState {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

struct InternerShard {
    state: RwLock<ShardState>,
}

impl InternerShard {
    fn new() -> Self {
        InternerShard {
            state: RwLock::new(ShardState::default()),
        }
    }
}

/// Sharded string interner for concurrent use.
///
/// Uses fixed buckets to reduce lock contention while keeping Atom lookups O(1).
pub struct ShardedInterner {
    shards: [InternerShard; SHARD_COUNT],
}

impl ShardedInterner {
    /// Create a new sharded interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let shards: [InternerShard; SHARD_COUNT] = std::array::from_fn(|_| InternerShard::new());
        {
            let mut state = shards[0]
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let empty: Arc<str> = Arc::from("");
            state.strings.push(empty.clone());
            state.map.insert(empty, Atom::NONE);
        }
        ShardedInterner { shards }
    }

    /// Create an interner with the metamodel vocabulary already interned.
    pub fn with_common() -> Self {
        let interner = Self::new();
        for s in COMMON_STRINGS {
            interner.intern(s);
        }
        interner
    }

    /// Intern a string, returning its Atom handle.
    /// If the string was already interned, returns the existing Atom.
    pub fn intern(&self, s: &str) -> Atom {
        if s.is_empty() {
            return Atom::NONE;
        }

        let shard_idx = Self::shard_for(s);
        let shard = &self.shards[shard_idx];

        // Fast path: most interns during matching hit existing names.
        {
            let state = shard.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(&atom) = state.map.get(s) {
                return atom;
            }
        }

        let mut state = shard.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(&atom) = state.map.get(s) {
            return atom;
        }

        let local_index = state.strings.len() as u32;
        if local_index > (u32::MAX >> SHARD_BITS) {
            // Return empty atom on overflow instead of panicking
            return Atom::NONE;
        }

        let atom = Self::make_atom(local_index, shard_idx as u32);
        let owned: Arc<str> = Arc::from(s);
        state.strings.push(owned.clone());
        state.map.insert(owned, atom);
        atom
    }

    /// Look up an already interned string without interning it.
    pub fn lookup(&self, s: &str) -> Option<Atom> {
        if s.is_empty() {
            return Some(Atom::NONE);
        }
        let shard = &self.shards[Self::shard_for(s)];
        let state = shard.state.read().unwrap_or_else(PoisonError::into_inner);
        state.map.get(s).copied()
    }

    /// Resolve an Atom back to its string value.
    /// Returns empty string if atom is out of bounds.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.try_resolve(atom).unwrap_or_else(|| Arc::from(""))
    }

    /// Try to resolve an Atom, returning None if invalid.
    pub fn try_resolve(&self, atom: Atom) -> Option<Arc<str>> {
        let (shard_idx, local_index) = Self::split_atom(atom);
        let shard = self.shards.get(shard_idx)?;
        let state = shard.state.read().unwrap_or_else(PoisonError::into_inner);
        state.strings.get(local_index).cloned()
    }

    /// Get the number of interned strings.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .state
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .strings
                    .len()
            })
            .sum()
    }

    /// Check if the interner is empty (only has the empty string).
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    #[inline]
    fn shard_for(s: &str) -> usize {
        let mut hasher = FxHasher::default();
        s.hash(&mut hasher);
        (hasher.finish() as usize) & (SHARD_COUNT - 1)
    }

    #[inline]
    fn make_atom(local_index: u32, shard_idx: u32) -> Atom {
        Atom((local_index << SHARD_BITS) | (shard_idx & SHARD_MASK))
    }

    #[inline]
    fn split_atom(atom: Atom) -> (usize, usize) {
        if atom == Atom::NONE {
            return (0, 0);
        }
        let raw = atom.0;
        ((raw & SHARD_MASK) as usize, (raw >> SHARD_BITS) as usize)
    }
}

impl Default for ShardedInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
