//! Match results and their specificity order.
//!
//! Results are transient values: created per query, never stored on a node.
//! Lower compares as more specific, so the best overload candidate is the
//! minimum.
//!
//! ```text
//! Exact < Distance(1) < Distance(2) < ... < NonConcrete < Function(..) < Bottom < Null
//! ```

use crate::multiplicity::MultiplicityMatch;
use std::cmp::Ordering;

/// How a value's raw type relates to the target's.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TypeMatch {
    /// Identical raw types.
    Exact,
    /// The super type sits this many steps up the sub type's resolution order.
    Distance(usize),
    /// A type parameter was accepted by policy.
    NonConcrete,
    /// Structurally compatible function types, compared component-wise.
    Function(Box<FunctionTypeMatch>),
    /// The sub type is the bottom type, which matches everything.
    Bottom,
    /// An absent value was accepted by policy.
    Null,
}

impl TypeMatch {
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact)
    }
}

/// Match of one function parameter: its type and its multiplicity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParameterMatch {
    pub type_match: GenericTypeMatch,
    pub multiplicity: MultiplicityMatch,
}

/// Component-wise match of two function types. Parameters compare first,
/// in order, then the return type, then the return multiplicity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FunctionTypeMatch {
    pub parameters: Vec<ParameterMatch>,
    pub return_type: GenericTypeMatch,
    pub return_multiplicity: MultiplicityMatch,
}

/// Full result of matching two generic types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericTypeMatch {
    pub type_match: TypeMatch,
    /// One entry per type parameter of the compared raw type.
    pub argument_matches: Vec<GenericTypeMatch>,
    /// One entry per multiplicity parameter of the compared raw type.
    pub multiplicity_argument_matches: Vec<MultiplicityMatch>,
}

impl GenericTypeMatch {
    pub fn new(type_match: TypeMatch) -> Self {
        Self {
            type_match,
            argument_matches: Vec::new(),
            multiplicity_argument_matches: Vec::new(),
        }
    }

    /// The best possible result.
    pub fn exact() -> Self {
        Self::new(TypeMatch::Exact)
    }

    pub fn with_arguments(
        type_match: TypeMatch,
        argument_matches: Vec<GenericTypeMatch>,
        multiplicity_argument_matches: Vec<MultiplicityMatch>,
    ) -> Self {
        Self {
            type_match,
            argument_matches,
            multiplicity_argument_matches,
        }
    }

    /// Exact at the raw type and in every argument.
    pub fn is_exact(&self) -> bool {
        self.type_match.is_exact()
            && self.argument_matches.iter().all(GenericTypeMatch::is_exact)
            && self
                .multiplicity_argument_matches
                .iter()
                .all(|m| *m == MultiplicityMatch::Exact)
    }
}

/// Element-wise over the common prefix, ignoring length.
fn compare_prefix<T: Ord>(a: &[T], b: &[T]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.cmp(y))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl Ord for GenericTypeMatch {
    /// Raw type match first, then type arguments element-wise, then
    /// multiplicity arguments element-wise, then list lengths.
    fn cmp(&self, other: &Self) -> Ordering {
        self.type_match
            .cmp(&other.type_match)
            .then_with(|| compare_prefix(&self.argument_matches, &other.argument_matches))
            .then_with(|| {
                compare_prefix(
                    &self.multiplicity_argument_matches,
                    &other.multiplicity_argument_matches,
                )
            })
            .then_with(|| {
                self.argument_matches
                    .len()
                    .cmp(&other.argument_matches.len())
            })
            .then_with(|| {
                self.multiplicity_argument_matches
                    .len()
                    .cmp(&other.multiplicity_argument_matches.len())
            })
    }
}

impl PartialOrd for GenericTypeMatch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
#[path = "../tests/type_match_tests.rs"]
mod tests;
