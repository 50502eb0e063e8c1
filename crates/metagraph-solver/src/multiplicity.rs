//! Multiplicity matching.

use crate::behavior::{MatchPolicy, NullMatchBehavior, ParameterMatchBehavior};
use crate::error::MatchError;
use crate::generic_type::{MultiplicityRef, MultiplicityShape, TypeGraph};
use serde::Serialize;

/// Distance between two bounds. `Unbounded` ranks after every finite gap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Gap {
    Finite(u64),
    Unbounded,
}

/// Result of a successful multiplicity match, ordered best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MultiplicityMatch {
    /// Identical multiplicities.
    Exact,
    /// The sub multiplicity lies strictly inside the super multiplicity.
    /// Tighter fits rank first, comparing the upper gap before the lower.
    Subsumed { upper_gap: Gap, lower_gap: Gap },
    /// A parameter was accepted by policy.
    NonConcrete,
    /// An absent value was accepted by policy.
    Null,
}

/// Compares multiplicities under the same policy vocabulary as type matching.
pub trait MultiplicityMatcher {
    /// `None` means incompatible. Covariant requires the value's range to lie
    /// within the target's; contravariant the reverse.
    fn match_multiplicity(
        &self,
        graph: &TypeGraph<'_>,
        target: &MultiplicityRef,
        value: Option<&MultiplicityRef>,
        covariant: bool,
        policy: MatchPolicy,
    ) -> Result<Option<MultiplicityMatch>, MatchError>;
}

/// Interval containment over lower/upper bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundsMultiplicityMatcher;

impl MultiplicityMatcher for BoundsMultiplicityMatcher {
    fn match_multiplicity(
        &self,
        graph: &TypeGraph<'_>,
        target: &MultiplicityRef,
        value: Option<&MultiplicityRef>,
        covariant: bool,
        policy: MatchPolicy,
    ) -> Result<Option<MultiplicityMatch>, MatchError> {
        let Some(value) = value else {
            return match policy.null_behavior {
                NullMatchBehavior::MatchAnything => Ok(Some(MultiplicityMatch::Null)),
                NullMatchBehavior::MatchNothing => Ok(None),
                NullMatchBehavior::Error => Err(MatchError::NullValue {
                    target: target.node,
                    target_name: "multiplicity".into(),
                }),
            };
        };

        let target_shape = graph.multiplicity_shape(target)?;
        let value_shape = graph.multiplicity_shape(value)?;
        if target_shape == value_shape {
            return Ok(Some(MultiplicityMatch::Exact));
        }

        match (target_shape, value_shape) {
            (MultiplicityShape::Parameter(name), _) => {
                match policy.target_param_behavior {
                    ParameterMatchBehavior::MatchAnything => Ok(Some(MultiplicityMatch::NonConcrete)),
                    // Only the same parameter is safe, and that was Exact above.
                    ParameterMatchBehavior::MatchCautiously | ParameterMatchBehavior::MatchNothing => {
                        Ok(None)
                    }
                    ParameterMatchBehavior::Error => Err(MatchError::NonConcreteTarget {
                        node: target.node,
                        parameter: graph.store().resolve(name).to_string(),
                    }),
                }
            }
            (_, MultiplicityShape::Parameter(name)) => match policy.value_param_behavior {
                ParameterMatchBehavior::MatchAnything => Ok(Some(MultiplicityMatch::NonConcrete)),
                ParameterMatchBehavior::MatchCautiously | ParameterMatchBehavior::MatchNothing => {
                    Ok(None)
                }
                ParameterMatchBehavior::Error => Err(MatchError::NonConcreteValue {
                    node: value.node,
                    parameter: graph.store().resolve(name).to_string(),
                }),
            },
            (
                MultiplicityShape::Concrete {
                    lower: target_lower,
                    upper: target_upper,
                },
                MultiplicityShape::Concrete {
                    lower: value_lower,
                    upper: value_upper,
                },
            ) => {
                let ((sub_lower, sub_upper), (super_lower, super_upper)) = if covariant {
                    ((value_lower, value_upper), (target_lower, target_upper))
                } else {
                    ((target_lower, target_upper), (value_lower, value_upper))
                };
                Ok(subsumed(sub_lower, sub_upper, super_lower, super_upper))
            }
        }
    }
}

/// `[sub_lower..sub_upper]` within `[super_lower..super_upper]`.
fn subsumed(
    sub_lower: u64,
    sub_upper: Option<u64>,
    super_lower: u64,
    super_upper: Option<u64>,
) -> Option<MultiplicityMatch> {
    if sub_lower < super_lower {
        return None;
    }
    let upper_gap = match (sub_upper, super_upper) {
        (Some(sub), Some(sup)) if sub <= sup => Gap::Finite(sup - sub),
        (Some(_), Some(_)) => return None,
        (Some(_), None) => Gap::Unbounded,
        (None, None) => Gap::Finite(0),
        (None, Some(_)) => return None,
    };
    Some(MultiplicityMatch::Subsumed {
        upper_gap,
        lower_gap: Gap::Finite(sub_lower - super_lower),
    })
}

#[cfg(test)]
#[path = "../tests/multiplicity_tests.rs"]
mod tests;
