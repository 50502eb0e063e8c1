//! Match policies: how absent and non-concrete types are treated.

use serde::Serialize;

/// Treatment of an absent value-side type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum NullMatchBehavior {
    /// An absent value matches anything, with the weakest rank.
    MatchAnything,
    /// An absent value matches nothing.
    #[default]
    MatchNothing,
    /// An absent value is an invariant violation.
    Error,
}

/// Treatment of an uninstantiated type (or multiplicity) parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterMatchBehavior {
    /// A parameter matches anything, with the non-concrete rank.
    MatchAnything,
    /// A parameter matches only the same parameter, or the extreme type that
    /// is compatible with every instantiation.
    #[default]
    MatchCautiously,
    /// A parameter matches nothing.
    MatchNothing,
    /// A parameter is an invariant violation.
    Error,
}

/// Null and parameter behaviors for one match call.
///
/// Covariance is not part of the policy: it flips during recursion while the
/// policy is carried through unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct MatchPolicy {
    pub null_behavior: NullMatchBehavior,
    pub target_param_behavior: ParameterMatchBehavior,
    pub value_param_behavior: ParameterMatchBehavior,
}

impl MatchPolicy {
    pub const fn new(
        null_behavior: NullMatchBehavior,
        target_param_behavior: ParameterMatchBehavior,
        value_param_behavior: ParameterMatchBehavior,
    ) -> Self {
        Self {
            null_behavior,
            target_param_behavior,
            value_param_behavior,
        }
    }

    /// Policy that accepts every absent or non-concrete input.
    pub const fn permissive() -> Self {
        Self::new(
            NullMatchBehavior::MatchAnything,
            ParameterMatchBehavior::MatchAnything,
            ParameterMatchBehavior::MatchAnything,
        )
    }

    pub const fn with_null_behavior(mut self, behavior: NullMatchBehavior) -> Self {
        self.null_behavior = behavior;
        self
    }

    pub const fn with_target_param_behavior(mut self, behavior: ParameterMatchBehavior) -> Self {
        self.target_param_behavior = behavior;
        self
    }

    pub const fn with_value_param_behavior(mut self, behavior: ParameterMatchBehavior) -> Self {
        self.value_param_behavior = behavior;
        self
    }

    /// The same policy with target and value parameter behaviors exchanged,
    /// for comparisons that swap the two sides.
    pub const fn swapped(self) -> Self {
        Self::new(
            self.null_behavior,
            self.value_param_behavior,
            self.target_param_behavior,
        )
    }
}
